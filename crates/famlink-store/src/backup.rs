use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use famlink_shared::constants::ADMIN_LOG_CAPACITY;
use famlink_shared::MemberId;

use crate::admin_log::EVICT_SQL;
use crate::database::Database;
use crate::error::Result;
use crate::models::{AdminAction, FamilyRecord, Member, Message};
use crate::sql::parse_uuid;

/// Full backup payload. Serialized to JSON, then sealed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPayload {
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// App version that produced the backup
    pub version: String,
    pub family: Option<FamilyRecord>,
    pub members: Vec<Member>,
    pub messages: Vec<Message>,
    pub admin_actions: Vec<AdminAction>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub family_imported: bool,
    pub members_imported: usize,
    /// Backup members matched by name to a local member with another id.
    pub members_merged: usize,
    pub messages_imported: usize,
    pub admin_actions_imported: usize,
}

impl Database {
    /// Snapshot the family record, members, messages and the admin log.
    pub fn export_backup(&self) -> Result<BackupPayload> {
        Ok(BackupPayload {
            created_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            family: self.get_family()?,
            members: self.list_members()?,
            messages: self.list_all_messages()?,
            admin_actions: self.list_admin_actions()?,
        })
    }

    /// Merge a backup into this database. Existing rows win: anything whose
    /// id is already present is skipped. A backup member whose name belongs
    /// to a local member with a different id is merged into that member, and
    /// their messages and admin actions are rewritten to the local id. The
    /// whole import is one transaction.
    pub fn import_backup(&self, payload: &BackupPayload) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let tx = self.conn().unchecked_transaction()?;

        if let Some(family) = &payload.family {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO family (id, code, created_at, settings_json)
                 VALUES (1, ?1, ?2, ?3)",
                params![
                    family.code,
                    family.created_at.to_rfc3339(),
                    serde_json::to_string(&family.settings)?,
                ],
            )?;
            stats.family_imported = inserted == 1;
        }

        let mut remap: HashMap<MemberId, MemberId> = HashMap::new();
        for m in &payload.members {
            let local: Option<String> = tx
                .query_row(
                    "SELECT id FROM members
                     WHERE name = ?1 COLLATE NOCASE
                       AND NOT EXISTS (SELECT 1 FROM members WHERE id = ?2)",
                    params![m.name, m.id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(local) = local {
                let local = MemberId(parse_uuid(0, &local)?);
                tracing::debug!(
                    backup = %m.id,
                    local = %local,
                    name = %m.name,
                    "merging member by name"
                );
                remap.insert(m.id, local);
                stats.members_merged += 1;
                continue;
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO members (id, name, role, is_online, last_seen, device_id,
                                                joined_at, is_active, email, phone)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    m.id.to_string(),
                    m.name,
                    m.role.as_str(),
                    m.last_seen.to_rfc3339(),
                    m.device_id,
                    m.joined_at.to_rfc3339(),
                    m.is_active,
                    m.email,
                    m.phone,
                ],
            )?;
            stats.members_imported += inserted;
        }
        let local_id = |id: MemberId| remap.get(&id).copied().unwrap_or(id);

        for msg in &payload.messages {
            let metadata = msg
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO messages (id, sender_id, receiver_id, content, kind,
                                                 timestamp, status, is_encrypted, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    msg.id.to_string(),
                    local_id(msg.sender_id).to_string(),
                    local_id(msg.receiver_id).to_string(),
                    msg.content,
                    msg.kind.as_str(),
                    msg.timestamp.to_rfc3339(),
                    msg.status.as_str(),
                    msg.is_encrypted,
                    metadata,
                ],
            )?;
            stats.messages_imported += inserted;
        }

        for action in &payload.admin_actions {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO admin_actions (id, admin_id, target_member_id, action,
                                                      details, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    action.id.to_string(),
                    local_id(action.admin_id).to_string(),
                    action.target_member_id.map(|id| local_id(id).to_string()),
                    action.action.as_str(),
                    action.details,
                    action.timestamp.to_rfc3339(),
                ],
            )?;
            stats.admin_actions_imported += inserted;
        }

        tx.execute(EVICT_SQL, params![ADMIN_LOG_CAPACITY as i64])?;
        tx.commit()?;

        tracing::info!(
            family = stats.family_imported,
            members = stats.members_imported,
            merged = stats.members_merged,
            messages = stats.messages_imported,
            admin_actions = stats.admin_actions_imported,
            "backup imported"
        );

        Ok(stats)
    }
}
