//! Append-only audit log of admin actions, capped at
//! [`ADMIN_LOG_CAPACITY`] entries.

use famlink_shared::constants::ADMIN_LOG_CAPACITY;
use famlink_shared::{AdminActionKind, MemberId};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::AdminAction;
use crate::sql::{parse_tag, parse_timestamp, parse_uuid};

const ACTION_COLUMNS: &str = "id, admin_id, target_member_id, action, details, timestamp";

// Entries are ordered by when they happened, not by when they reached this
// database: a restored backup can bring in rows older than local ones. `seq`
// breaks ties between equal timestamps.
const NEWEST_FIRST: &str = "ORDER BY timestamp DESC, seq DESC";
const OLDEST_FIRST: &str = "ORDER BY timestamp ASC, seq ASC";

pub(crate) const EVICT_SQL: &str = "DELETE FROM admin_actions
     WHERE seq NOT IN (SELECT seq FROM admin_actions
                       ORDER BY timestamp DESC, seq DESC LIMIT ?1)";

impl Database {
    /// Append one action, then evict everything older than the newest
    /// [`ADMIN_LOG_CAPACITY`] entries. Both steps run in one transaction.
    pub fn append_admin_action(&self, action: &AdminAction) -> Result<()> {
        self.append_admin_action_capped(action, ADMIN_LOG_CAPACITY)
    }

    pub(crate) fn append_admin_action_capped(
        &self,
        action: &AdminAction,
        capacity: usize,
    ) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO admin_actions (id, admin_id, target_member_id, action, details, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                action.id.to_string(),
                action.admin_id.to_string(),
                action.target_member_id.map(|id| id.to_string()),
                action.action.as_str(),
                action.details,
                action.timestamp.to_rfc3339(),
            ],
        )
        .map_err(StoreError::from_insert)?;

        let evicted = tx.execute(EVICT_SQL, params![capacity as i64])?;

        tx.commit()?;

        if evicted > 0 {
            tracing::debug!(evicted, "admin log truncated");
        }
        Ok(())
    }

    /// Most recent actions first, at most `limit`.
    pub fn recent_admin_actions(&self, limit: usize) -> Result<Vec<AdminAction>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM admin_actions {NEWEST_FIRST} LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], row_to_action)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// The whole log, oldest first.
    pub fn list_admin_actions(&self) -> Result<Vec<AdminAction>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM admin_actions {OLDEST_FIRST}"
        ))?;
        let rows = stmt.query_map([], row_to_action)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn count_admin_actions(&self) -> Result<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM admin_actions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

pub(crate) fn row_to_action(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdminAction> {
    let id_str: String = row.get(0)?;
    let admin_str: String = row.get(1)?;
    let target_str: Option<String> = row.get(2)?;
    let action_str: String = row.get(3)?;
    let ts_str: String = row.get(5)?;

    let target_member_id = target_str
        .as_deref()
        .map(|s| parse_uuid(2, s).map(MemberId))
        .transpose()?;

    Ok(AdminAction {
        id: parse_uuid(0, &id_str)?,
        admin_id: MemberId(parse_uuid(1, &admin_str)?),
        target_member_id,
        action: parse_tag(3, &action_str, AdminActionKind::parse)?,
        details: row.get(4)?,
        timestamp: parse_timestamp(5, &ts_str)?,
    })
}
