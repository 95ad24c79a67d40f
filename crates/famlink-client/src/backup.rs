//! Sealed backups of the family database.
//!
//! A backup is the JSON [`BackupPayload`] encrypted with XChaCha20-Poly1305
//! under a key derived from the family code, then base64 armored. Files are
//! named `famlink_backup_<timestamp>.fbk` so they sort chronologically.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use famlink_shared::crypto;
use famlink_shared::Capability;
use famlink_store::{BackupPayload, Database, ImportStats};

use crate::directory::{load_actor, require};
use crate::error::{FamilyError, Result};
use crate::session::Session;

const FILE_PREFIX: &str = "famlink_backup_";
const FILE_EXTENSION: &str = "fbk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFileInfo {
    pub file_name: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Export the whole family database as sealed text.
pub fn export_sealed(db: &Database, session: &Session) -> Result<String> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::ManageBackup)?;

    let payload = db.export_backup()?;
    let json = serde_json::to_vec(&payload)
        .map_err(|e| FamilyError::Backup(format!("serialization failed: {e}")))?;

    let key = crypto::derive_backup_key(&session.family_code);
    let sealed = crypto::seal_to_text(&key, &json)?;

    info!(
        members = payload.members.len(),
        messages = payload.messages.len(),
        admin_actions = payload.admin_actions.len(),
        "backup exported"
    );
    Ok(sealed)
}

/// Open sealed text produced by [`export_sealed`] for the same family and
/// merge it into the database. Rows already present are kept as they are.
pub fn import_sealed(db: &Database, session: &Session, sealed: &str) -> Result<ImportStats> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::ManageBackup)?;

    let key = crypto::derive_backup_key(&session.family_code);
    let json = crypto::open_text(&key, sealed)?;
    let payload: BackupPayload = serde_json::from_slice(&json)
        .map_err(|e| FamilyError::Backup(format!("invalid backup: {e}")))?;

    if let Some(family) = &payload.family {
        if family.code != session.family_code {
            return Err(FamilyError::InvalidFamilyCode);
        }
    }

    Ok(db.import_backup(&payload)?)
}

/// Write a sealed backup into `dir` and keep only the `keep` newest files.
pub fn save_backup_file(
    db: &Database,
    session: &Session,
    dir: &Path,
    keep: usize,
) -> Result<PathBuf> {
    let sealed = export_sealed(db, session)?;

    std::fs::create_dir_all(dir)
        .map_err(|e| FamilyError::Backup(format!("failed to create backup dir: {e}")))?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("{FILE_PREFIX}{timestamp}.{FILE_EXTENSION}"));
    std::fs::write(&path, sealed.as_bytes())
        .map_err(|e| FamilyError::Backup(format!("failed to write backup: {e}")))?;

    cleanup_old_backups(dir, keep);

    info!(path = %path.display(), "backup saved");
    Ok(path)
}

pub fn restore_backup_file(db: &Database, session: &Session, path: &Path) -> Result<ImportStats> {
    let sealed = std::fs::read_to_string(path)
        .map_err(|e| FamilyError::Backup(format!("failed to read backup: {e}")))?;
    let stats = import_sealed(db, session, &sealed)?;
    info!(path = %path.display(), "backup restored");
    Ok(stats)
}

/// Backup files in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupFileInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| FamilyError::Backup(format!("failed to read backup dir: {e}")))?;

    let mut backups = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_backup_file(&path) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        backups.push(BackupFileInfo {
            file_name: entry.file_name().to_string_lossy().to_string(),
            file_path: path.to_string_lossy().to_string(),
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    backups.sort_by(|a, b| b.file_name.cmp(&a.file_name));
    Ok(backups)
}

fn is_backup_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX))
}

fn cleanup_old_backups(dir: &Path, keep: usize) {
    let Ok(backups) = list_backups(dir) else {
        return;
    };

    for old in backups.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(&old.file_path) {
            warn!(path = %old.file_path, error = %e, "failed to remove old backup");
        }
    }
}
