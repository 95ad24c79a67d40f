use std::path::Path;

use famlink_store::ImportStats;

use super::{lock, CommandResult};
use crate::backup::{self, BackupFileInfo};
use crate::state::SharedState;

/// Export the whole family database as sealed text.
pub fn export_backup(state: &SharedState) -> CommandResult<String> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(backup::export_sealed(db, session)?)
}

/// Merge sealed backup text into the local database.
pub fn import_backup(state: &SharedState, sealed: String) -> CommandResult<ImportStats> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(backup::import_sealed(db, session, &sealed)?)
}

/// Save a backup into the configured backup directory. Returns its path.
pub fn auto_backup(state: &SharedState) -> CommandResult<String> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let path = backup::save_backup_file(
        db,
        session,
        &guard.config.backup_dir,
        guard.config.backup_keep,
    )?;
    Ok(path.to_string_lossy().to_string())
}

pub fn list_backups(state: &SharedState) -> CommandResult<Vec<BackupFileInfo>> {
    let guard = lock(state)?;
    Ok(backup::list_backups(&guard.config.backup_dir)?)
}

pub fn restore_backup(state: &SharedState, file_path: String) -> CommandResult<ImportStats> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(backup::restore_backup_file(db, session, Path::new(&file_path))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::create_family;
    use crate::commands::tests::temp_state;

    #[test]
    fn test_auto_backup_rotates() {
        let (_dir, state) = temp_state();
        create_family(&state, "FAM123".into(), "Alice".into()).unwrap();

        let mut saved = Vec::new();
        for _ in 0..5 {
            saved.push(auto_backup(&state).unwrap());
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let listed = list_backups(&state).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].file_path, saved[4]);

        let stats = restore_backup(&state, saved[4].clone()).unwrap();
        assert_eq!(stats, ImportStats::default());
    }

    #[test]
    fn test_export_import_same_device() {
        let (_dir, state) = temp_state();
        create_family(&state, "FAM123".into(), "Alice".into()).unwrap();

        let sealed = export_backup(&state).unwrap();
        let stats = import_backup(&state, sealed).unwrap();
        assert_eq!(stats.members_imported, 0);

        let err = import_backup(&state, "garbage".into()).unwrap_err();
        assert_eq!(err.code, "backup_failed");
    }
}
