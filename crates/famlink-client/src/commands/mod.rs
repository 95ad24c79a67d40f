//! Command handlers for the presentation layer.
//!
//! Each sub-module groups related commands by domain. Commands take the
//! [`SharedState`], hold its lock for their whole duration and return
//! serializable DTOs or a [`CommandError`].

pub mod admin;
pub mod auth;
pub mod backup;
pub mod messaging;
pub mod settings;

use std::sync::MutexGuard;

use serde::Serialize;

use famlink_shared::{MemberId, MessageId};

use crate::error::FamilyError;
use crate::state::{AppState, SharedState};

/// Failure returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    /// Stable tag, see [`FamilyError::code`].
    pub code: String,
    pub message: String,
}

impl CommandError {
    fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_input".into(),
            message: message.into(),
        }
    }
}

impl From<FamilyError> for CommandError {
    fn from(e: FamilyError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

pub(crate) fn lock(state: &SharedState) -> CommandResult<MutexGuard<'_, AppState>> {
    state.lock().map_err(|e| CommandError {
        code: "internal".into(),
        message: format!("Lock poisoned: {e}"),
    })
}

pub(crate) fn parse_member_id(s: &str) -> CommandResult<MemberId> {
    MemberId::parse(s.trim()).map_err(|e| CommandError::invalid_input(format!("Invalid member id: {e}")))
}

pub(crate) fn parse_message_id(s: &str) -> CommandResult<MessageId> {
    uuid::Uuid::parse_str(s.trim())
        .map(MessageId)
        .map_err(|e| CommandError::invalid_input(format!("Invalid message id: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ClientConfig;

    /// Shared state over a fresh database in a temporary directory.
    pub(crate) fn temp_state() -> (tempfile::TempDir, SharedState) {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            db_path: dir.path().join("famlink.db"),
            device_id: "test-device".into(),
            backup_dir: dir.path().join("backups"),
            backup_keep: 3,
        };
        let state = AppState::new(config).into_shared();
        (dir, state)
    }

    #[test]
    fn test_error_mapping() {
        let err: CommandError = FamilyError::CannotRemoveSelf.into();
        assert_eq!(err.code, "cannot_remove_self");
        assert_eq!(err.message, "You cannot remove yourself");
    }

    #[test]
    fn test_parse_ids() {
        let id = MemberId::new();
        assert_eq!(parse_member_id(&format!(" {id} ")).unwrap(), id);
        assert_eq!(parse_member_id("bob").unwrap_err().code, "invalid_input");
        assert!(parse_message_id("").is_err());
    }
}
