//! Admin action log as seen from the member operations.

use famlink_shared::can_manage_members;
use famlink_store::{AdminAction, Database};
use tracing::{debug, warn};

use crate::directory::load_actor;
use crate::error::{FamilyError, Result};
use crate::session::Session;

/// Append `action` to the log. A failed write never undoes the mutation it
/// describes: it is logged and dropped.
pub(crate) fn record(db: &Database, action: AdminAction) {
    match db.append_admin_action(&action) {
        Ok(()) => debug!(kind = %action.action.as_str(), admin = %action.admin_id, "admin action recorded"),
        Err(e) => warn!(
            error = %e,
            kind = %action.action.as_str(),
            admin = %action.admin_id,
            "failed to record admin action"
        ),
    }
}

/// Most recent log entries, newest first. Only members who can manage other
/// members may read the log.
pub fn recent_actions(db: &Database, session: &Session, limit: usize) -> Result<Vec<AdminAction>> {
    let actor = load_actor(db, session)?;
    if !can_manage_members(Some(actor.role)) {
        return Err(FamilyError::InsufficientPermissions);
    }
    Ok(db.recent_admin_actions(limit)?)
}
