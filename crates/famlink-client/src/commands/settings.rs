use tracing::info;

use famlink_store::{AppPreferences, FamilySettings};

use super::{lock, CommandResult};
use crate::directory;
use crate::error::FamilyError;
use crate::state::SharedState;

pub fn get_family_settings(state: &SharedState) -> CommandResult<FamilySettings> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(directory::family_settings(db, session)?)
}

pub fn update_family_settings(
    state: &SharedState,
    settings: FamilySettings,
) -> CommandResult<FamilySettings> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(directory::update_family_settings(db, session, settings)?)
}

/// Device preferences. Available before anyone signs in; defaults until set.
pub fn get_preferences(state: &SharedState) -> CommandResult<AppPreferences> {
    let mut guard = lock(state)?;
    let db = guard.open_database()?;
    Ok(db.get_app_preferences().map_err(FamilyError::from)?)
}

pub fn update_preferences(state: &SharedState, prefs: AppPreferences) -> CommandResult<()> {
    let mut guard = lock(state)?;
    let db = guard.open_database()?;
    db.set_app_preferences(&prefs).map_err(FamilyError::from)?;
    info!(theme = %prefs.theme, language = %prefs.language, "preferences updated");
    Ok(())
}
