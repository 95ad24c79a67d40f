//! Device-local app preferences, stored as one JSON row.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::AppPreferences;

impl Database {
    /// Stored preferences, or defaults when none were saved yet.
    pub fn get_app_preferences(&self) -> Result<AppPreferences> {
        let result: rusqlite::Result<String> =
            self.conn()
                .query_row("SELECT json FROM app_preferences WHERE id = 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(AppPreferences::default()),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn set_app_preferences(&self, prefs: &AppPreferences) -> Result<()> {
        let json = serde_json::to_string(prefs)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO app_preferences (id, json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }
}
