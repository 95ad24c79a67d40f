//! Application state shared by every command.
//!
//! [`AppState`] lives behind `Arc<Mutex<_>>`; each command holds the lock for
//! its whole duration, so reads and writes of two commands never interleave.

use std::sync::{Arc, Mutex};

use famlink_store::Database;

use crate::config::ClientConfig;
use crate::error::{FamilyError, Result};
use crate::session::Session;

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    pub config: ClientConfig,

    /// `None` until [`AppState::open_database`] succeeds.
    pub database: Option<Database>,

    /// The signed-in member, if any.
    pub session: Option<Session>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            database: None,
            session: None,
        }
    }

    /// Open the configured database if it is not open yet.
    pub fn open_database(&mut self) -> Result<&Database> {
        if self.database.is_none() {
            tracing::info!(path = %self.config.db_path.display(), "opening database");
            self.database = Some(Database::open_at(&self.config.db_path)?);
        }
        self.db()
    }

    pub fn db(&self) -> Result<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| FamilyError::Validation("database not opened".into()))
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(FamilyError::NotSignedIn)
    }

    /// Database and session together, for commands acting as the signed-in
    /// member.
    pub fn signed_in(&self) -> Result<(&Database, &Session)> {
        Ok((self.db()?, self.session()?))
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}
