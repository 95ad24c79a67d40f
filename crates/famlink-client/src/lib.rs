//! # famlink-client
//!
//! Family operations on top of `famlink-store`: sign-in, member
//! administration with role checks, the admin log, messaging and sealed
//! backups. [`commands`] exposes them to a presentation layer as
//! serializable DTOs over a shared [`state::AppState`].

pub mod audit;
pub mod backup;
pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod messaging;
pub mod session;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ClientConfig;
use crate::state::{AppState, SharedState};

pub use error::{FamilyError, Result};
pub use session::Session;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("famlink_client=debug,famlink_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Set up logging, read the configuration from the environment and open the
/// database.
pub fn start() -> Result<SharedState> {
    init_tracing();

    let config = ClientConfig::from_env();
    tracing::info!(device = %config.device_id, "starting famlink client");

    let mut state = AppState::new(config);
    state.open_database()?;
    Ok(state.into_shared())
}
