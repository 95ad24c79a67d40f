//! # famlink-store
//!
//! Local storage for famlink, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Each entity lives in its own row keyed by identifier, and every
//! write is a single statement or transaction, so concurrent callers never
//! overwrite a whole collection.

pub mod admin_log;
pub mod backup;
pub mod database;
pub mod family;
pub mod members;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod preferences;

mod error;
mod sql;

pub use backup::{BackupPayload, ImportStats};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
