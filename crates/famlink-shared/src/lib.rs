//! # famlink-shared
//!
//! Types shared by every famlink crate: the role-permission table,
//! identifiers and tag enums, family code helpers and the symmetric crypto
//! used to seal backups.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod family_code;
pub mod roles;
pub mod types;

pub use roles::{can_manage_members, has_permission, permissions_for, Capability, Permissions, Role};
pub use types::{AdminActionKind, MemberId, MessageId, MessageKind, MessageStatus};
