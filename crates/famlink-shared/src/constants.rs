/// Number of admin actions kept in the audit log; older entries are evicted.
pub const ADMIN_LOG_CAPACITY: usize = 100;

/// Family code length bounds (after normalization)
pub const FAMILY_CODE_MIN_LEN: usize = 4;
pub const FAMILY_CODE_MAX_LEN: usize = 12;

/// Length of codes produced by `family_code::generate`
pub const GENERATED_FAMILY_CODE_LEN: usize = 6;

/// Maximum member display name length in characters
pub const MAX_MEMBER_NAME_LEN: usize = 64;

/// Maximum text message length in bytes (64 KiB)
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Symmetric key size in bytes (for XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Key derivation contexts (BLAKE3)
pub const KDF_CONTEXT_BACKUP_KEY: &str = "famlink backup key v1";
