use famlink_shared::error::{CryptoError, FamilyCodeError};
use famlink_store::StoreError;
use thiserror::Error;

/// Failures surfaced to the caller of a family operation.
#[derive(Error, Debug)]
pub enum FamilyError {
    #[error("Invalid family code")]
    InvalidFamilyCode,

    #[error("A family already exists on this device")]
    FamilyAlreadyExists,

    #[error("You do not have permission to do that")]
    InsufficientPermissions,

    #[error("Member not found")]
    MemberNotFound,

    #[error("A member with that name already exists")]
    DuplicateMember,

    #[error("Only the administrator can change the administrator's details")]
    ForbiddenRoleChange,

    #[error("The administrator cannot be removed")]
    CannotRemoveAdmin,

    #[error("You cannot remove yourself")]
    CannotRemoveSelf,

    #[error("The administrator's role cannot be changed")]
    CannotChangeAdminRole,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("Message not found")]
    MessageNotFound,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Backup error: {0}")]
    Backup(String),
}

impl FamilyError {
    /// Stable machine-readable tag for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFamilyCode => "invalid_family_code",
            Self::FamilyAlreadyExists => "family_already_exists",
            Self::InsufficientPermissions => "insufficient_permissions",
            Self::MemberNotFound => "member_not_found",
            Self::DuplicateMember => "duplicate_member",
            Self::ForbiddenRoleChange => "forbidden_role_change",
            Self::CannotRemoveAdmin => "cannot_remove_admin",
            Self::CannotRemoveSelf => "cannot_remove_self",
            Self::CannotChangeAdminRole => "cannot_change_admin_role",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::MessageNotFound => "message_not_found",
            Self::NotSignedIn => "not_signed_in",
            Self::Validation(_) => "invalid_input",
            Self::Backup(_) => "backup_failed",
        }
    }
}

impl From<CryptoError> for FamilyError {
    fn from(e: CryptoError) -> Self {
        FamilyError::Backup(e.to_string())
    }
}

impl From<FamilyCodeError> for FamilyError {
    fn from(_: FamilyCodeError) -> Self {
        FamilyError::InvalidFamilyCode
    }
}

pub type Result<T> = std::result::Result<T, FamilyError>;
