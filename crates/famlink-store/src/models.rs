//! Domain model structs persisted in the local database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed to
//! the presentation layer and written into backups unchanged.

use chrono::{DateTime, Utc};
use famlink_shared::{
    permissions_for, AdminActionKind, MemberId, MessageId, MessageKind, MessageStatus,
    Permissions, Role,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

/// A participant in the family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub role: Role,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    /// Device the member last signed in from.
    pub device_id: Option<String>,
    pub joined_at: DateTime<Utc>,
    /// False for members added by an admin who have not signed in yet, and
    /// for deactivated members.
    pub is_active: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Member {
    /// Build a new member record with a fresh id.
    pub fn new(name: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: MemberId::new(),
            name: name.into(),
            role,
            is_online: false,
            last_seen: now,
            device_id: None,
            joined_at: now,
            is_active: false,
            email: None,
            phone: None,
        }
    }

    /// Capabilities granted by the member's current role.
    pub fn permissions(&self) -> Permissions {
        permissions_for(Some(self.role))
    }
}

/// Partial update applied by `edit_member`. `None` leaves a field untouched;
/// for the optional contact fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl MemberUpdate {
    /// Apply to `member` and return the names of the fields that actually
    /// changed.
    pub fn apply_to(&self, member: &mut Member) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            if *name != member.name {
                member.name = name.clone();
                changed.push("name");
            }
        }
        if let Some(role) = self.role {
            if role != member.role {
                member.role = role;
                changed.push("role");
            }
        }
        if let Some(email) = &self.email {
            if *email != member.email {
                member.email = email.clone();
                changed.push("email");
            }
        }
        if let Some(phone) = &self.phone {
            if *phone != member.phone {
                member.phone = phone.clone();
                changed.push("phone");
            }
        }
        if let Some(active) = self.is_active {
            if active != member.is_active {
                member.is_active = active;
                changed.push("is_active");
            }
        }

        changed
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A one-to-one message. Immutable after creation apart from its status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: MemberId,
    pub receiver_id: MemberId,
    pub content: String,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    pub is_encrypted: bool,
    /// Kind-specific details (file name and size, voice duration,
    /// coordinates...).
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    pub fn involves(&self, a: MemberId, b: MemberId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// The other side of the conversation, seen from `member`.
    pub fn counterpart(&self, member: MemberId) -> MemberId {
        if self.sender_id == member {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

// ---------------------------------------------------------------------------
// Admin action
// ---------------------------------------------------------------------------

/// Audit record of a privileged mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: MemberId,
    pub target_member_id: Option<MemberId>,
    pub action: AdminActionKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AdminAction {
    pub fn new(
        admin_id: MemberId,
        target_member_id: Option<MemberId>,
        action: AdminActionKind,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            admin_id,
            target_member_id,
            action,
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// The single family partition held on this device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyRecord {
    /// Normalized family code.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub settings: FamilySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilySettings {
    pub family_name: Option<String>,
    pub allow_guest_invites: bool,
    pub auto_backup_enabled: bool,
}

// ---------------------------------------------------------------------------
// App preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppPreferences {
    pub theme: String,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub language: String,
    pub font_scale: f32,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            theme: "light".into(),
            notifications_enabled: true,
            sound_enabled: true,
            language: "en".into(),
            font_scale: 1.0,
        }
    }
}
