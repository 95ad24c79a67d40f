//! Role enumeration and the static role-permission table.
//!
//! Permissions are never stored: every caller derives them from the member's
//! role through [`permissions_for`], so a member's capabilities cannot drift
//! away from their role.

use serde::{Deserialize, Serialize};

/// The role a member holds inside a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "admin", alias = "administrator")]
    Administrator,
    Parent,
    Child,
    Grandparent,
    Other,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::Parent,
        Role::Child,
        Role::Grandparent,
        Role::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "admin",
            Role::Parent => "parent",
            Role::Child => "child",
            Role::Grandparent => "grandparent",
            Role::Other => "other",
        }
    }

    /// Parse a stored or user-supplied role tag. Returns `None` for anything
    /// outside the enumeration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Some(Role::Administrator),
            "parent" => Some(Role::Parent),
            "child" => Some(Role::Child),
            "grandparent" => Some(Role::Grandparent),
            "other" => Some(Role::Other),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the eight independent capabilities a role can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    AddMembers,
    RemoveMembers,
    EditMembers,
    ManageSettings,
    ModerateContent,
    ViewAnalytics,
    ManageBackup,
    InviteGuests,
}

/// Capability set derived from a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_add_members: bool,
    pub can_remove_members: bool,
    pub can_edit_members: bool,
    pub can_manage_settings: bool,
    pub can_moderate_content: bool,
    pub can_view_analytics: bool,
    pub can_manage_backup: bool,
    pub can_invite_guests: bool,
}

impl Permissions {
    /// The most restrictive set: nothing granted.
    pub const NONE: Permissions = Permissions {
        can_add_members: false,
        can_remove_members: false,
        can_edit_members: false,
        can_manage_settings: false,
        can_moderate_content: false,
        can_view_analytics: false,
        can_manage_backup: false,
        can_invite_guests: false,
    };

    pub const ALL: Permissions = Permissions {
        can_add_members: true,
        can_remove_members: true,
        can_edit_members: true,
        can_manage_settings: true,
        can_moderate_content: true,
        can_view_analytics: true,
        can_manage_backup: true,
        can_invite_guests: true,
    };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::AddMembers => self.can_add_members,
            Capability::RemoveMembers => self.can_remove_members,
            Capability::EditMembers => self.can_edit_members,
            Capability::ManageSettings => self.can_manage_settings,
            Capability::ModerateContent => self.can_moderate_content,
            Capability::ViewAnalytics => self.can_view_analytics,
            Capability::ManageBackup => self.can_manage_backup,
            Capability::InviteGuests => self.can_invite_guests,
        }
    }
}

/// Canonical capability set for `role`. A missing role gets [`Permissions::NONE`].
pub fn permissions_for(role: Option<Role>) -> Permissions {
    match role {
        Some(Role::Administrator) => Permissions::ALL,
        Some(Role::Parent) => Permissions {
            can_add_members: true,
            can_edit_members: true,
            can_moderate_content: true,
            can_view_analytics: true,
            can_invite_guests: true,
            ..Permissions::NONE
        },
        Some(Role::Grandparent) => Permissions {
            can_view_analytics: true,
            ..Permissions::NONE
        },
        Some(Role::Child) | Some(Role::Other) | None => Permissions::NONE,
    }
}

pub fn has_permission(role: Option<Role>, capability: Capability) -> bool {
    permissions_for(role).allows(capability)
}

/// True when the role can add, remove or edit members.
pub fn can_manage_members(role: Option<Role>) -> bool {
    let p = permissions_for(role);
    p.can_add_members || p.can_remove_members || p.can_edit_members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(p: Permissions) -> [bool; 8] {
        [
            p.can_add_members,
            p.can_remove_members,
            p.can_edit_members,
            p.can_manage_settings,
            p.can_moderate_content,
            p.can_view_analytics,
            p.can_manage_backup,
            p.can_invite_guests,
        ]
    }

    #[test]
    fn test_permission_table() {
        assert_eq!(row(permissions_for(Some(Role::Administrator))), [true; 8]);
        assert_eq!(
            row(permissions_for(Some(Role::Parent))),
            [true, false, true, false, true, true, false, true]
        );
        assert_eq!(
            row(permissions_for(Some(Role::Grandparent))),
            [false, false, false, false, false, true, false, false]
        );
        assert_eq!(row(permissions_for(Some(Role::Child))), [false; 8]);
        assert_eq!(row(permissions_for(Some(Role::Other))), [false; 8]);
    }

    #[test]
    fn test_unknown_role_gets_nothing() {
        let role = Role::parse("superuser");
        assert!(role.is_none());
        assert_eq!(permissions_for(role), Permissions::NONE);
        assert!(!can_manage_members(role));
    }

    #[test]
    fn test_has_permission_matches_table() {
        assert!(has_permission(Some(Role::Parent), Capability::AddMembers));
        assert!(!has_permission(Some(Role::Parent), Capability::RemoveMembers));
        assert!(has_permission(Some(Role::Grandparent), Capability::ViewAnalytics));
        assert!(!has_permission(Some(Role::Child), Capability::ViewAnalytics));
    }

    #[test]
    fn test_can_manage_members() {
        assert!(can_manage_members(Some(Role::Administrator)));
        assert!(can_manage_members(Some(Role::Parent)));
        assert!(!can_manage_members(Some(Role::Grandparent)));
        assert!(!can_manage_members(Some(Role::Child)));
        assert!(!can_manage_members(Some(Role::Other)));
    }

    #[test]
    fn test_role_tags() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse(" Administrator "), Some(Role::Administrator));
        let json = serde_json::to_string(&Role::Administrator).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
