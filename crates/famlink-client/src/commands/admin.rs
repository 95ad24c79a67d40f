use serde::{Deserialize, Serialize};

use famlink_shared::Role;
use famlink_store::{AdminAction, MemberUpdate};

use super::auth::MemberDto;
use super::{lock, parse_member_id, CommandError, CommandResult};
use crate::audit;
use crate::directory::{self, NewMember};
use crate::state::SharedState;

const DEFAULT_LOG_PAGE: usize = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionDto {
    pub id: String,
    pub admin_id: String,
    pub target_member_id: Option<String>,
    pub action: String,
    pub details: String,
    pub timestamp: String,
}

impl From<AdminAction> for AdminActionDto {
    fn from(a: AdminAction) -> Self {
        Self {
            id: a.id.to_string(),
            admin_id: a.admin_id.to_string(),
            target_member_id: a.target_member_id.map(|id| id.to_string()),
            action: a.action.as_str().to_string(),
            details: a.details,
            timestamp: a.timestamp.to_rfc3339(),
        }
    }
}

pub fn list_members(state: &SharedState) -> CommandResult<Vec<MemberDto>> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let members = directory::list_members(db, session)?;
    Ok(members.into_iter().map(MemberDto::from).collect())
}

pub fn add_member(state: &SharedState, request: AddMemberRequest) -> CommandResult<MemberDto> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let member = directory::add_member(
        db,
        session,
        NewMember {
            name: request.name,
            role: request.role,
            email: request.email,
            phone: request.phone,
        },
    )?;
    Ok(member.into())
}

pub fn edit_member(
    state: &SharedState,
    member_id: String,
    update: MemberUpdate,
) -> CommandResult<MemberDto> {
    let member_id = parse_member_id(&member_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(directory::edit_member(db, session, member_id, update)?.into())
}

pub fn remove_member(state: &SharedState, member_id: String) -> CommandResult<()> {
    let member_id = parse_member_id(&member_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    directory::remove_member(db, session, member_id)?;
    Ok(())
}

pub fn change_role(state: &SharedState, member_id: String, role: String) -> CommandResult<MemberDto> {
    let member_id = parse_member_id(&member_id)?;
    let role = Role::parse(&role).ok_or_else(|| CommandError {
        code: "invalid_input".into(),
        message: format!("Unknown role: {role}"),
    })?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(directory::change_role(db, session, member_id, role)?.into())
}

pub fn deactivate_member(state: &SharedState, member_id: String) -> CommandResult<MemberDto> {
    let member_id = parse_member_id(&member_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(directory::deactivate_member(db, session, member_id)?.into())
}

/// Newest admin log entries first.
pub fn recent_admin_actions(
    state: &SharedState,
    limit: Option<usize>,
) -> CommandResult<Vec<AdminActionDto>> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let actions = audit::recent_actions(db, session, limit.unwrap_or(DEFAULT_LOG_PAGE))?;
    Ok(actions.into_iter().map(AdminActionDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::{create_family, sign_in, sign_out};
    use crate::commands::tests::temp_state;

    fn request(name: &str, role: Role) -> AddMemberRequest {
        AddMemberRequest {
            name: name.into(),
            role,
            email: None,
            phone: None,
        }
    }

    #[test]
    fn test_requires_sign_in() {
        let (_dir, state) = temp_state();
        create_family(&state, "FAM123".into(), "Alice".into()).unwrap();
        sign_out(&state).unwrap();

        let err = list_members(&state).unwrap_err();
        assert_eq!(err.code, "not_signed_in");
    }

    #[test]
    fn test_admin_flow() {
        let (_dir, state) = temp_state();
        let alice = create_family(&state, "FAM123".into(), "Alice".into()).unwrap();

        let bob = add_member(&state, request("Bob", Role::Child)).unwrap();
        assert_eq!(bob.role, "child");
        assert!(!bob.is_active);

        let bob = change_role(&state, bob.id, "Parent".into()).unwrap();
        assert_eq!(bob.role, "parent");
        assert!(bob.permissions.can_add_members);

        let bob = edit_member(
            &state,
            bob.id,
            MemberUpdate {
                email: Some(Some("bob@example.com".into())),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(bob.email.as_deref(), Some("bob@example.com"));

        let err = remove_member(&state, alice.member.id.clone()).unwrap_err();
        assert_eq!(err.code, "cannot_remove_self");

        let err = change_role(&state, bob.id.clone(), "overlord".into()).unwrap_err();
        assert_eq!(err.code, "invalid_input");

        remove_member(&state, bob.id).unwrap();
        assert_eq!(list_members(&state).unwrap().len(), 1);

        let log: Vec<String> = recent_admin_actions(&state, None)
            .unwrap()
            .into_iter()
            .map(|a| a.action)
            .collect();
        assert_eq!(
            log,
            vec!["remove_member", "edit_member", "change_role", "add_member"]
        );
    }

    #[test]
    fn test_child_cannot_administer() {
        let (_dir, state) = temp_state();
        let alice = create_family(&state, "FAM123".into(), "Alice".into()).unwrap();
        add_member(&state, request("Bob", Role::Child)).unwrap();

        sign_in(&state, "FAM123".into(), "Bob".into()).unwrap();
        let err = remove_member(&state, alice.member.id).unwrap_err();
        assert_eq!(err.code, "insufficient_permissions");
        let err = recent_admin_actions(&state, Some(5)).unwrap_err();
        assert_eq!(err.code, "insufficient_permissions");
    }
}
