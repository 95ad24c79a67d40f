use serde::Serialize;

use famlink_shared::{family_code, Permissions};
use famlink_store::Member;

use super::{lock, CommandResult};
use crate::directory;
use crate::state::SharedState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: String,
    pub name: String,
    pub role: String,
    pub permissions: Permissions,
    pub is_online: bool,
    pub last_seen: String,
    pub device_id: Option<String>,
    pub joined_at: String,
    pub is_active: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Member> for MemberDto {
    fn from(m: Member) -> Self {
        Self {
            id: m.id.to_string(),
            role: m.role.as_str().to_string(),
            permissions: m.permissions(),
            name: m.name,
            is_online: m.is_online,
            last_seen: m.last_seen.to_rfc3339(),
            device_id: m.device_id,
            joined_at: m.joined_at.to_rfc3339(),
            is_active: m.is_active,
            email: m.email,
            phone: m.phone,
        }
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub family_code: String,
    pub member: MemberDto,
}

/// Create the family stored on this device and sign in as its administrator.
pub fn create_family(state: &SharedState, code: String, name: String) -> CommandResult<SessionDto> {
    let mut guard = lock(state)?;
    let device_id = guard.config.device_id.clone();
    let db = guard.open_database()?;

    let (session, member) = directory::create_family(db, &code, &name, Some(&device_id))?;
    let dto = SessionDto {
        family_code: session.family_code.clone(),
        member: member.into(),
    };
    guard.session = Some(session);
    Ok(dto)
}

pub fn sign_in(state: &SharedState, code: String, name: String) -> CommandResult<SessionDto> {
    let mut guard = lock(state)?;
    let device_id = guard.config.device_id.clone();
    let db = guard.open_database()?;

    let (session, member) = directory::authenticate(db, &code, &name, Some(&device_id))?;
    let dto = SessionDto {
        family_code: session.family_code.clone(),
        member: member.into(),
    };
    guard.session = Some(session);
    Ok(dto)
}

/// Sign out. Does nothing when nobody is signed in.
pub fn sign_out(state: &SharedState) -> CommandResult<()> {
    let mut guard = lock(state)?;
    let Some(session) = guard.session.take() else {
        return Ok(());
    };
    directory::logout(guard.db()?, &session)?;
    Ok(())
}

pub fn current_member(state: &SharedState) -> CommandResult<Option<MemberDto>> {
    let guard = lock(state)?;
    let Some(session) = guard.session.as_ref() else {
        return Ok(None);
    };
    let member = directory::get_member(guard.db()?, session.member_id)?;
    Ok(Some(member.into()))
}

/// Suggest a fresh code for a new family.
pub fn generate_family_code() -> String {
    family_code::generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::temp_state;

    #[test]
    fn test_create_then_sign_in_again() {
        let (_dir, state) = temp_state();
        let created = create_family(&state, " fam123 ".into(), "Alice".into()).unwrap();
        assert_eq!(created.family_code, "FAM123");
        assert_eq!(created.member.role, "admin");
        assert!(created.member.permissions.can_manage_backup);
        assert_eq!(created.member.device_id.as_deref(), Some("test-device"));

        sign_out(&state).unwrap();
        assert_eq!(current_member(&state).unwrap(), None);

        let again = sign_in(&state, "FAM123".into(), "ALICE".into()).unwrap();
        assert_eq!(again.member.id, created.member.id);
        assert!(again.member.is_online);
        assert_eq!(
            current_member(&state).unwrap().map(|m| m.id),
            Some(created.member.id)
        );
    }

    #[test]
    fn test_bad_code_reports_tag() {
        let (_dir, state) = temp_state();
        create_family(&state, "FAM123".into(), "Alice".into()).unwrap();

        let err = sign_in(&state, "FAM999".into(), "Alice".into()).unwrap_err();
        assert_eq!(err.code, "invalid_family_code");

        let err = create_family(&state, "FAM999".into(), "Mallory".into()).unwrap_err();
        assert_eq!(err.code, "family_already_exists");
    }

    #[test]
    fn test_generated_code_is_valid() {
        let code = generate_family_code();
        assert_eq!(family_code::normalize(&code).unwrap(), code);
    }
}
