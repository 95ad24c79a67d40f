//! Member directory: family creation, sign-in and the admin panel's member
//! management operations.
//!
//! Every admin operation re-reads the acting member from the store, checks
//! the capability its role grants, then checks the target. Successful
//! mutations append one entry to the admin log through [`audit::record`].

use chrono::Utc;
use tracing::{info, warn};

use famlink_shared::constants::MAX_MEMBER_NAME_LEN;
use famlink_shared::{family_code, AdminActionKind, Capability, MemberId, Role};
use famlink_store::{AdminAction, Database, FamilyRecord, FamilySettings, Member, MemberUpdate, StoreError};

use crate::audit;
use crate::error::{FamilyError, Result};
use crate::session::Session;

/// Fields supplied by the admin panel when adding a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub role: Role,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            email: None,
            phone: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

/// Start a new family on this device with `name` as its administrator.
pub fn create_family(
    db: &Database,
    code: &str,
    name: &str,
    device_id: Option<&str>,
) -> Result<(Session, Member)> {
    let code = family_code::normalize(code)?;

    if db.get_family()?.is_some() {
        return Err(FamilyError::FamilyAlreadyExists);
    }

    let name = validate_name(name)?;
    let now = Utc::now();

    let mut admin = Member::new(name, Role::Administrator, now);
    admin.is_online = true;
    admin.is_active = true;
    admin.device_id = device_id.map(str::to_string);

    let family = FamilyRecord {
        code: code.clone(),
        created_at: now,
        settings: FamilySettings::default(),
    };

    db.create_family(&family, &admin).map_err(|e| match e {
        StoreError::Duplicate => FamilyError::FamilyAlreadyExists,
        other => other.into(),
    })?;

    info!(code = %code, admin = %admin.id, "family created");
    Ok((Session::new(&admin, code), admin))
}

/// Sign into the family identified by `code`.
///
/// The name is matched case-insensitively against existing members; an
/// unknown name joins the family with the `Other` role. A wrong code fails
/// before anything is read or written for the member.
pub fn authenticate(
    db: &Database,
    code: &str,
    name: &str,
    device_id: Option<&str>,
) -> Result<(Session, Member)> {
    let code = family_code::normalize(code)?;
    let family = db.get_family()?.ok_or(FamilyError::InvalidFamilyCode)?;
    if family.code != code {
        warn!("sign-in attempt with wrong family code");
        return Err(FamilyError::InvalidFamilyCode);
    }

    let name = validate_name(name)?;
    let now = Utc::now();

    let member = match db.find_member_by_name(&name)? {
        Some(existing) => sign_in_existing(db, existing.id, device_id)?,
        None => {
            let mut member = Member::new(name.clone(), Role::Other, now);
            member.is_online = true;
            member.is_active = true;
            member.device_id = device_id.map(str::to_string);

            match db.insert_member(&member) {
                Ok(()) => {
                    info!(member = %member.id, "new member joined");
                    member
                }
                // Another sign-in with the same name won the insert.
                Err(StoreError::Duplicate) => {
                    let existing = db
                        .find_member_by_name(&name)?
                        .ok_or(FamilyError::MemberNotFound)?;
                    sign_in_existing(db, existing.id, device_id)?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    Ok((Session::new(&member, code), member))
}

fn sign_in_existing(db: &Database, id: MemberId, device_id: Option<&str>) -> Result<Member> {
    if !db.mark_member_online(id, device_id, Utc::now())? {
        return Err(FamilyError::MemberNotFound);
    }
    info!(member = %id, "member signed in");
    get_member(db, id)
}

/// Mark the session's member offline.
pub fn logout(db: &Database, session: &Session) -> Result<()> {
    db.mark_member_offline(session.member_id, Utc::now())?;
    info!(member = %session.member_id, "member signed out");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub fn get_member(db: &Database, id: MemberId) -> Result<Member> {
    db.get_member(id).map_err(|e| match e {
        StoreError::NotFound => FamilyError::MemberNotFound,
        other => other.into(),
    })
}

pub fn list_members(db: &Database, session: &Session) -> Result<Vec<Member>> {
    load_actor(db, session)?;
    Ok(db.list_members()?)
}

// ---------------------------------------------------------------------------
// Admin operations
// ---------------------------------------------------------------------------

pub fn add_member(db: &Database, session: &Session, new: NewMember) -> Result<Member> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::AddMembers)?;

    let name = validate_name(&new.name)?;
    if new.role.is_admin() && !actor.role.is_admin() {
        return Err(FamilyError::ForbiddenRoleChange);
    }
    if db.find_member_by_name(&name)?.is_some() {
        return Err(FamilyError::DuplicateMember);
    }

    let mut member = Member::new(name, new.role, Utc::now());
    member.email = clean_optional(new.email);
    member.phone = clean_optional(new.phone);

    db.insert_member(&member).map_err(duplicate_as_member)?;

    info!(actor = %actor.id, member = %member.id, role = %member.role, "member added");
    audit::record(
        db,
        AdminAction::new(
            actor.id,
            Some(member.id),
            AdminActionKind::AddMember,
            format!("Added {} as {}", member.name, member.role),
        ),
    );

    Ok(member)
}

pub fn edit_member(
    db: &Database,
    session: &Session,
    member_id: MemberId,
    update: MemberUpdate,
) -> Result<Member> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::EditMembers)?;

    let target = get_member(db, member_id)?;
    if target.role.is_admin() && target.id != actor.id {
        return Err(FamilyError::ForbiddenRoleChange);
    }

    let mut update = update;
    if let Some(name) = update.name.take() {
        update.name = Some(validate_name(&name)?);
    }
    update.email = update.email.map(clean_optional);
    update.phone = update.phone.map(clean_optional);

    if let Some(role) = update.role {
        if role.is_admin() && !target.role.is_admin() && !actor.role.is_admin() {
            return Err(FamilyError::ForbiddenRoleChange);
        }
    }
    if target.role.is_admin() {
        let demoting = update.role.is_some_and(|r| !r.is_admin());
        let deactivating = update.is_active == Some(false);
        if (demoting || deactivating)
            && db.count_active_members_with_role(Role::Administrator)? <= 1
        {
            return Err(FamilyError::ForbiddenRoleChange);
        }
    }

    let mut updated = target.clone();
    let changed = update.apply_to(&mut updated);
    if changed.is_empty() {
        return Ok(target);
    }
    let deactivated = target.is_active && !updated.is_active;
    if deactivated {
        updated.is_online = false;
    }

    if !db.update_member(&updated).map_err(duplicate_as_member)? {
        return Err(FamilyError::MemberNotFound);
    }

    info!(actor = %actor.id, member = %updated.id, fields = ?changed, "member edited");
    let kind = if deactivated {
        AdminActionKind::DeactivateMember
    } else {
        AdminActionKind::EditMember
    };
    audit::record(
        db,
        AdminAction::new(
            actor.id,
            Some(updated.id),
            kind,
            format!("Updated {}: {}", updated.name, changed.join(", ")),
        ),
    );

    Ok(updated)
}

pub fn remove_member(db: &Database, session: &Session, member_id: MemberId) -> Result<()> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::RemoveMembers)?;

    let target = get_member(db, member_id)?;
    if target.id == actor.id {
        return Err(FamilyError::CannotRemoveSelf);
    }
    if target.role.is_admin() {
        return Err(FamilyError::CannotRemoveAdmin);
    }

    if !db.delete_member(target.id)? {
        return Err(FamilyError::MemberNotFound);
    }

    info!(actor = %actor.id, member = %target.id, "member removed");
    audit::record(
        db,
        AdminAction::new(
            actor.id,
            Some(target.id),
            AdminActionKind::RemoveMember,
            format!("Removed {}", target.name),
        ),
    );

    Ok(())
}

pub fn change_role(
    db: &Database,
    session: &Session,
    member_id: MemberId,
    new_role: Role,
) -> Result<Member> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::EditMembers)?;

    let target = get_member(db, member_id)?;
    if target.role.is_admin() {
        return Err(FamilyError::CannotChangeAdminRole);
    }
    if new_role.is_admin() && !actor.role.is_admin() {
        return Err(FamilyError::ForbiddenRoleChange);
    }
    if new_role == target.role {
        return Ok(target);
    }

    if !db.set_member_role(target.id, new_role)? {
        return Err(FamilyError::MemberNotFound);
    }

    info!(actor = %actor.id, member = %target.id, from = %target.role, to = %new_role, "role changed");
    audit::record(
        db,
        AdminAction::new(
            actor.id,
            Some(target.id),
            AdminActionKind::ChangeRole,
            format!("Changed {} from {} to {}", target.name, target.role, new_role),
        ),
    );

    Ok(Member {
        role: new_role,
        ..target
    })
}

/// Deactivate a member: they stay in the roster but go offline, and their
/// current session can no longer act. Signing in again re-activates them,
/// like any first login.
pub fn deactivate_member(db: &Database, session: &Session, member_id: MemberId) -> Result<Member> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::EditMembers)?;

    let target = get_member(db, member_id)?;
    if target.id == actor.id {
        return Err(FamilyError::CannotRemoveSelf);
    }
    if target.role.is_admin() {
        return Err(FamilyError::CannotRemoveAdmin);
    }
    if !target.is_active && !target.is_online {
        return Ok(target);
    }

    let updated = Member {
        is_active: false,
        is_online: false,
        ..target
    };
    if !db.update_member(&updated)? {
        return Err(FamilyError::MemberNotFound);
    }
    db.mark_member_offline(updated.id, Utc::now())?;

    info!(actor = %actor.id, member = %updated.id, "member deactivated");
    audit::record(
        db,
        AdminAction::new(
            actor.id,
            Some(updated.id),
            AdminActionKind::DeactivateMember,
            format!("Deactivated {}", updated.name),
        ),
    );

    get_member(db, updated.id)
}

// ---------------------------------------------------------------------------
// Family settings
// ---------------------------------------------------------------------------

pub fn family_settings(db: &Database, session: &Session) -> Result<FamilySettings> {
    load_actor(db, session)?;
    let family = db.get_family()?.ok_or(FamilyError::InvalidFamilyCode)?;
    Ok(family.settings)
}

pub fn update_family_settings(
    db: &Database,
    session: &Session,
    settings: FamilySettings,
) -> Result<FamilySettings> {
    let actor = load_actor(db, session)?;
    require(&actor, Capability::ManageSettings)?;

    if !db.update_family_settings(&settings)? {
        return Err(FamilyError::InvalidFamilyCode);
    }
    info!(actor = %actor.id, "family settings updated");
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch the session's member fresh from the store. A member who was removed
/// or deactivated since signing in can no longer act.
pub(crate) fn load_actor(db: &Database, session: &Session) -> Result<Member> {
    match db.get_member(session.member_id) {
        Ok(member) if member.is_active => Ok(member),
        Ok(_) | Err(StoreError::NotFound) => Err(FamilyError::InsufficientPermissions),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn require(actor: &Member, capability: Capability) -> Result<()> {
    if actor.permissions().allows(capability) {
        Ok(())
    } else {
        warn!(actor = %actor.id, role = %actor.role, ?capability, "permission denied");
        Err(FamilyError::InsufficientPermissions)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FamilyError::Validation("name must not be empty".into()));
    }
    if name.chars().count() > MAX_MEMBER_NAME_LEN {
        return Err(FamilyError::Validation(format!(
            "name must be at most {MAX_MEMBER_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duplicate_as_member(e: StoreError) -> FamilyError {
    match e {
        StoreError::Duplicate => FamilyError::DuplicateMember,
        other => other.into(),
    }
}
