//! CRUD operations for [`Member`] records.
//!
//! Names are unique case-insensitively (`COLLATE NOCASE` index), so two
//! concurrent first logins with the same name cannot both insert.

use chrono::{DateTime, Utc};
use famlink_shared::{MemberId, Role};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Member;
use crate::sql::{parse_timestamp, parse_uuid};

const MEMBER_COLUMNS: &str =
    "id, name, role, is_online, last_seen, device_id, joined_at, is_active, email, phone";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new member. Fails with [`StoreError::Duplicate`] when the id
    /// or the (case-insensitive) name is taken.
    pub fn insert_member(&self, member: &Member) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO members (id, name, role, is_online, last_seen, device_id,
                                      joined_at, is_active, email, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    member.id.to_string(),
                    member.name,
                    member.role.as_str(),
                    member.is_online,
                    member.last_seen.to_rfc3339(),
                    member.device_id,
                    member.joined_at.to_rfc3339(),
                    member.is_active,
                    member.email,
                    member.phone,
                ],
            )
            .map_err(StoreError::from_insert)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_member(&self, id: MemberId) -> Result<Member> {
        self.conn()
            .query_row(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
                params![id.to_string()],
                row_to_member,
            )
            .map_err(StoreError::from_query_row)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_member_by_name(&self, name: &str) -> Result<Option<Member>> {
        match self.conn().query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE name = ?1 COLLATE NOCASE"),
            params![name],
            row_to_member,
        ) {
            Ok(member) => Ok(Some(member)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// All members, oldest first.
    pub fn list_members(&self) -> Result<Vec<Member>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY joined_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map([], row_to_member)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Members holding `role` who have not been deactivated.
    pub fn count_active_members_with_role(&self, role: Role) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM members WHERE role = ?1 AND is_active = 1",
            params![role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite the editable fields of one member. An inactive member is
    /// also taken offline. Returns `false` if the member no longer exists.
    pub fn update_member(&self, member: &Member) -> Result<bool> {
        let affected = self
            .conn()
            .execute(
                "UPDATE members
                 SET name = ?2, role = ?3, is_active = ?4, email = ?5, phone = ?6,
                     is_online = CASE WHEN ?4 THEN is_online ELSE 0 END
                 WHERE id = ?1",
                params![
                    member.id.to_string(),
                    member.name,
                    member.role.as_str(),
                    member.is_active,
                    member.email,
                    member.phone,
                ],
            )
            .map_err(StoreError::from_insert)?;
        Ok(affected > 0)
    }

    pub fn set_member_role(&self, id: MemberId, role: Role) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE members SET role = ?2 WHERE id = ?1",
            params![id.to_string(), role.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Record a sign-in: online, active, last seen now, from `device_id`.
    pub fn mark_member_online(
        &self,
        id: MemberId,
        device_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE members
             SET is_online = 1, is_active = 1, last_seen = ?2,
                 device_id = COALESCE(?3, device_id)
             WHERE id = ?1",
            params![id.to_string(), now.to_rfc3339(), device_id],
        )?;
        Ok(affected > 0)
    }

    pub fn mark_member_offline(&self, id: MemberId, now: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE members SET is_online = 0, last_seen = ?2 WHERE id = ?1",
            params![id.to_string(), now.to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a member by id.  Returns `true` if a row was deleted.
    pub fn delete_member(&self, id: MemberId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM members WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Member`]. Unknown stored roles degrade to
/// [`Role::Other`], which grants nothing.
pub(crate) fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(2)?;
    let last_seen_str: String = row.get(4)?;
    let joined_str: String = row.get(6)?;

    let role = Role::parse(&role_str).unwrap_or_else(|| {
        tracing::warn!(role = %role_str, member = %id_str, "unknown stored role");
        Role::Other
    });

    Ok(Member {
        id: MemberId(parse_uuid(0, &id_str)?),
        name: row.get(1)?,
        role,
        is_online: row.get(3)?,
        last_seen: parse_timestamp(4, &last_seen_str)?,
        device_id: row.get(5)?,
        joined_at: parse_timestamp(6, &joined_str)?,
        is_active: row.get(7)?,
        email: row.get(8)?,
        phone: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_db;

    #[test]
    fn test_insert_and_get() {
        let (_dir, db) = temp_db();
        let mut alice = Member::new("Alice", Role::Administrator, Utc::now());
        alice.email = Some("alice@example.com".into());
        db.insert_member(&alice).unwrap();

        let loaded = db.get_member(alice.id).unwrap();
        assert_eq!(loaded.name, "Alice");
        assert_eq!(loaded.role, Role::Administrator);
        assert_eq!(loaded.email.as_deref(), Some("alice@example.com"));
        assert!(!loaded.is_online);
    }

    #[test]
    fn test_name_unique_case_insensitive() {
        let (_dir, db) = temp_db();
        db.insert_member(&Member::new("Alice", Role::Parent, Utc::now()))
            .unwrap();

        let err = db
            .insert_member(&Member::new("ALICE", Role::Child, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        let found = db.find_member_by_name("aLiCe").unwrap().unwrap();
        assert_eq!(found.name, "Alice");
        assert!(db.find_member_by_name("Bob").unwrap().is_none());
    }

    #[test]
    fn test_get_missing_member() {
        let (_dir, db) = temp_db();
        assert!(matches!(
            db.get_member(MemberId::new()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_online_offline() {
        let (_dir, db) = temp_db();
        let bob = Member::new("Bob", Role::Child, Utc::now());
        db.insert_member(&bob).unwrap();

        assert!(db.mark_member_online(bob.id, Some("phone-1"), Utc::now()).unwrap());
        let online = db.get_member(bob.id).unwrap();
        assert!(online.is_online && online.is_active);
        assert_eq!(online.device_id.as_deref(), Some("phone-1"));

        assert!(db.mark_member_offline(bob.id, Utc::now()).unwrap());
        let offline = db.get_member(bob.id).unwrap();
        assert!(!offline.is_online);
        assert_eq!(offline.device_id.as_deref(), Some("phone-1"));
    }

    #[test]
    fn test_update_role_and_delete() {
        let (_dir, db) = temp_db();
        let mut bob = Member::new("Bob", Role::Child, Utc::now());
        db.insert_member(&bob).unwrap();

        bob.role = Role::Parent;
        bob.phone = Some("555-0100".into());
        assert!(db.update_member(&bob).unwrap());
        assert_eq!(db.get_member(bob.id).unwrap(), bob);
        assert_eq!(db.count_active_members_with_role(Role::Parent).unwrap(), 0);
        assert!(db.mark_member_online(bob.id, None, Utc::now()).unwrap());
        assert_eq!(db.count_active_members_with_role(Role::Parent).unwrap(), 1);

        bob.is_active = false;
        assert!(db.update_member(&bob).unwrap());
        assert!(!db.get_member(bob.id).unwrap().is_online);

        assert!(db.set_member_role(bob.id, Role::Grandparent).unwrap());
        assert_eq!(db.get_member(bob.id).unwrap().role, Role::Grandparent);

        assert!(db.delete_member(bob.id).unwrap());
        assert!(!db.delete_member(bob.id).unwrap());
        assert!(db.list_members().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_stored_role_degrades_to_other() {
        let (_dir, db) = temp_db();
        let carol = Member::new("Carol", Role::Parent, Utc::now());
        db.insert_member(&carol).unwrap();
        db.conn()
            .execute(
                "UPDATE members SET role = 'overlord' WHERE id = ?1",
                params![carol.id.to_string()],
            )
            .unwrap();

        let loaded = db.get_member(carol.id).unwrap();
        assert_eq!(loaded.role, Role::Other);
        assert_eq!(loaded.permissions(), famlink_shared::Permissions::NONE);
    }
}
