//! The single-row family record: code, creation time and settings.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{FamilyRecord, FamilySettings, Member};
use crate::sql::{parse_json, parse_timestamp};

impl Database {
    pub fn get_family(&self) -> Result<Option<FamilyRecord>> {
        let result = self.conn().query_row(
            "SELECT code, created_at, settings_json FROM family WHERE id = 1",
            [],
            |row| {
                let created_str: String = row.get(1)?;
                let settings_json: String = row.get(2)?;
                Ok(FamilyRecord {
                    code: row.get(0)?,
                    created_at: parse_timestamp(1, &created_str)?,
                    settings: parse_json(2, &settings_json)?,
                })
            },
        );

        match result {
            Ok(family) => Ok(Some(family)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Write the family record and its first administrator in one
    /// transaction. Fails with [`StoreError::Duplicate`] if a family already
    /// exists on this device.
    pub fn create_family(&self, family: &FamilyRecord, admin: &Member) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO family (id, code, created_at, settings_json) VALUES (1, ?1, ?2, ?3)",
            params![
                family.code,
                family.created_at.to_rfc3339(),
                serde_json::to_string(&family.settings)?,
            ],
        )
        .map_err(StoreError::from_insert)?;

        // Goes through the same statement as `insert_member`; the transaction
        // is on the same connection.
        self.insert_member(admin)?;

        tx.commit()?;
        Ok(())
    }

    pub fn update_family_settings(&self, settings: &FamilySettings) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE family SET settings_json = ?1 WHERE id = 1",
            params![serde_json::to_string(settings)?],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_db;
    use chrono::Utc;
    use famlink_shared::Role;

    fn record(code: &str) -> FamilyRecord {
        FamilyRecord {
            code: code.to_string(),
            created_at: Utc::now(),
            settings: FamilySettings::default(),
        }
    }

    #[test]
    fn test_create_and_read_family() {
        let (_dir, db) = temp_db();
        assert!(db.get_family().unwrap().is_none());

        let admin = Member::new("Alice", Role::Administrator, Utc::now());
        db.create_family(&record("FAM123"), &admin).unwrap();

        let family = db.get_family().unwrap().unwrap();
        assert_eq!(family.code, "FAM123");
        assert_eq!(db.get_member(admin.id).unwrap().role, Role::Administrator);
    }

    #[test]
    fn test_second_family_rejected_and_rolled_back() {
        let (_dir, db) = temp_db();
        db.create_family(
            &record("FAM123"),
            &Member::new("Alice", Role::Administrator, Utc::now()),
        )
        .unwrap();

        let intruder = Member::new("Mallory", Role::Administrator, Utc::now());
        let err = db.create_family(&record("OTHER1"), &intruder).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert!(matches!(db.get_member(intruder.id), Err(StoreError::NotFound)));
        assert_eq!(db.get_family().unwrap().unwrap().code, "FAM123");
    }

    #[test]
    fn test_update_settings() {
        let (_dir, db) = temp_db();
        let settings = FamilySettings {
            family_name: Some("The Smiths".into()),
            ..Default::default()
        };
        assert!(!db.update_family_settings(&settings).unwrap());

        db.create_family(
            &record("FAM123"),
            &Member::new("Alice", Role::Administrator, Utc::now()),
        )
        .unwrap();
        assert!(db.update_family_settings(&settings).unwrap());
        assert_eq!(db.get_family().unwrap().unwrap().settings, settings);
    }
}
