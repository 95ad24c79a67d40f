//! v001 -- Initial schema creation.
//!
//! Creates `family`, `members`, `messages`, `admin_actions` and
//! `app_preferences`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Family (single row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS family (
    id            INTEGER PRIMARY KEY CHECK (id = 1),
    code          TEXT NOT NULL,              -- normalized family code
    created_at    TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    settings_json TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Members
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS members (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    role       TEXT NOT NULL,                 -- admin/parent/child/grandparent/other
    is_online  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    last_seen  TEXT NOT NULL,
    device_id  TEXT,
    joined_at  TEXT NOT NULL,
    is_active  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    email      TEXT,
    phone      TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_members_name ON members(name COLLATE NOCASE);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    id           TEXT NOT NULL UNIQUE,               -- UUID v4
    sender_id    TEXT NOT NULL,
    receiver_id  TEXT NOT NULL,
    content      TEXT NOT NULL,
    kind         TEXT NOT NULL,                      -- text/image/voice/file/location
    timestamp    TEXT NOT NULL,                      -- ISO-8601
    status       TEXT NOT NULL,
    is_encrypted INTEGER NOT NULL DEFAULT 0,
    metadata     TEXT                                -- JSON object
);

CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id);
CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id);

-- ----------------------------------------------------------------
-- Admin actions (audit log, capped)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS admin_actions (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    id               TEXT NOT NULL UNIQUE,
    admin_id         TEXT NOT NULL,
    target_member_id TEXT,
    action           TEXT NOT NULL,
    details          TEXT NOT NULL,
    timestamp        TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- App preferences (single row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS app_preferences (
    id   INTEGER PRIMARY KEY CHECK (id = 1),
    json TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
