use famlink_shared::{MemberId, MessageId, MessageKind, MessageStatus};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;
use crate::sql::{parse_json, parse_tag, parse_timestamp, parse_uuid};

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, content, kind, timestamp, status, is_encrypted, metadata";

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn()
            .execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, kind, timestamp,
                                       status, is_encrypted, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message.id.to_string(),
                    message.sender_id.to_string(),
                    message.receiver_id.to_string(),
                    message.content,
                    message.kind.as_str(),
                    message.timestamp.to_rfc3339(),
                    message.status.as_str(),
                    message.is_encrypted,
                    metadata,
                ],
            )
            .map_err(StoreError::from_insert)?;
        Ok(())
    }

    /// Messages exchanged between `a` and `b` in either direction, in the
    /// order they were stored.
    pub fn get_messages_between(&self, a: MemberId, b: MemberId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY seq ASC"
        ))?;

        let rows = stmt.query_map(params![a.to_string(), b.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_message_by_id(&self, id: MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(StoreError::from_query_row)
    }

    /// Every stored message in insertion order (used by backups).
    pub fn list_all_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY seq ASC"))?;
        let rows = stmt.query_map([], row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Latest message of each conversation `member` takes part in, newest
    /// conversation first.
    pub fn get_latest_messages_for(&self, member: MemberId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE seq IN (
                 SELECT MAX(seq) FROM messages
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 GROUP BY CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
             )
             ORDER BY seq DESC"
        ))?;
        let rows = stmt.query_map(params![member.to_string()], row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn update_message_status(&self, id: MessageId, status: MessageStatus) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Mark everything `sender` sent to `reader` as read. Returns the number
    /// of messages that changed.
    pub fn mark_messages_read(&self, reader: MemberId, sender: MemberId) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE messages SET status = 'read'
             WHERE receiver_id = ?1 AND sender_id = ?2 AND status != 'read'",
            params![reader.to_string(), sender.to_string()],
        )?;
        Ok(affected)
    }

    /// Unread messages `sender` sent to `reader`.
    pub fn count_unread_between(&self, reader: MemberId, sender: MemberId) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages
             WHERE receiver_id = ?1 AND sender_id = ?2 AND status != 'read'",
            params![reader.to_string(), sender.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_unread_for(&self, reader: MemberId) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND status != 'read'",
            params![reader.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(1)?;
    let receiver_str: String = row.get(2)?;
    let kind_str: String = row.get(4)?;
    let ts_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let metadata_str: Option<String> = row.get(8)?;

    let metadata = metadata_str
        .as_deref()
        .map(|s| parse_json(8, s))
        .transpose()?;

    Ok(Message {
        id: MessageId(parse_uuid(0, &id_str)?),
        sender_id: MemberId(parse_uuid(1, &sender_str)?),
        receiver_id: MemberId(parse_uuid(2, &receiver_str)?),
        content: row.get(3)?,
        kind: parse_tag(4, &kind_str, MessageKind::parse)?,
        timestamp: parse_timestamp(5, &ts_str)?,
        status: parse_tag(6, &status_str, MessageStatus::parse)?,
        is_encrypted: row.get(7)?,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_db;
    use chrono::Utc;

    fn text(from: MemberId, to: MemberId, content: &str) -> Message {
        Message {
            id: MessageId::new(),
            sender_id: from,
            receiver_id: to,
            content: content.to_string(),
            kind: MessageKind::Text,
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            is_encrypted: false,
            metadata: None,
        }
    }

    #[test]
    fn test_between_filters_pair_in_order() {
        let (_dir, db) = temp_db();
        let (a, b, c) = (MemberId::new(), MemberId::new(), MemberId::new());

        db.insert_message(&text(a, b, "1")).unwrap();
        db.insert_message(&text(c, a, "not ours")).unwrap();
        db.insert_message(&text(b, a, "2")).unwrap();
        db.insert_message(&text(b, c, "also not ours")).unwrap();
        db.insert_message(&text(a, b, "3")).unwrap();

        let contents: Vec<String> = db
            .get_messages_between(a, b)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["1", "2", "3"]);

        let reversed = db.get_messages_between(b, a).unwrap();
        assert_eq!(reversed.len(), 3);
        assert!(reversed.iter().all(|m| m.involves(a, b)));
    }

    #[test]
    fn test_metadata_round_trip() {
        let (_dir, db) = temp_db();
        let mut msg = text(MemberId::new(), MemberId::new(), "park");
        msg.kind = MessageKind::Location;
        msg.metadata = Some(serde_json::json!({ "latitude": 48.85, "longitude": 2.35 }));
        db.insert_message(&msg).unwrap();

        let loaded = db.get_message_by_id(msg.id).unwrap();
        assert_eq!(loaded, msg);
    }

    #[test]
    fn test_status_updates() {
        let (_dir, db) = temp_db();
        let (a, b) = (MemberId::new(), MemberId::new());
        let first = text(a, b, "hi");
        db.insert_message(&first).unwrap();
        db.insert_message(&text(a, b, "there")).unwrap();
        db.insert_message(&text(b, a, "hello")).unwrap();

        assert!(db
            .update_message_status(first.id, MessageStatus::Delivered)
            .unwrap());
        assert_eq!(
            db.get_message_by_id(first.id).unwrap().status,
            MessageStatus::Delivered
        );

        assert_eq!(db.count_unread_for(b).unwrap(), 2);
        assert_eq!(db.count_unread_between(b, a).unwrap(), 2);
        assert_eq!(db.count_unread_between(a, b).unwrap(), 1);
        assert_eq!(db.mark_messages_read(b, a).unwrap(), 2);
        assert_eq!(db.mark_messages_read(b, a).unwrap(), 0);
        assert_eq!(db.count_unread_for(b).unwrap(), 0);
        assert_eq!(db.count_unread_for(a).unwrap(), 1);
    }

    #[test]
    fn test_latest_per_conversation() {
        let (_dir, db) = temp_db();
        let (a, b, c) = (MemberId::new(), MemberId::new(), MemberId::new());

        db.insert_message(&text(a, b, "ab-1")).unwrap();
        db.insert_message(&text(c, a, "ca-1")).unwrap();
        db.insert_message(&text(b, a, "ab-2")).unwrap();
        db.insert_message(&text(b, c, "bc-1")).unwrap();

        let latest: Vec<String> = db
            .get_latest_messages_for(a)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(latest, vec!["ab-2", "ca-1"]);
    }
}
