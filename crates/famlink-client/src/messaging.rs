//! One-to-one messages between family members.
//!
//! There is no transport: sending stores the message locally with status
//! `Sent`. Every operation acts as the session's member.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use famlink_shared::constants::MAX_MESSAGE_SIZE;
use famlink_shared::{MemberId, MessageId, MessageKind, MessageStatus};
use famlink_store::{Database, Message, StoreError};

use crate::directory::{get_member, load_actor};
use crate::error::{FamilyError, Result};
use crate::session::Session;

/// A message about to be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub content: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Text,
            metadata: None,
        }
    }
}

/// Latest message of one conversation plus the unread count for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub counterpart_id: MemberId,
    pub last_message: Message,
    pub unread_count: usize,
}

/// Send a text message from the session's member to `receiver`.
pub fn send(db: &Database, session: &Session, receiver: MemberId, content: &str) -> Result<Message> {
    send_with(db, session, receiver, OutgoingMessage::text(content))
}

pub fn send_with(
    db: &Database,
    session: &Session,
    receiver: MemberId,
    outgoing: OutgoingMessage,
) -> Result<Message> {
    let sender = load_actor(db, session)?;

    if outgoing.content.trim().is_empty() {
        return Err(FamilyError::Validation("message must not be empty".into()));
    }
    if outgoing.content.len() > MAX_MESSAGE_SIZE {
        return Err(FamilyError::Validation(format!(
            "message exceeds {MAX_MESSAGE_SIZE} bytes"
        )));
    }
    if receiver == sender.id {
        return Err(FamilyError::Validation("cannot send a message to yourself".into()));
    }
    get_member(db, receiver)?;

    let message = Message {
        id: MessageId::new(),
        sender_id: sender.id,
        receiver_id: receiver,
        content: outgoing.content,
        kind: outgoing.kind,
        timestamp: Utc::now(),
        status: MessageStatus::Sent,
        is_encrypted: false,
        metadata: outgoing.metadata,
    };
    db.insert_message(&message)?;

    info!(
        id = %message.id,
        from = %message.sender_id,
        to = %message.receiver_id,
        kind = message.kind.as_str(),
        "message sent"
    );
    Ok(message)
}

/// Conversation between the session's member and `other`, oldest first.
pub fn messages_between(db: &Database, session: &Session, other: MemberId) -> Result<Vec<Message>> {
    let me = load_actor(db, session)?;
    let messages = db.get_messages_between(me.id, other)?;
    debug!(with = %other, count = messages.len(), "loaded conversation");
    Ok(messages)
}

/// Mark everything `other` sent to the session's member as read.
pub fn mark_conversation_read(db: &Database, session: &Session, other: MemberId) -> Result<usize> {
    let me = load_actor(db, session)?;
    let changed = db.mark_messages_read(me.id, other)?;
    if changed > 0 {
        info!(reader = %me.id, sender = %other, changed, "conversation marked read");
    }
    Ok(changed)
}

/// Set the delivery status of one message. Only its sender or receiver may.
pub fn update_status(
    db: &Database,
    session: &Session,
    id: MessageId,
    status: MessageStatus,
) -> Result<Message> {
    let me = load_actor(db, session)?;
    let message = db.get_message_by_id(id).map_err(|e| match e {
        StoreError::NotFound => FamilyError::MessageNotFound,
        other => other.into(),
    })?;
    if message.sender_id != me.id && message.receiver_id != me.id {
        return Err(FamilyError::InsufficientPermissions);
    }
    if message.status == status {
        return Ok(message);
    }

    if !db.update_message_status(id, status)? {
        return Err(FamilyError::MessageNotFound);
    }
    debug!(%id, status = status.as_str(), "message status updated");
    Ok(Message { status, ..message })
}

/// Messages sent to the session's member that are not read yet, across all
/// conversations.
pub fn unread_total(db: &Database, session: &Session) -> Result<usize> {
    let me = load_actor(db, session)?;
    Ok(db.count_unread_for(me.id)?)
}

/// One summary per counterpart, most recently active conversation first.
pub fn conversations(db: &Database, session: &Session) -> Result<Vec<ConversationSummary>> {
    let me = load_actor(db, session)?;

    let mut summaries = Vec::new();
    for last_message in db.get_latest_messages_for(me.id)? {
        let counterpart_id = last_message.counterpart(me.id);
        summaries.push(ConversationSummary {
            counterpart_id,
            unread_count: db.count_unread_between(me.id, counterpart_id)?,
            last_message,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{add_member, authenticate, NewMember};
    use crate::test_support::family_with_alice;
    use famlink_shared::Role;

    fn with_bob() -> (tempfile::TempDir, Database, Session, Session) {
        let (dir, db, alice_session, _alice) = family_with_alice();
        add_member(&db, &alice_session, NewMember::new("Bob", Role::Child)).unwrap();
        let (bob_session, _) = authenticate(&db, "FAM123", "Bob", None).unwrap();
        (dir, db, alice_session, bob_session)
    }

    #[test]
    fn test_send_defaults() {
        let (_dir, db, alice, bob) = with_bob();
        let msg = send(&db, &alice, bob.member_id, "dinner at 7").unwrap();

        assert_eq!(msg.sender_id, alice.member_id);
        assert_eq!(msg.receiver_id, bob.member_id);
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.status, MessageStatus::Sent);
        assert!(!msg.is_encrypted);
        assert_eq!(db.get_message_by_id(msg.id).unwrap(), msg);
    }

    #[test]
    fn test_send_rejections() {
        let (_dir, db, alice, bob) = with_bob();
        assert!(matches!(
            send(&db, &alice, MemberId::new(), "hello?"),
            Err(FamilyError::MemberNotFound)
        ));
        assert!(matches!(
            send(&db, &alice, bob.member_id, "  "),
            Err(FamilyError::Validation(_))
        ));
        assert!(matches!(
            send(&db, &alice, alice.member_id, "note to self"),
            Err(FamilyError::Validation(_))
        ));
        let huge = "x".repeat(MAX_MESSAGE_SIZE + 1);
        assert!(matches!(
            send(&db, &alice, bob.member_id, &huge),
            Err(FamilyError::Validation(_))
        ));
    }

    #[test]
    fn test_messages_between_pair_only_in_order() {
        let (_dir, db, alice, bob) = with_bob();
        add_member(&db, &alice, NewMember::new("Carol", Role::Parent)).unwrap();
        let (carol, _) = authenticate(&db, "FAM123", "Carol", None).unwrap();

        send(&db, &alice, bob.member_id, "one").unwrap();
        send(&db, &carol, alice.member_id, "unrelated").unwrap();
        send(&db, &bob, alice.member_id, "two").unwrap();
        send(&db, &carol, bob.member_id, "also unrelated").unwrap();
        send(&db, &alice, bob.member_id, "three").unwrap();

        let from_alice: Vec<String> = messages_between(&db, &alice, bob.member_id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(from_alice, vec!["one", "two", "three"]);

        let from_bob = messages_between(&db, &bob, alice.member_id).unwrap();
        assert_eq!(from_bob.len(), 3);
        assert!(from_bob
            .iter()
            .all(|m| m.involves(alice.member_id, bob.member_id)));
    }

    #[test]
    fn test_typed_message_metadata() {
        let (_dir, db, alice, bob) = with_bob();
        let outgoing = OutgoingMessage {
            content: "I'm here".into(),
            kind: MessageKind::Location,
            metadata: Some(serde_json::json!({ "latitude": 45.5, "longitude": -73.6 })),
        };
        let msg = send_with(&db, &bob, alice.member_id, outgoing).unwrap();
        let stored = db.get_message_by_id(msg.id).unwrap();
        assert_eq!(stored.kind, MessageKind::Location);
        assert_eq!(stored.metadata, msg.metadata);
    }

    #[test]
    fn test_read_tracking_and_conversations() {
        let (_dir, db, alice, bob) = with_bob();
        add_member(&db, &alice, NewMember::new("Carol", Role::Parent)).unwrap();
        let (carol, _) = authenticate(&db, "FAM123", "Carol", None).unwrap();

        send(&db, &bob, alice.member_id, "hi mum").unwrap();
        send(&db, &bob, alice.member_id, "can I go out").unwrap();
        send(&db, &carol, alice.member_id, "groceries?").unwrap();

        let convs = conversations(&db, &alice).unwrap();
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].counterpart_id, carol.member_id);
        assert_eq!(convs[0].unread_count, 1);
        assert_eq!(convs[1].counterpart_id, bob.member_id);
        assert_eq!(convs[1].unread_count, 2);
        assert_eq!(convs[1].last_message.content, "can I go out");

        assert_eq!(unread_total(&db, &alice).unwrap(), 3);
        assert_eq!(unread_total(&db, &bob).unwrap(), 0);

        assert_eq!(mark_conversation_read(&db, &alice, bob.member_id).unwrap(), 2);
        let convs = conversations(&db, &alice).unwrap();
        assert_eq!(convs[1].unread_count, 0);
        assert_eq!(unread_total(&db, &alice).unwrap(), 1);
    }

    #[test]
    fn test_update_status_by_participants_only() {
        let (_dir, db, alice, bob) = with_bob();
        add_member(&db, &alice, NewMember::new("Carol", Role::Parent)).unwrap();
        let (carol, _) = authenticate(&db, "FAM123", "Carol", None).unwrap();
        let msg = send(&db, &alice, bob.member_id, "ping").unwrap();

        let delivered = update_status(&db, &bob, msg.id, MessageStatus::Delivered).unwrap();
        assert_eq!(delivered.status, MessageStatus::Delivered);
        assert_eq!(
            db.get_message_by_id(msg.id).unwrap().status,
            MessageStatus::Delivered
        );

        assert!(matches!(
            update_status(&db, &carol, msg.id, MessageStatus::Read),
            Err(FamilyError::InsufficientPermissions)
        ));
        assert!(matches!(
            update_status(&db, &bob, MessageId::new(), MessageStatus::Read),
            Err(FamilyError::MessageNotFound)
        ));
    }
}
