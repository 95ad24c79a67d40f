use serde::Serialize;

use famlink_shared::MessageStatus;
use famlink_store::Message;

use super::{lock, parse_member_id, parse_message_id, CommandError, CommandResult};
use crate::messaging::{self, ConversationSummary, OutgoingMessage};
use crate::state::SharedState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub kind: String,
    pub timestamp: String,
    pub status: String,
    pub is_encrypted: bool,
    pub metadata: Option<serde_json::Value>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id.to_string(),
            sender_id: m.sender_id.to_string(),
            receiver_id: m.receiver_id.to_string(),
            content: m.content,
            kind: m.kind.as_str().to_string(),
            timestamp: m.timestamp.to_rfc3339(),
            status: m.status.as_str().to_string(),
            is_encrypted: m.is_encrypted,
            metadata: m.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub member_id: String,
    pub last_message: MessageDto,
    pub unread_count: usize,
}

impl From<ConversationSummary> for ConversationDto {
    fn from(c: ConversationSummary) -> Self {
        Self {
            member_id: c.counterpart_id.to_string(),
            last_message: c.last_message.into(),
            unread_count: c.unread_count,
        }
    }
}

pub fn send_message(
    state: &SharedState,
    receiver_id: String,
    content: String,
) -> CommandResult<MessageDto> {
    let receiver = parse_member_id(&receiver_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(messaging::send(db, session, receiver, &content)?.into())
}

/// Send an image, voice note, file or location with its metadata.
pub fn send_typed_message(
    state: &SharedState,
    receiver_id: String,
    message: OutgoingMessage,
) -> CommandResult<MessageDto> {
    let receiver = parse_member_id(&receiver_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(messaging::send_with(db, session, receiver, message)?.into())
}

pub fn get_messages(state: &SharedState, member_id: String) -> CommandResult<Vec<MessageDto>> {
    let other = parse_member_id(&member_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let messages = messaging::messages_between(db, session, other)?;
    Ok(messages.into_iter().map(MessageDto::from).collect())
}

pub fn mark_read(state: &SharedState, member_id: String) -> CommandResult<usize> {
    let other = parse_member_id(&member_id)?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(messaging::mark_conversation_read(db, session, other)?)
}

pub fn update_message_status(
    state: &SharedState,
    message_id: String,
    status: String,
) -> CommandResult<MessageDto> {
    let id = parse_message_id(&message_id)?;
    let status = MessageStatus::parse(status.trim()).ok_or_else(|| CommandError {
        code: "invalid_input".into(),
        message: format!("Unknown status: {status}"),
    })?;
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(messaging::update_status(db, session, id, status)?.into())
}

/// Total unread messages for the signed-in member, for a badge.
pub fn unread_count(state: &SharedState) -> CommandResult<usize> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    Ok(messaging::unread_total(db, session)?)
}

pub fn list_conversations(state: &SharedState) -> CommandResult<Vec<ConversationDto>> {
    let guard = lock(state)?;
    let (db, session) = guard.signed_in()?;
    let conversations = messaging::conversations(db, session)?;
    Ok(conversations.into_iter().map(ConversationDto::from).collect())
}
