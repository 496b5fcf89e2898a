//! Realtime Event Types
//!
//! Event kinds the chat client binds to on its private channel, and the typed
//! payloads they carry.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::SharedError;
use super::messaging::{ChatId, Message};

/// Wire name of the "new message" event
pub const NEW_MESSAGE_EVENT: &str = "new-message";
/// Wire name of the "conversation created" event
pub const NEW_CHAT_EVENT: &str = "new-chat";

/// Kind of realtime event a handler is registered for
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    NewMessage,
    NewChat,
    /// Any other event name, bound verbatim
    Custom(String),
}

impl EventKind {
    /// Name the transport knows this event by
    pub fn event_name(&self) -> &str {
        match self {
            EventKind::NewMessage => NEW_MESSAGE_EVENT,
            EventKind::NewChat => NEW_CHAT_EVENT,
            EventKind::Custom(name) => name,
        }
    }

    /// Map a transport event name back to a kind.
    ///
    /// Broadcasters often prefix custom names with `.`; that prefix is ignored.
    pub fn from_event_name(name: &str) -> Self {
        match name.trim_start_matches('.') {
            NEW_MESSAGE_EVENT => EventKind::NewMessage,
            NEW_CHAT_EVENT => EventKind::NewChat,
            other => EventKind::Custom(other.to_string()),
        }
    }
}

/// Payload of `new-message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageEvent {
    pub chat_id: ChatId,
    pub message: Message,
    /// Server-side `updated_at` of the conversation after the message landed
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload of `new-chat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatEvent {
    pub chat_id: ChatId,
    pub message: Option<Message>,
}

/// A decoded push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    NewMessage(NewMessageEvent),
    NewChat(NewChatEvent),
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    chat_id: Option<ChatId>,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl PushEvent {
    /// Decode the data of a transport event.
    ///
    /// `data` may be the payload object itself or a JSON string holding it.
    /// Returns `Ok(None)` for event kinds this client does not interpret.
    pub fn decode(event_name: &str, data: &serde_json::Value) -> Result<Option<Self>, SharedError> {
        let kind = EventKind::from_event_name(event_name);
        if matches!(kind, EventKind::Custom(_)) {
            return Ok(None);
        }

        let raw: RawPayload = match data {
            serde_json::Value::String(text) => serde_json::from_str(text)?,
            other => serde_json::from_value(other.clone())?,
        };

        let chat_id = raw
            .chat_id
            .or_else(|| raw.message.as_ref().map(|m| m.chat_id))
            .ok_or_else(|| SharedError::event(event_name, "payload has no chat_id"))?;

        let event = match kind {
            EventKind::NewMessage => {
                let message = raw
                    .message
                    .ok_or_else(|| SharedError::event(event_name, "payload has no message"))?;
                PushEvent::NewMessage(NewMessageEvent {
                    chat_id,
                    message,
                    updated_at: raw.updated_at,
                })
            }
            EventKind::NewChat => PushEvent::NewChat(NewChatEvent {
                chat_id,
                message: raw.message,
            }),
            EventKind::Custom(_) => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            PushEvent::NewMessage(e) => e.chat_id,
            PushEvent::NewChat(e) => e.chat_id,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            PushEvent::NewMessage(e) => Some(&e.message),
            PushEvent::NewChat(e) => e.message.as_ref(),
        }
    }

    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        match self {
            PushEvent::NewMessage(e) => e.updated_at,
            PushEvent::NewChat(_) => None,
        }
    }
}
