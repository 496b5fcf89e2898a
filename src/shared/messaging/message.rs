//! Chat Message Data Structure
//!
//! Represents a message in a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChatId, ListingId, MessageId, UserId};
use crate::shared::error::SharedError;

/// Message body as sent by the backend.
///
/// Older messages carry a bare string, newer ones a `{ "text": ... }` object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageBody {
    Structured { text: String },
    Plain(String),
}

impl MessageBody {
    pub fn text(&self) -> &str {
        match self {
            MessageBody::Structured { text } => text,
            MessageBody::Plain(text) => text,
        }
    }
}

impl Default for MessageBody {
    fn default() -> Self {
        MessageBody::Plain(String::new())
    }
}

impl From<&str> for MessageBody {
    fn from(text: &str) -> Self {
        MessageBody::Plain(text.to_string())
    }
}

/// Who wrote a message, from the marketplace's point of view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// A regular buyer/seller account
    #[default]
    User,
    /// Staff or a store member replying on behalf of a store
    Member,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    /// Conversation this message belongs to
    pub chat_id: ChatId,
    #[serde(default)]
    pub body: MessageBody,
    /// Attachment URL (image or file), if any
    #[serde(default)]
    pub attachment: Option<String>,
    /// Whether the viewing user has acknowledged the message
    #[serde(default)]
    pub seen: bool,
    /// Whether the viewing user sent the message
    #[serde(default, alias = "is_me")]
    pub is_self: bool,
    #[serde(default)]
    pub sender_role: SenderRole,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Text shown for this message in previews; attachments without text get a marker
    pub fn preview_text(&self) -> &str {
        let text = self.body.text().trim();
        if text.is_empty() && self.attachment.is_some() {
            "📎"
        } else {
            text
        }
    }

    /// Whether this message counts towards the viewer's unread total
    pub fn is_unread_incoming(&self) -> bool {
        !self.seen && !self.is_self
    }

    /// Acknowledge the message. The flag never goes back to unseen.
    pub fn mark_seen(&mut self) {
        self.seen = true;
    }

    /// The moment the message entered the conversation
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.sent_at.unwrap_or(self.created_at)
    }
}

/// Request body for `POST /chats/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl SendMessageRequest {
    pub fn new(body: impl Into<String>, attachment: Option<String>) -> Result<Self, SharedError> {
        let body = body.into();
        if body.trim().is_empty() && attachment.is_none() {
            return Err(SharedError::validation(
                "body",
                "Message body cannot be empty",
            ));
        }
        Ok(Self { body, attachment })
    }
}

/// Request body for `POST /chats`: opens a conversation with its first message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateChatRequest {
    pub recipient_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<ListingId>,
    pub body: String,
}

impl CreateChatRequest {
    pub fn new(
        recipient_id: UserId,
        listing_id: Option<ListingId>,
        body: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(SharedError::validation(
                "body",
                "The first message cannot be empty",
            ));
        }
        Ok(Self {
            recipient_id,
            listing_id,
            body,
        })
    }
}
