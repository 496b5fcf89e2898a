//! Conversation Data Structure
//!
//! A conversation is a thread between the viewing user and one other
//! participant, optionally about a specific listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChatId, ListingId, UserId};
use super::message::Message;

/// The other side of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_online: bool,
}

/// The listing a conversation was started from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
}

/// Represents a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: ChatId,
    pub participant: Participant,
    #[serde(default)]
    pub listing: Option<ListingSummary>,
    /// Last message in the conversation (for preview)
    #[serde(default)]
    pub last_message: Option<Message>,
    /// Number of messages the viewer has not acknowledged
    #[serde(default)]
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn display_name(&self) -> &str {
        &self.participant.name
    }

    /// Preview text of the last message, empty when there is none
    pub fn last_message_text(&self) -> &str {
        self.last_message
            .as_ref()
            .map(|m| m.preview_text())
            .unwrap_or("")
    }

    /// Fold a newly delivered message into the summary.
    ///
    /// Returns `false` without touching anything when `message` is already the
    /// last message (a redelivered event). Only messages from the other
    /// participant raise the unread count. `updated_at` never moves backwards,
    /// and a message older than the current preview does not replace it.
    pub fn apply_incoming(&mut self, message: &Message, event_time: Option<DateTime<Utc>>) -> bool {
        if self.last_message.as_ref().map(|m| m.id) == Some(message.id) {
            return false;
        }
        if message.is_unread_incoming() {
            self.unread_count = self.unread_count.saturating_add(1);
        }
        let stamp = event_time
            .map(|t| t.max(message.timestamp()))
            .unwrap_or_else(|| message.timestamp());
        self.updated_at = self.updated_at.max(stamp);
        let newer = self
            .last_message
            .as_ref()
            .map_or(true, |current| message.timestamp() >= current.timestamp());
        if newer {
            self.last_message = Some(message.clone());
        }
        true
    }

    /// Acknowledge everything: unread drops to zero and the preview is marked seen
    pub fn mark_all_seen(&mut self) {
        self.unread_count = 0;
        if let Some(last) = self.last_message.as_mut() {
            last.mark_seen();
        }
    }
}
