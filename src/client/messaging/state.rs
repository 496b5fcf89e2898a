//! Messaging State
//!
//! The conversation cache owned by a mounted [`super::ConversationSync`]. The
//! UI reads it under a short lock every frame; only the sync task and the
//! sync's own operations write to it.

use std::collections::HashMap;

use crate::client::realtime::ConnectionState;
use crate::client::sync::{reconcile, SourceKind};
use crate::shared::event::PushEvent;
use crate::shared::messaging::{ChatId, Conversation, Message, MessageId};

use super::unread::UnreadSummary;

/// What a push event did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The conversation was updated and moved to the front
    Applied(ChatId),
    /// The event carried nothing new
    Duplicate,
    /// The conversation is not cached; the list must be fetched again
    RefetchRequired(ChatId),
}

/// Non-fatal notice for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

/// Cached conversations and message threads
#[derive(Debug, Clone, Default)]
pub struct ConversationCache {
    /// Most recently updated first
    conversations: Vec<Conversation>,
    /// Loaded threads, oldest message first
    messages: HashMap<ChatId, Vec<Message>>,
    /// A list fetch is in flight
    pub loading: bool,
    /// Last REST failure, cleared by the next successful fetch
    pub error: Option<String>,
    pub connection: ConnectionState,
    /// Next conversation page to request, `None` once the last page is in
    pub next_page: Option<u32>,
    /// The session was rejected; the user must sign in again
    pub auth_required: bool,
    loaded: bool,
    toasts: Vec<Toast>,
    next_toast_id: u64,
}

impl ConversationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, chat_id: ChatId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == chat_id)
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.position(chat_id).is_some()
    }

    /// Loaded thread for `chat_id`
    pub fn messages(&self, chat_id: ChatId) -> Option<&[Message]> {
        self.messages.get(&chat_id).map(Vec::as_slice)
    }

    /// Whether at least one list fetch has completed
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn unread_summary(&self) -> UnreadSummary {
        UnreadSummary::from_conversations(&self.conversations)
    }

    fn position(&self, chat_id: ChatId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == chat_id)
    }

    fn promote(&mut self, index: usize) {
        if index > 0 {
            let conversation = self.conversations.remove(index);
            self.conversations.insert(0, conversation);
        }
    }

    /// Fold a realtime event into the cache
    pub fn apply_push(&mut self, event: &PushEvent) -> PushOutcome {
        let chat_id = event.chat_id();
        let Some(index) = self.position(chat_id) else {
            return PushOutcome::RefetchRequired(chat_id);
        };
        let Some(message) = event.message() else {
            return PushOutcome::Duplicate;
        };
        if self.apply_message_at(index, message, event.event_time()) {
            PushOutcome::Applied(chat_id)
        } else {
            PushOutcome::Duplicate
        }
    }

    /// Apply a message the viewer just sent. Returns false if the
    /// conversation is not cached.
    pub fn apply_sent(&mut self, message: &Message) -> bool {
        match self.position(message.chat_id) {
            Some(index) => {
                self.apply_message_at(index, message, None);
                true
            }
            None => false,
        }
    }

    fn apply_message_at(
        &mut self,
        index: usize,
        message: &Message,
        event_time: Option<chrono::DateTime<chrono::Utc>>,
    ) -> bool {
        let chat_id = self.conversations[index].id;
        if !self.conversations[index].apply_incoming(message, event_time) {
            return false;
        }
        self.promote(index);
        if let Some(thread) = self.messages.get_mut(&chat_id) {
            if !thread.iter().any(|m| m.id == message.id) {
                thread.push(message.clone());
            }
        }
        true
    }

    /// Merge a fetched list.
    ///
    /// Each entry is reconciled against its cached copy. Cached conversations
    /// missing from the snapshot stay; the list is re-sorted by `updated_at`.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Conversation>, source: SourceKind) {
        for incoming in snapshot {
            match self.position(incoming.id) {
                Some(index) => {
                    let cached = self.conversations[index].clone();
                    self.conversations[index] = reconcile(Some(cached), incoming, source);
                }
                None => self.conversations.push(incoming),
            }
        }
        self.conversations
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.loaded = true;
        self.error = None;
    }

    /// Insert or refresh a single conversation returned by the server
    pub fn upsert(&mut self, conversation: Conversation) {
        let id = conversation.id;
        let cached = self.position(id).map(|i| self.conversations.remove(i));
        let merged = reconcile(cached, conversation, SourceKind::Refetch);
        self.conversations.insert(0, merged);
    }

    /// Replace the loaded thread for `chat_id`
    pub fn set_messages(&mut self, chat_id: ChatId, mut messages: Vec<Message>) {
        messages.sort_by(|a, b| a.timestamp().cmp(&b.timestamp()).then(a.id.cmp(&b.id)));
        messages.dedup_by_key(|m| m.id);
        self.messages.insert(chat_id, messages);
    }

    /// Incoming messages in `chat_id` the viewer has not acknowledged
    pub fn unseen_incoming(&self, chat_id: ChatId) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self
            .messages
            .get(&chat_id)
            .map(|thread| {
                thread
                    .iter()
                    .filter(|m| m.is_unread_incoming())
                    .map(|m| m.id)
                    .collect()
            })
            .unwrap_or_default();
        if ids.is_empty() {
            if let Some(last) = self
                .conversation(chat_id)
                .and_then(|c| c.last_message.as_ref())
                .filter(|m| m.is_unread_incoming())
            {
                ids.push(last.id);
            }
        }
        ids
    }

    /// Flip every message in `chat_id` to seen and zero its unread count
    pub fn mark_seen(&mut self, chat_id: ChatId) {
        if let Some(thread) = self.messages.get_mut(&chat_id) {
            for message in thread.iter_mut().filter(|m| !m.is_self) {
                message.mark_seen();
            }
        }
        if let Some(index) = self.position(chat_id) {
            self.conversations[index].mark_all_seen();
        }
    }

    /// Remember a failure without dropping loaded data
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error = Some(message.clone());
        self.push_toast(message);
    }

    pub fn push_toast(&mut self, message: impl Into<String>) {
        self.next_toast_id += 1;
        self.toasts.push(Toast {
            id: self.next_toast_id,
            message: message.into(),
        });
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn dismiss_toast(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }
}
