//! Scripted chat API
//!
//! Serves a server-side conversation list held in memory, counts calls and can
//! be told to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use souq_chat::client::{ApiError, ChatApi};
use souq_chat::shared::messaging::{
    ChatId, Conversation, CreateChatRequest, Message, MessageBody, MessageId, Participant,
    SendMessageRequest,
};
use souq_chat::shared::Page;

use super::fixtures::at;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    Server,
}

impl Failure {
    fn error(self) -> ApiError {
        match self {
            Failure::Unauthorized => ApiError::Unauthorized,
            Failure::Server => ApiError::Http {
                status: 500,
                body: "Internal Server Error".to_string(),
            },
        }
    }
}

pub struct MockChatApi {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<HashMap<ChatId, Vec<Message>>>,
    page_size: Mutex<usize>,
    failure: Mutex<Option<Failure>>,
    list_calls: AtomicUsize,
    pages_requested: Mutex<Vec<u32>>,
    seen: Mutex<Vec<(ChatId, MessageId)>>,
    next_message_id: AtomicU64,
}

impl MockChatApi {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            messages: Mutex::new(HashMap::new()),
            page_size: Mutex::new(usize::MAX),
            failure: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            pages_requested: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(9000),
        }
    }

    pub fn with_page_size(self, size: usize) -> Self {
        *self.page_size.lock() = size;
        self
    }

    pub fn with_messages(self, chat_id: ChatId, messages: Vec<Message>) -> Self {
        self.messages.lock().insert(chat_id, messages);
        self
    }

    /// Replace the server-side list
    pub fn set_conversations(&self, conversations: Vec<Conversation>) {
        *self.conversations.lock() = conversations;
    }

    /// Fail every call until cleared with `None`
    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock() = failure;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.pages_requested.lock().clone()
    }

    pub fn seen_calls(&self) -> Vec<(ChatId, MessageId)> {
        self.seen.lock().clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        match *self.failure.lock() {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn list_conversations(&self, page: u32) -> Result<Page<Conversation>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pages_requested.lock().push(page);
        self.check()?;

        let all = self.conversations.lock().clone();
        let size = *self.page_size.lock();
        let last_page = if all.is_empty() || size == usize::MAX {
            1
        } else {
            all.len().div_ceil(size) as u32
        };
        let data = all
            .into_iter()
            .skip((page.saturating_sub(1) as usize).saturating_mul(size))
            .take(size)
            .collect();
        Ok(Page {
            data,
            current_page: page,
            last_page,
        })
    }

    async fn list_messages(&self, chat_id: ChatId, _page: u32) -> Result<Page<Message>, ApiError> {
        self.check()?;
        let data = self.messages.lock().get(&chat_id).cloned().unwrap_or_default();
        Ok(Page::single(data))
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Conversation, ApiError> {
        self.check()?;
        let chat_id = ChatId(request.recipient_id.0 + 1000);
        let first = Message {
            id: MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
            chat_id,
            body: MessageBody::Plain(request.body.clone()),
            attachment: None,
            seen: false,
            is_self: true,
            sender_role: Default::default(),
            created_at: at(60),
            sent_at: None,
        };
        let conversation = Conversation {
            id: chat_id,
            participant: Participant {
                id: request.recipient_id,
                name: "بائع".to_string(),
                avatar: None,
                is_online: true,
            },
            listing: None,
            last_message: Some(first),
            unread_count: 0,
            updated_at: at(60),
        };
        self.conversations.lock().push(conversation.clone());
        Ok(conversation)
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        request: &SendMessageRequest,
    ) -> Result<Message, ApiError> {
        self.check()?;
        Ok(Message {
            id: MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
            chat_id,
            body: MessageBody::Structured {
                text: request.body.clone(),
            },
            attachment: request.attachment.clone(),
            seen: false,
            // The server reports ownership relative to the viewer
            is_self: false,
            sender_role: Default::default(),
            created_at: at(90),
            sent_at: Some(at(90)),
        })
    }

    async fn mark_seen(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), ApiError> {
        self.check()?;
        self.seen.lock().push((chat_id, message_id));
        Ok(())
    }
}
