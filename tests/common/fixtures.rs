//! Test fixtures

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use souq_chat::client::messaging::ConversationCache;
use souq_chat::client::realtime::LoopbackTransport;
use souq_chat::client::{ChatContext, Config, ConversationSync, SessionStore};
use souq_chat::shared::messaging::{
    ChatId, Conversation, ListingId, ListingSummary, Message, MessageBody, MessageId, Participant,
    SenderRole, UserId,
};
use souq_chat::shared::AppConfig;

use super::mock_api::MockChatApi;

/// The signed-in user in every sync test
pub const VIEWER: UserId = UserId(7);
pub const VIEWER_CHANNEL: &str = "private-user.7";

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub fn conversation(id: u64, name: &str, unread: u32, minutes: i64) -> Conversation {
    Conversation {
        id: ChatId(id),
        participant: Participant {
            id: UserId(100 + id),
            name: name.to_string(),
            avatar: None,
            is_online: false,
        },
        listing: Some(ListingSummary {
            id: ListingId(500 + id),
            title: "سيارة للبيع".to_string(),
        }),
        last_message: None,
        unread_count: unread,
        updated_at: at(minutes),
    }
}

pub fn message(id: u64, chat: u64, minutes: i64, is_self: bool) -> Message {
    Message {
        id: MessageId(id),
        chat_id: ChatId(chat),
        body: MessageBody::Structured {
            text: "هل ما زال متوفرا؟".to_string(),
        },
        attachment: None,
        seen: false,
        is_self,
        sender_role: SenderRole::User,
        created_at: at(minutes),
        sent_at: None,
    }
}

/// `new-message` data as the broadcaster sends it: a JSON-encoded string
pub fn new_message_payload(message: &Message) -> serde_json::Value {
    let payload = json!({
        "chat_id": message.chat_id,
        "message": message,
    });
    serde_json::Value::String(payload.to_string())
}

pub fn new_chat_payload(chat_id: u64, message: Option<&Message>) -> serde_json::Value {
    json!({ "chat_id": chat_id, "message": message })
}

pub struct Harness {
    pub context: ChatContext,
    pub transport: Arc<LoopbackTransport>,
    pub api: Arc<MockChatApi>,
}

/// Context over the loopback transport, signed in as [`VIEWER`]
pub fn harness(api: MockChatApi, poll_interval: Duration) -> Harness {
    let config = Config::with_builder(AppConfig::builder().poll_interval(poll_interval))
        .expect("valid test config");
    let session = SessionStore::in_memory();
    session
        .set("test-token", Some(VIEWER))
        .expect("in-memory session never fails");
    let api = Arc::new(api);
    let transport = Arc::new(LoopbackTransport::new());
    let context = ChatContext::new(config, session, api.clone(), transport.clone());
    Harness {
        context,
        transport,
        api,
    }
}

/// Wait until `condition` holds for the sync's cache
pub async fn wait_until<F>(sync: &ConversationSync, condition: F)
where
    F: Fn(&ConversationCache) -> bool,
{
    let mut changes = sync.changes();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if condition(&sync.cache()) {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    })
    .await
    .expect("cache did not reach the expected state in time");
}

pub fn order(cache: &ConversationCache) -> Vec<u64> {
    cache.conversations().iter().map(|c| c.id.0).collect()
}
