//! Conversation Sync
//!
//! Keeps a [`ConversationCache`] live for the signed-in user while a chat view
//! is mounted:
//!
//! - fetches the conversation list on mount and after a realtime reconnect;
//! - subscribes to the user's private channel and folds `new-message` /
//!   `new-chat` pushes into the cache;
//! - polls the list on a fixed interval in case pushes were missed;
//! - exposes the REST operations a chat view performs.
//!
//! Pushes and poll results are handled by one task, one at a time. Dropping the
//! sync (or calling [`ConversationSync::unmount`]) releases its handlers,
//! subscriptions and the task.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::state::{ConversationCache, PushOutcome};
use crate::client::api::ApiError;
use crate::client::context::ChatContext;
use crate::client::realtime::{user_channel, ConnectionState, Handler, RawEvent, RealtimeError};
use crate::client::sync::SourceKind;
use crate::shared::error::SharedError;
use crate::shared::event::{EventKind, PushEvent};
use crate::shared::messaging::{
    ChatId, Conversation, CreateChatRequest, ListingId, Message, SendMessageRequest, UserId,
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Invalid(#[from] SharedError),
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
}

struct Inner {
    context: ChatContext,
    user_id: UserId,
    cache: RwLock<ConversationCache>,
    revision: watch::Sender<u64>,
}

impl Inner {
    fn update<R>(&self, f: impl FnOnce(&mut ConversationCache) -> R) -> R {
        let result = f(&mut self.cache.write());
        self.revision.send_modify(|r| *r += 1);
        result
    }

    async fn fetch_list(&self, source: SourceKind) -> Result<(), SyncError> {
        self.update(|cache| cache.loading = true);
        tracing::debug!("[SYNC] Fetching conversations ({:?})", source);

        match self.context.api.list_conversations(1).await {
            Ok(page) => {
                let next_page = page.next_page();
                self.update(|cache| {
                    let first_load = !cache.is_loaded();
                    cache.apply_snapshot(page.data, source);
                    if source != SourceKind::Poll || first_load {
                        cache.next_page = next_page;
                    }
                    cache.loading = false;
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record a REST failure. A rejected session also drops the credentials
    /// and the realtime connection.
    fn fail(&self, error: ApiError) -> SyncError {
        if error.is_auth_failure() {
            tracing::warn!("[SYNC] Session rejected for user {}, signing out", self.user_id);
            self.context.session.clear();
            self.context.channels.disconnect();
            self.update(|cache| {
                cache.auth_required = true;
                cache.loading = false;
                cache.record_error(error.to_string());
            });
        } else {
            tracing::warn!("[SYNC] Request failed: {}", error);
            self.update(|cache| {
                cache.loading = false;
                cache.record_error(error.to_string());
            });
        }
        SyncError::Api(error)
    }

    async fn handle_event(&self, raw: RawEvent) {
        let event = match PushEvent::decode(&raw.event, &raw.data) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("[SYNC] Ignoring malformed {} event: {}", raw.event, e);
                return;
            }
        };

        match self.update(|cache| cache.apply_push(&event)) {
            PushOutcome::Applied(chat_id) => {
                tracing::debug!("[SYNC] Applied {} for chat {}", raw.event, chat_id);
            }
            PushOutcome::Duplicate => {
                tracing::debug!("[SYNC] Duplicate {} for chat {}", raw.event, event.chat_id());
            }
            PushOutcome::RefetchRequired(chat_id) => {
                tracing::info!("[SYNC] Push for unknown chat {}, refetching list", chat_id);
                let _ = self.fetch_list(SourceKind::Refetch).await;
            }
        }
    }
}

async fn run(
    inner: Arc<Inner>,
    mut events: mpsc::UnboundedReceiver<RawEvent>,
    mut connection: watch::Receiver<ConnectionState>,
) {
    let _ = inner.fetch_list(SourceKind::Refetch).await;

    let period = inner.context.config.poll_interval();
    let mut poll = tokio::time::interval_at(Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut watching = true;
    let mut lost = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => inner.handle_event(event).await,
                None => break,
            },
            _ = poll.tick() => {
                if !inner.cache.read().auth_required {
                    let _ = inner.fetch_list(SourceKind::Poll).await;
                }
            }
            changed = connection.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                    continue;
                }
                let state = *connection.borrow_and_update();
                inner.update(|cache| cache.connection = state);
                if state.is_connected() {
                    if lost {
                        tracing::info!("[SYNC] Realtime connection restored, refetching");
                        lost = false;
                        let _ = inner.fetch_list(SourceKind::Refetch).await;
                    }
                } else {
                    lost = true;
                }
            }
        }
    }
    tracing::debug!("[SYNC] Event loop stopped");
}

struct Mounted {
    task: JoinHandle<()>,
    handlers: Vec<(EventKind, Handler)>,
    channels: Vec<String>,
}

/// Live conversation data for one signed-in user
pub struct ConversationSync {
    inner: Arc<Inner>,
    mounted: Mutex<Option<Mounted>>,
}

impl ConversationSync {
    /// Subscribe to the user's channel and start the sync task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(context: &ChatContext, user_id: UserId) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RealtimeError::NoRuntime)?;
        let channel = user_channel(user_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        let handlers: Vec<(EventKind, Handler)> = [EventKind::NewMessage, EventKind::NewChat]
            .into_iter()
            .map(|kind| {
                let sender = sender.clone();
                let name = channel.clone();
                let handler = Handler::new(move |event: &RawEvent| {
                    if event.channel == name {
                        let _ = sender.send(event.clone());
                    }
                });
                (kind, handler)
            })
            .collect();

        for (kind, handler) in &handlers {
            context.channels.bind(kind.clone(), handler.clone());
        }
        if let Err(e) = context.channels.subscribe(&channel) {
            for (kind, handler) in &handlers {
                context.channels.unbind(kind, Some(handler));
            }
            return Err(e.into());
        }

        let connection = context.channels.watch_state();
        let mut cache = ConversationCache::new();
        cache.connection = *connection.borrow();
        cache.loading = true;
        let (revision, _) = watch::channel(0);

        let inner = Arc::new(Inner {
            context: context.clone(),
            user_id,
            cache: RwLock::new(cache),
            revision,
        });
        let task = runtime.spawn(run(inner.clone(), receiver, connection));
        tracing::info!("[SYNC] Mounted for user {} on {}", user_id, channel);

        Ok(Self {
            inner,
            mounted: Mutex::new(Some(Mounted {
                task,
                handlers,
                channels: vec![channel],
            })),
        })
    }

    /// Release handlers and subscriptions and stop the task. Idempotent.
    pub fn unmount(&self) {
        let Some(mounted) = self.mounted.lock().take() else {
            return;
        };
        let channels = &self.inner.context.channels;
        for (kind, handler) in &mounted.handlers {
            channels.unbind(kind, Some(handler));
        }
        for channel in &mounted.channels {
            channels.unsubscribe(channel);
        }
        mounted.task.abort();
        tracing::info!("[SYNC] Unmounted for user {}", self.inner.user_id);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.lock().is_some()
    }

    pub fn user_id(&self) -> UserId {
        self.inner.user_id
    }

    /// Read access to the cache. Keep the guard short-lived.
    pub fn cache(&self) -> RwLockReadGuard<'_, ConversationCache> {
        self.inner.cache.read()
    }

    /// Receiver that changes whenever the cache does
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn dismiss_toast(&self, id: u64) {
        self.inner.update(|cache| cache.dismiss_toast(id));
    }

    /// Fetch the list again, as on mount
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.inner.fetch_list(SourceKind::Refetch).await
    }

    /// Run the safety-net poll now
    pub async fn poll_now(&self) -> Result<(), SyncError> {
        self.inner.fetch_list(SourceKind::Poll).await
    }

    /// Fetch the next page of conversations. Returns false when there is none.
    pub async fn load_more(&self) -> Result<bool, SyncError> {
        let Some(page) = self.inner.cache.read().next_page else {
            return Ok(false);
        };
        match self.inner.context.api.list_conversations(page).await {
            Ok(result) => {
                let next_page = result.next_page();
                self.inner.update(|cache| {
                    cache.apply_snapshot(result.data, SourceKind::Refetch);
                    cache.next_page = next_page;
                });
                Ok(true)
            }
            Err(e) => Err(self.inner.fail(e)),
        }
    }

    /// Load the message thread of `chat_id`
    pub async fn open_conversation(&self, chat_id: ChatId) -> Result<(), SyncError> {
        match self.inner.context.api.list_messages(chat_id, 1).await {
            Ok(page) => {
                self.inner.update(|cache| cache.set_messages(chat_id, page.data));
                Ok(())
            }
            Err(e) => Err(self.inner.fail(e)),
        }
    }

    /// Acknowledge the unseen incoming messages of `chat_id`
    pub async fn mark_seen(&self, chat_id: ChatId) -> Result<(), SyncError> {
        let (pending, unread) = {
            let cache = self.inner.cache.read();
            let unread = cache.conversation(chat_id).map(|c| c.unread_count).unwrap_or(0);
            (cache.unseen_incoming(chat_id), unread)
        };
        if pending.is_empty() && unread == 0 {
            return Ok(());
        }

        for message_id in pending {
            if let Err(e) = self.inner.context.api.mark_seen(chat_id, message_id).await {
                return Err(self.inner.fail(e));
            }
        }
        self.inner.update(|cache| cache.mark_seen(chat_id));
        tracing::debug!("[SYNC] Marked chat {} as seen", chat_id);
        Ok(())
    }

    /// Post a message to an existing conversation
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        body: impl Into<String>,
        attachment: Option<String>,
    ) -> Result<Message, SyncError> {
        let request = SendMessageRequest::new(body, attachment)?;
        let mut message = match self.inner.context.api.send_message(chat_id, &request).await {
            Ok(message) => message,
            Err(e) => return Err(self.inner.fail(e)),
        };
        message.is_self = true;

        let known = self.inner.update(|cache| cache.apply_sent(&message));
        if !known {
            self.inner.fetch_list(SourceKind::Refetch).await?;
        }
        Ok(message)
    }

    /// Open a conversation with `recipient`, optionally about a listing
    pub async fn start_conversation(
        &self,
        recipient: UserId,
        listing: Option<ListingId>,
        body: impl Into<String>,
    ) -> Result<Conversation, SyncError> {
        let request = CreateChatRequest::new(recipient, listing, body)?;
        match self.inner.context.api.create_chat(&request).await {
            Ok(conversation) => {
                tracing::info!("[SYNC] Started chat {} with user {}", conversation.id, recipient);
                self.inner.update(|cache| cache.upsert(conversation.clone()));
                Ok(conversation)
            }
            Err(e) => Err(self.inner.fail(e)),
        }
    }
}

impl Drop for ConversationSync {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for ConversationSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSync")
            .field("user_id", &self.inner.user_id)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
