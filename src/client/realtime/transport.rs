//! Transport Seam
//!
//! The realtime layer talks to the hosted pub/sub service through these traits.
//! [`super::pusher::PusherTransport`] is the production implementation; tests
//! provide recording fakes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

/// An event as delivered on a channel
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub channel: String,
    pub event: String,
    /// Decoded payload. Pusher sends data as a JSON string; when that string
    /// holds JSON it is parsed, otherwise it stays a `Value::String`.
    pub data: serde_json::Value,
}

type Callback = dyn Fn(&RawEvent) + Send + Sync;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque event callback with identity.
///
/// Clones share the identity of the original, so registering a clone of an
/// already registered handler is a duplicate.
#[derive(Clone)]
pub struct Handler {
    id: u64,
    callback: Arc<Callback>,
}

impl Handler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&RawEvent) + Send + Sync + 'static,
    {
        Self {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            callback: Arc::new(callback),
        }
    }

    pub fn call(&self, event: &RawEvent) {
        (self.callback)(event)
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.id).finish()
    }
}

/// Per-channel map of event name to handlers, shared by the transports
#[derive(Debug, Default)]
pub struct EventBindings {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
}

impl EventBindings {
    pub fn bind(&self, event: &str, handler: Handler) {
        let mut handlers = self.handlers.lock();
        let bound = handlers.entry(event.to_string()).or_default();
        if !bound.contains(&handler) {
            bound.push(handler);
        }
    }

    pub fn unbind(&self, event: &str, handler: Option<&Handler>) {
        let mut handlers = self.handlers.lock();
        match handler {
            Some(handler) => {
                if let Some(bound) = handlers.get_mut(event) {
                    bound.retain(|h| h != handler);
                    if bound.is_empty() {
                        handlers.remove(event);
                    }
                }
            }
            None => {
                handlers.remove(event);
            }
        }
    }

    /// Run every handler bound for `event.event`; returns how many ran.
    ///
    /// Handlers are called outside the lock so they may rebind.
    pub fn dispatch(&self, event: &RawEvent) -> usize {
        let bound: Vec<Handler> = self
            .handlers
            .lock()
            .get(&event.event)
            .cloned()
            .unwrap_or_default();
        for handler in &bound {
            handler.call(event);
        }
        bound.len()
    }

    pub fn bound_count(&self, event: &str) -> usize {
        self.handlers.lock().get(event).map(Vec::len).unwrap_or(0)
    }
}

/// Connection lifecycle, following the hosted SDK's state names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Initialized,
    Connecting,
    Connected,
    /// Temporarily unreachable; the transport keeps retrying
    Unavailable,
    /// The service refused the connection for good (bad key, app disabled)
    Failed,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("realtime transport needs a running tokio runtime")]
    NoRuntime,
    #[error("channel authorization rejected: {0}")]
    Unauthorized(String),
    #[error("channel authorization failed: {0}")]
    Authorization(String),
    #[error("realtime connection error: {0}")]
    Connection(String),
    #[error("invalid realtime frame: {0}")]
    Protocol(String),
}

/// A subscribed channel.
///
/// Binding the same handler twice for one event is a no-op.
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    fn bind(&self, event: &str, handler: Handler);

    /// Remove `handler`, or every handler when `None`
    fn unbind(&self, event: &str, handler: Option<&Handler>);
}

/// The hosted pub/sub connection
pub trait Transport: Send + Sync {
    /// Open the connection if it is not open. Idempotent; also reopens after
    /// [`Transport::disconnect`].
    fn connect(&self) -> Result<(), RealtimeError>;

    /// Create a subscription for `channel` and return its handle
    fn subscribe(&self, channel: &str) -> Result<Arc<dyn Channel>, RealtimeError>;

    /// Release the subscription for `channel`
    fn unsubscribe(&self, channel: &str);

    /// Close the connection
    fn disconnect(&self);

    fn state(&self) -> ConnectionState;

    fn watch_state(&self) -> watch::Receiver<ConnectionState>;
}
