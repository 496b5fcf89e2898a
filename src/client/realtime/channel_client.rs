//! Channel Client
//!
//! Subscription and handler bookkeeping on top of a [`Transport`].
//!
//! Two invariants are kept here regardless of what the transport does:
//!
//! - at most one subscription handle exists per channel name;
//! - every registered handler is bound on every active channel, including
//!   channels created after the handler was registered.
//!
//! Reconnects and backoff are the transport's business.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::transport::{Channel, ConnectionState, Handler, RealtimeError, Transport};
use crate::shared::event::EventKind;

#[derive(Default)]
struct Registry {
    channels: HashMap<String, Arc<dyn Channel>>,
    handlers: BTreeMap<EventKind, Vec<Handler>>,
}

/// Owner of the channel table and handler registry for a session
pub struct ChannelClient {
    transport: Arc<dyn Transport>,
    registry: Mutex<Registry>,
}

impl ChannelClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Subscribe to `channel`, or return the existing handle.
    ///
    /// A new subscription gets every registered handler attached before it is
    /// returned. The transport connection is (re)opened if needed.
    pub fn subscribe(&self, channel: &str) -> Result<Arc<dyn Channel>, RealtimeError> {
        let mut registry = self.registry.lock();
        if let Some(existing) = registry.channels.get(channel) {
            return Ok(existing.clone());
        }

        self.transport.connect()?;
        let handle = self.transport.subscribe(channel)?;
        for (kind, handlers) in &registry.handlers {
            for handler in handlers {
                handle.bind(kind.event_name(), handler.clone());
            }
        }
        registry.channels.insert(channel.to_string(), handle.clone());
        tracing::info!("[REALTIME] Subscribed to {}", channel);
        Ok(handle)
    }

    /// Drop the subscription for `channel`. No-op when not subscribed.
    pub fn unsubscribe(&self, channel: &str) {
        let mut registry = self.registry.lock();
        let Some(handle) = registry.channels.remove(channel) else {
            return;
        };
        for kind in registry.handlers.keys() {
            handle.unbind(kind.event_name(), None);
        }
        self.transport.unsubscribe(channel);
        tracing::info!("[REALTIME] Unsubscribed from {}", channel);
    }

    /// Register `handler` for `kind` and bind it on every active channel.
    ///
    /// Registering the same handler twice is a no-op.
    pub fn bind(&self, kind: EventKind, handler: Handler) {
        let mut registry = self.registry.lock();
        let handlers = registry.handlers.entry(kind.clone()).or_default();
        if handlers.contains(&handler) {
            return;
        }
        handlers.push(handler.clone());
        for channel in registry.channels.values() {
            channel.bind(kind.event_name(), handler.clone());
        }
        tracing::debug!("[REALTIME] Bound {:?} for {}", handler, kind.event_name());
    }

    /// Remove one handler, or all handlers when `handler` is `None`, for `kind`
    pub fn unbind(&self, kind: &EventKind, handler: Option<&Handler>) {
        let mut registry = self.registry.lock();
        let now_empty = match (registry.handlers.get_mut(kind), handler) {
            (None, _) => return,
            (Some(handlers), Some(handler)) => {
                let before = handlers.len();
                handlers.retain(|h| h != handler);
                if handlers.len() == before {
                    return;
                }
                handlers.is_empty()
            }
            (Some(_), None) => true,
        };
        if now_empty {
            registry.handlers.remove(kind);
        }
        for channel in registry.channels.values() {
            channel.unbind(kind.event_name(), handler);
        }
    }

    /// Unsubscribe everything and close the transport connection.
    ///
    /// Handlers stay registered and are re-attached by later subscriptions.
    pub fn disconnect(&self) {
        let names: Vec<String> = self.registry.lock().channels.keys().cloned().collect();
        for name in names {
            self.unsubscribe(&name);
        }
        self.transport.disconnect();
        tracing::info!("[REALTIME] Disconnected");
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.registry.lock().channels.contains_key(channel)
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.lock().channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn handler_count(&self, kind: &EventKind) -> usize {
        self.registry
            .lock()
            .handlers
            .get(kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.transport.watch_state()
    }
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("channels", &self.subscribed_channels())
            .field("state", &self.connection_state())
            .finish()
    }
}
