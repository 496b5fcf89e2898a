//! In-process transport.
//!
//! Delivers events emitted locally to the handlers bound on a channel, with no
//! network involved. It records every subscription and binding so the
//! bookkeeping in [`super::ChannelClient`] can be checked from the outside.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::transport::{
    Channel, ConnectionState, EventBindings, Handler, RawEvent, RealtimeError, Transport,
};

/// A channel on the loopback transport
#[derive(Debug)]
pub struct LoopbackChannel {
    name: String,
    bindings: EventBindings,
}

impl Channel for LoopbackChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, event: &str, handler: Handler) {
        self.bindings.bind(event, handler);
    }

    fn unbind(&self, event: &str, handler: Option<&Handler>) {
        self.bindings.unbind(event, handler);
    }
}

#[derive(Default)]
struct LoopbackState {
    channels: HashMap<String, Arc<LoopbackChannel>>,
    live: HashMap<String, usize>,
    subscribe_calls: HashMap<String, usize>,
    connect_calls: usize,
}

/// [`Transport`] that never leaves the process
pub struct LoopbackTransport {
    state: Mutex<LoopbackState>,
    connection: watch::Sender<ConnectionState>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (connection, _) = watch::channel(ConnectionState::Initialized);
        Self {
            state: Mutex::new(LoopbackState::default()),
            connection,
        }
    }

    /// Deliver an event on `channel`. Returns how many handlers ran.
    pub fn emit(&self, channel: &str, event: &str, data: serde_json::Value) -> usize {
        let target = self.state.lock().channels.get(channel).cloned();
        match target {
            Some(target) => target.bindings.dispatch(&RawEvent {
                channel: channel.to_string(),
                event: event.to_string(),
                data,
            }),
            None => 0,
        }
    }

    /// Force a connection state, as a network change would
    pub fn set_state(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    /// Subscriptions currently held for `channel`
    pub fn active_subscriptions(&self, channel: &str) -> usize {
        self.state.lock().live.get(channel).copied().unwrap_or(0)
    }

    /// How often `subscribe` was called for `channel` over the transport's life
    pub fn subscribe_calls(&self, channel: &str) -> usize {
        self.state
            .lock()
            .subscribe_calls
            .get(channel)
            .copied()
            .unwrap_or(0)
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    /// Handlers bound for `event` on `channel`
    pub fn bound_count(&self, channel: &str, event: &str) -> usize {
        self.state
            .lock()
            .channels
            .get(channel)
            .map(|c| c.bindings.bound_count(event))
            .unwrap_or(0)
    }
}

impl Transport for LoopbackTransport {
    fn connect(&self) -> Result<(), RealtimeError> {
        let connected = self.connection.borrow().is_connected();
        if !connected {
            self.state.lock().connect_calls += 1;
            self.connection.send_replace(ConnectionState::Connected);
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> Result<Arc<dyn Channel>, RealtimeError> {
        let mut state = self.state.lock();
        *state.subscribe_calls.entry(channel.to_string()).or_default() += 1;
        *state.live.entry(channel.to_string()).or_default() += 1;
        let handle = Arc::new(LoopbackChannel {
            name: channel.to_string(),
            bindings: EventBindings::default(),
        });
        state.channels.insert(channel.to_string(), handle.clone());
        Ok(handle)
    }

    fn unsubscribe(&self, channel: &str) {
        let mut state = self.state.lock();
        state.channels.remove(channel);
        if let Some(count) = state.live.get_mut(channel) {
            *count = count.saturating_sub(1);
        }
    }

    fn disconnect(&self) {
        self.connection.send_replace(ConnectionState::Disconnected);
    }

    fn state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}
