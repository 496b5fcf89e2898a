//! Pusher Protocol Transport
//!
//! Speaks protocol 7 of the hosted pub/sub service over a websocket. One
//! background task owns the socket; the [`Transport`] methods talk to it over a
//! command channel, so they stay synchronous and can be called from UI code.
//!
//! The task reconnects on its own. The channel table lives outside the task and
//! is replayed after every `pusher:connection_established`, private channels
//! being authorized again against the new socket id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::handshake::client::Response as HandshakeResponse;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::auth::{requires_auth, ChannelAuth, ChannelAuthorizer};
use super::transport::{
    Channel, ConnectionState, EventBindings, Handler, RawEvent, RealtimeError, Transport,
};
use crate::shared::config::RealtimeSettings;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
/// Used until the server announces its own activity timeout
const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_secs(120);
const PONG_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A channel on the Pusher connection
#[derive(Debug)]
pub struct PusherChannel {
    name: String,
    bindings: EventBindings,
}

impl Channel for PusherChannel {
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

#[derive(Debug)]
enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Shutdown,
}

struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// State shared between the transport handle and its connection tasks.
///
/// Every spawned task gets a generation number. Only the task of the current
/// generation may publish state or dispatch events, so a task left over from
/// before a `disconnect()` cannot overwrite its successor.
struct Shared {
    channels: Mutex<HashMap<String, Arc<PusherChannel>>>,
    state: watch::Sender<ConnectionState>,
    generation: Mutex<u64>,
}

impl Shared {
    /// Start a new generation, retiring whichever task owned the previous one
    fn next_generation(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.generation.lock() == generation
    }

    /// Publish `state` if `generation` is still current. Returns false otherwise.
    fn set_state(&self, generation: u64, state: ConnectionState) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            tracing::debug!(
                "[REALTIME] Ignoring {:?} from retired connection {}",
                state,
                generation
            );
            return false;
        }
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("[REALTIME] Connection {:?} -> {:?}", previous, state);
        }
        true
    }

    fn channel_names(&self) -> Vec<String> {
        self.channels.lock().keys().cloned().collect()
    }

    fn dispatch(&self, generation: u64, event: RawEvent) {
        if !self.is_current(generation) {
            return;
        }
        let target = self.channels.lock().get(&event.channel).cloned();
        match target {
            Some(channel) => {
                let handled = channel.bindings.dispatch(&event);
                tracing::debug!(
                    "[REALTIME] {} on {} -> {} handler(s)",
                    event.event,
                    event.channel,
                    handled
                );
            }
            None => tracing::debug!(
                "[REALTIME] Dropping {} for unknown channel {}",
                event.event,
                event.channel
            ),
        }
    }
}

/// [`Transport`] for the hosted Pusher-compatible service
pub struct PusherTransport {
    settings: RealtimeSettings,
    authorizer: Arc<dyn ChannelAuthorizer>,
    shared: Arc<Shared>,
    connection: Mutex<Option<Connection>>,
}

impl PusherTransport {
    pub fn new(settings: RealtimeSettings, authorizer: Arc<dyn ChannelAuthorizer>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Initialized);
        Self {
            settings,
            authorizer,
            shared: Arc::new(Shared {
                channels: Mutex::new(HashMap::new()),
                state,
                generation: Mutex::new(0),
            }),
            connection: Mutex::new(None),
        }
    }

    fn send(&self, command: Command) {
        if let Some(connection) = self.connection.lock().as_ref() {
            // A closed receiver means the task already stopped; the next
            // connect() spawns a fresh one that replays the channel table.
            let _ = connection.commands.send(command);
        }
    }
}

impl Transport for PusherTransport {
    fn connect(&self) -> Result<(), RealtimeError> {
        let mut connection = self.connection.lock();
        if let Some(existing) = connection.as_ref() {
            if !existing.task.is_finished() {
                return Ok(());
            }
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RealtimeError::NoRuntime)?;
        let (commands, receiver) = mpsc::unbounded_channel();
        let generation = self.shared.next_generation();
        let task = runtime.spawn(run_connection(
            generation,
            self.settings.socket_url(),
            self.authorizer.clone(),
            self.shared.clone(),
            receiver,
        ));
        *connection = Some(Connection { commands, task });
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> Result<Arc<dyn Channel>, RealtimeError> {
        let handle = Arc::new(PusherChannel {
            name: channel.to_string(),
            bindings: EventBindings::default(),
        });
        self.shared
            .channels
            .lock()
            .insert(channel.to_string(), handle.clone());
        self.send(Command::Subscribe(channel.to_string()));
        Ok(handle)
    }

    fn unsubscribe(&self, channel: &str) {
        if self.shared.channels.lock().remove(channel).is_some() {
            self.send(Command::Unsubscribe(channel.to_string()));
        }
    }

    fn disconnect(&self) {
        if let Some(connection) = self.connection.lock().take() {
            let _ = connection.commands.send(Command::Shutdown);
        }
        let generation = self.shared.next_generation();
        self.shared.set_state(generation, ConnectionState::Disconnected);
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }
}

impl Drop for PusherTransport {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            let _ = connection.commands.send(Command::Shutdown);
        }
    }
}

/// How a socket session ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    /// Refused for good; do not retry
    Fatal(String),
    ReconnectNow,
    Lost,
}

async fn run_connection(
    generation: u64,
    url: String,
    authorizer: Arc<dyn ChannelAuthorizer>,
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY;

    loop {
        if !shared.set_state(generation, ConnectionState::Connecting) {
            return;
        }
        tracing::info!("[REALTIME] Connecting to {}", url);

        let outcome = match connect_or_shutdown(&url, &mut commands).await {
            None => SessionEnd::Shutdown,
            Some(Ok(_)) if !shared.is_current(generation) => SessionEnd::Shutdown,
            Some(Ok((socket, _))) => {
                run_session(
                    generation,
                    socket,
                    &authorizer,
                    &shared,
                    &mut commands,
                    &mut reconnect_delay,
                )
                .await
            }
            Some(Err(e)) => {
                tracing::warn!("[REALTIME] Connection failed (will retry): {}", e);
                SessionEnd::Lost
            }
        };

        match outcome {
            SessionEnd::Shutdown => {
                shared.set_state(generation, ConnectionState::Disconnected);
                tracing::info!("[REALTIME] Connection closed");
                return;
            }
            SessionEnd::Fatal(reason) => {
                tracing::error!("[REALTIME] Connection refused: {}", reason);
                shared.set_state(generation, ConnectionState::Failed);
                return;
            }
            SessionEnd::ReconnectNow => continue,
            SessionEnd::Lost => {
                if !shared.set_state(generation, ConnectionState::Unavailable) {
                    return;
                }
                tracing::info!("[REALTIME] Reconnecting in {:?}", reconnect_delay);
                if !wait_for_retry(reconnect_delay, &mut commands).await {
                    shared.set_state(generation, ConnectionState::Disconnected);
                    return;
                }
                reconnect_delay = std::cmp::min(reconnect_delay * 2, MAX_RECONNECT_DELAY);
            }
        }
    }
}

/// Open the socket unless shut down first. Returns `None` on shutdown.
///
/// Subscribe commands arriving during the handshake are dropped; the channel
/// table is replayed once the server confirms the connection.
async fn connect_or_shutdown(
    url: &str,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Option<Result<(Socket, HandshakeResponse), tungstenite::Error>> {
    let connecting = tokio_tungstenite::connect_async(url);
    tokio::pin!(connecting);
    loop {
        tokio::select! {
            result = &mut connecting => return Some(result),
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => return None,
                Some(_) => continue,
            },
        }
    }
}

/// Sleep for `delay` unless shut down first. Returns false on shutdown.
///
/// Subscribe commands arriving meanwhile are dropped; the channel table is
/// replayed once the socket is back.
async fn wait_for_retry(delay: Duration, commands: &mut mpsc::UnboundedReceiver<Command>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => return false,
                Some(_) => continue,
            },
        }
    }
}

async fn run_session<S>(
    generation: u64,
    socket: S,
    authorizer: &Arc<dyn ChannelAuthorizer>,
    shared: &Shared,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    reconnect_delay: &mut Duration,
) -> SessionEnd
where
    S: futures_util::Stream<Item = Result<WsMessage, tungstenite::Error>>
        + Sink<WsMessage, Error = tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = socket.split();
    let mut socket_id: Option<String> = None;
    // Channels a subscribe frame went out for on this socket
    let mut sent: HashSet<String> = HashSet::new();
    let mut activity_timeout = DEFAULT_ACTIVITY_TIMEOUT;
    let mut awaiting_pong = false;
    let idle = tokio::time::sleep(activity_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                Some(Command::Subscribe(channel)) => {
                    if let Some(id) = socket_id.as_deref() {
                        if sent.insert(channel.clone())
                            && !send_subscribe(&mut sink, authorizer, id, &channel).await
                        {
                            return SessionEnd::Lost;
                        }
                    }
                }
                Some(Command::Unsubscribe(channel)) => {
                    if sent.remove(&channel) && !send_text(&mut sink, unsubscribe_frame(&channel)).await {
                        return SessionEnd::Lost;
                    }
                }
            },
            frame = stream.next() => {
                awaiting_pong = false;
                idle.as_mut().reset(Instant::now() + activity_timeout);

                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Ping(payload))) => {
                        if !send_message(&mut sink, WsMessage::Pong(payload)).await {
                            return SessionEnd::Lost;
                        }
                        continue;
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        tracing::warn!("[REALTIME] Server closed the socket: {:?}", frame);
                        return SessionEnd::Lost;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("[REALTIME] Socket error: {}", e);
                        return SessionEnd::Lost;
                    }
                    None => {
                        tracing::warn!("[REALTIME] Socket stream ended");
                        return SessionEnd::Lost;
                    }
                };

                match parse_frame(&text) {
                    Ok(Incoming::Established { socket_id: id, activity_timeout: timeout }) => {
                        tracing::info!("[REALTIME] Connected, socket {}", id);
                        if !shared.set_state(generation, ConnectionState::Connected) {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            return SessionEnd::Shutdown;
                        }
                        if let Some(timeout) = timeout {
                            activity_timeout = timeout;
                            idle.as_mut().reset(Instant::now() + activity_timeout);
                        }
                        *reconnect_delay = INITIAL_RECONNECT_DELAY;
                        sent.clear();
                        for channel in shared.channel_names() {
                            if !send_subscribe(&mut sink, authorizer, &id, &channel).await {
                                return SessionEnd::Lost;
                            }
                            sent.insert(channel);
                        }
                        socket_id = Some(id);
                    }
                    Ok(Incoming::Ping) => {
                        if !send_text(&mut sink, pong_frame()).await {
                            return SessionEnd::Lost;
                        }
                    }
                    Ok(Incoming::Pong) => {}
                    Ok(Incoming::Error { code, message }) => {
                        tracing::warn!("[REALTIME] Server error {:?}: {}", code, message);
                        match error_action(code) {
                            None => {}
                            Some(end @ SessionEnd::Fatal(_)) => return end,
                            Some(end) => {
                                let _ = sink.send(WsMessage::Close(None)).await;
                                return end;
                            }
                        }
                    }
                    Ok(Incoming::Subscribed { channel }) => {
                        tracing::info!("[REALTIME] Subscription confirmed for {}", channel);
                    }
                    Ok(Incoming::SubscriptionError { channel, status }) => {
                        tracing::error!(
                            "[REALTIME] Subscription to {} rejected (status {:?})",
                            channel,
                            status
                        );
                    }
                    Ok(Incoming::Event(event)) => shared.dispatch(generation, event),
                    Ok(Incoming::Ignored(name)) => {
                        tracing::trace!("[REALTIME] Ignoring {}", name);
                    }
                    Err(e) => tracing::warn!("[REALTIME] {}", e),
                }
            }
            _ = &mut idle => {
                if awaiting_pong {
                    tracing::warn!("[REALTIME] No pong from server, dropping socket");
                    return SessionEnd::Lost;
                }
                if !send_text(&mut sink, ping_frame()).await {
                    return SessionEnd::Lost;
                }
                awaiting_pong = true;
                idle.as_mut().reset(Instant::now() + PONG_TIMEOUT);
            }
        }
    }
}

async fn send_subscribe<Si>(
    sink: &mut Si,
    authorizer: &Arc<dyn ChannelAuthorizer>,
    socket_id: &str,
    channel: &str,
) -> bool
where
    Si: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    let auth = if requires_auth(channel) {
        match authorizer.authorize(socket_id, channel).await {
            Ok(auth) => Some(auth),
            Err(e) => {
                // The socket is fine; only this channel stays silent.
                tracing::error!("[REALTIME] Could not authorize {}: {}", channel, e);
                return true;
            }
        }
    } else {
        None
    };
    send_text(sink, subscribe_frame(channel, auth.as_ref())).await
}

async fn send_text<Si>(sink: &mut Si, text: String) -> bool
where
    Si: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    send_message(sink, WsMessage::Text(text)).await
}

async fn send_message<Si>(sink: &mut Si, message: WsMessage) -> bool
where
    Si: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    match sink.send(message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("[REALTIME] Send failed: {}", e);
            false
        }
    }
}

// Wire format

#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct EstablishedData {
    socket_id: String,
    #[serde(default)]
    activity_timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorData {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Incoming {
    Established {
        socket_id: String,
        activity_timeout: Option<Duration>,
    },
    Ping,
    Pong,
    Error {
        code: Option<u16>,
        message: String,
    },
    Subscribed {
        channel: String,
    },
    SubscriptionError {
        channel: String,
        status: Option<u16>,
    },
    Event(RawEvent),
    Ignored(String),
}

/// `data` arrives JSON-encoded inside a string; unwrap it when it parses
fn decode_data(data: Value) -> Value {
    match data {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

fn parse_frame(text: &str) -> Result<Incoming, RealtimeError> {
    let frame: Frame = serde_json::from_str(text)
        .map_err(|e| RealtimeError::Protocol(format!("{}: {}", e, text)))?;
    let data = decode_data(frame.data);

    let incoming = match frame.event.as_str() {
        "pusher:connection_established" => {
            let established: EstablishedData = serde_json::from_value(data)
                .map_err(|e| RealtimeError::Protocol(format!("connection_established: {}", e)))?;
            Incoming::Established {
                socket_id: established.socket_id,
                activity_timeout: established.activity_timeout.map(Duration::from_secs),
            }
        }
        "pusher:ping" => Incoming::Ping,
        "pusher:pong" => Incoming::Pong,
        "pusher:error" => {
            let error: ErrorData = serde_json::from_value(data).unwrap_or_default();
            Incoming::Error {
                code: error.code,
                message: error.message.unwrap_or_default(),
            }
        }
        "pusher_internal:subscription_succeeded" => Incoming::Subscribed {
            channel: frame.channel.unwrap_or_default(),
        },
        "pusher:subscription_error" => Incoming::SubscriptionError {
            channel: frame.channel.unwrap_or_default(),
            status: data
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok()),
        },
        name if name.starts_with("pusher:") || name.starts_with("pusher_internal:") => {
            Incoming::Ignored(frame.event)
        }
        _ => match frame.channel {
            Some(channel) => Incoming::Event(RawEvent {
                channel,
                event: frame.event,
                data,
            }),
            None => Incoming::Ignored(frame.event),
        },
    };
    Ok(incoming)
}

/// Map a `pusher:error` code to what the connection should do.
///
/// `None` keeps the socket open.
fn error_action(code: Option<u16>) -> Option<SessionEnd> {
    let code = code?;
    match code {
        4000..=4099 => Some(SessionEnd::Fatal(format!("error code {}", code))),
        4100..=4199 => Some(SessionEnd::Lost),
        4200..=4299 => Some(SessionEnd::ReconnectNow),
        _ => None,
    }
}

fn subscribe_frame(channel: &str, auth: Option<&ChannelAuth>) -> String {
    let mut data = json!({ "channel": channel });
    if let Some(auth) = auth {
        data["auth"] = Value::String(auth.auth.clone());
        if let Some(channel_data) = &auth.channel_data {
            data["channel_data"] = Value::String(channel_data.clone());
        }
    }
    json!({ "event": "pusher:subscribe", "data": data }).to_string()
}

fn unsubscribe_frame(channel: &str) -> String {
    json!({ "event": "pusher:unsubscribe", "data": { "channel": channel } }).to_string()
}

fn ping_frame() -> String {
    json!({ "event": "pusher:ping", "data": {} }).to_string()
}

fn pong_frame() -> String {
    json!({ "event": "pusher:pong", "data": {} }).to_string()
}
