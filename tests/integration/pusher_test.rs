//! Pusher transport against a local websocket server speaking protocol 7

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use souq_chat::client::realtime::{
    ChannelAuth, ChannelAuthorizer, ChannelClient, ConnectionState, Handler, PusherTransport,
    RawEvent, RealtimeError,
};
use souq_chat::shared::event::EventKind;
use souq_chat::shared::AppConfig;

type ServerSocket = WebSocketStream<TcpStream>;

struct StubAuthorizer;

#[async_trait]
impl ChannelAuthorizer for StubAuthorizer {
    async fn authorize(&self, socket_id: &str, channel: &str) -> Result<ChannelAuth, RealtimeError> {
        Ok(ChannelAuth {
            auth: format!("app-key:{}:{}", socket_id, channel),
            channel_data: None,
        })
    }
}

async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn client_for(port: u16) -> ChannelClient {
    let settings = AppConfig::builder()
        .pusher_key("app-key")
        .pusher_host("127.0.0.1", port, false)
        .build()
        .unwrap()
        .realtime;
    ChannelClient::new(Arc::new(PusherTransport::new(settings, Arc::new(StubAuthorizer))))
}

async fn accept(listener: &TcpListener, socket_id: &str) -> ServerSocket {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client connected")
        .unwrap();
    let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
    let established = json!({
        "event": "pusher:connection_established",
        "data": json!({ "socket_id": socket_id, "activity_timeout": 120 }).to_string(),
    });
    socket
        .send(WsMessage::Text(established.to_string()))
        .await
        .unwrap();
    socket
}

/// Next text frame from the client, parsed
async fn next_frame(socket: &mut ServerSocket) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match socket.next().await {
                Some(Ok(WsMessage::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {:?}", other),
            }
        }
    })
    .await
    .expect("client sent a frame")
}

async fn send_event(socket: &mut ServerSocket, channel: &str, event: &str, data: Value) {
    let frame = json!({
        "event": event,
        "channel": channel,
        "data": data.to_string(),
    });
    socket.send(WsMessage::Text(frame.to_string())).await.unwrap();
}

fn forwarding_handler() -> (Handler, mpsc::UnboundedReceiver<RawEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let handler = Handler::new(move |event: &RawEvent| {
        let _ = sender.send(event.clone());
    });
    (handler, receiver)
}

async fn wait_for_state(client: &ChannelClient, expected: ConnectionState) {
    let mut state = client.watch_state();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == expected))
        .await
        .expect("state reached in time")
        .unwrap();
}

#[tokio::test]
async fn test_public_channel_subscribes_without_auth_and_receives_events() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    let (handler, mut events) = forwarding_handler();
    client.bind(EventKind::Custom("listing-updated".into()), handler);
    client.subscribe("listings").unwrap();

    let mut socket = accept(&listener, "123.456").await;
    let subscribe = next_frame(&mut socket).await;
    assert_eq!(subscribe["event"], "pusher:subscribe");
    assert_eq!(subscribe["data"]["channel"], "listings");
    assert!(subscribe["data"].get("auth").is_none());
    wait_for_state(&client, ConnectionState::Connected).await;

    send_event(&mut socket, "listings", "listing-updated", json!({ "id": 9 })).await;
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.channel, "listings");
    assert_eq!(event.data, json!({ "id": 9 }));

    client.disconnect();
}

#[tokio::test]
async fn test_private_channel_is_authorized_with_socket_id() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    let (handler, mut events) = forwarding_handler();
    client.subscribe("private-user.7").unwrap();
    client.bind(EventKind::NewMessage, handler);

    let mut socket = accept(&listener, "11.22").await;
    let subscribe = next_frame(&mut socket).await;
    assert_eq!(subscribe["data"]["channel"], "private-user.7");
    assert_eq!(subscribe["data"]["auth"], "app-key:11.22:private-user.7");

    send_event(
        &mut socket,
        "private-user.7",
        "new-message",
        json!({ "chat_id": 3, "message": null }),
    )
    .await;
    // Events for channels the client never joined are dropped
    send_event(&mut socket, "private-user.8", "new-message", json!({})).await;

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.event, "new-message");
    assert_eq!(event.data["chat_id"], 3);
    assert!(events.try_recv().is_err());

    client.disconnect();
}

#[tokio::test]
async fn test_unsubscribe_sends_frame() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    client.subscribe("listings").unwrap();

    let mut socket = accept(&listener, "1.1").await;
    assert_eq!(next_frame(&mut socket).await["event"], "pusher:subscribe");
    wait_for_state(&client, ConnectionState::Connected).await;

    client.unsubscribe("listings");
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["event"], "pusher:unsubscribe");
    assert_eq!(frame["data"]["channel"], "listings");

    client.disconnect();
}

#[tokio::test]
async fn test_server_ping_gets_pong() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    client.subscribe("listings").unwrap();

    let mut socket = accept(&listener, "1.1").await;
    next_frame(&mut socket).await;
    socket
        .send(WsMessage::Text(json!({ "event": "pusher:ping", "data": {} }).to_string()))
        .await
        .unwrap();
    assert_eq!(next_frame(&mut socket).await["event"], "pusher:pong");

    client.disconnect();
}

#[tokio::test]
async fn test_dropped_socket_reconnects_and_resubscribes() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    client.subscribe("private-user.7").unwrap();

    let mut first = accept(&listener, "1.1").await;
    assert_eq!(next_frame(&mut first).await["data"]["auth"], "app-key:1.1:private-user.7");
    wait_for_state(&client, ConnectionState::Connected).await;
    drop(first);

    wait_for_state(&client, ConnectionState::Unavailable).await;

    let mut second = accept(&listener, "2.2").await;
    let again = next_frame(&mut second).await;
    assert_eq!(again["event"], "pusher:subscribe");
    assert_eq!(again["data"]["auth"], "app-key:2.2:private-user.7");
    wait_for_state(&client, ConnectionState::Connected).await;

    client.disconnect();
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_fatal_error_code_fails_connection() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    client.subscribe("listings").unwrap();

    let mut socket = accept(&listener, "1.1").await;
    next_frame(&mut socket).await;
    let error = json!({
        "event": "pusher:error",
        "data": { "code": 4001, "message": "Application does not exist" },
    });
    socket.send(WsMessage::Text(error.to_string())).await.unwrap();

    wait_for_state(&client, ConnectionState::Failed).await;
}

#[tokio::test]
async fn test_disconnect_during_handshake_does_not_clobber_next_connection() {
    let (listener, port) = listen().await;
    let client = client_for(port);
    client.subscribe("listings").unwrap();

    // Hold the first socket before the websocket handshake completes
    let (stalled, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client connected")
        .unwrap();

    client.disconnect();
    client.subscribe("listings").unwrap();

    let mut fresh = accept(&listener, "2.2").await;
    assert_eq!(next_frame(&mut fresh).await["data"]["channel"], "listings");
    wait_for_state(&client, ConnectionState::Connected).await;

    // Let the abandoned handshake finish; the retired task must stay silent
    if let Ok(mut late) = tokio_tungstenite::accept_async(stalled).await {
        let established = json!({
            "event": "pusher:connection_established",
            "data": json!({ "socket_id": "1.1" }).to_string(),
        });
        let _ = late.send(WsMessage::Text(established.to_string())).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.connection_state(), ConnectionState::Connected);

    client.disconnect();
}
