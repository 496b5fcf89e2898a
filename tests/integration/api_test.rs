//! REST client and channel authorizer against a mock HTTP server

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use souq_chat::client::realtime::{ChannelAuthorizer, HttpChannelAuthorizer, RealtimeError};
use souq_chat::client::{ApiError, ChatApi, Config, RestChatApi, SessionStore};
use souq_chat::shared::messaging::{ChatId, MessageId, SendMessageRequest, UserId};
use souq_chat::shared::AppConfig;

const TOKEN: &str = "secret-token";

fn api_for(server: &MockServer, session: SessionStore) -> RestChatApi {
    let config = Config::with_builder(AppConfig::builder().api_url(server.uri()))
        .expect("mock server url is valid");
    RestChatApi::new(config, session)
}

fn signed_in() -> SessionStore {
    let session = SessionStore::in_memory();
    session.set(TOKEN, Some(UserId(7))).unwrap();
    session
}

fn conversation_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "participant": { "id": 40 + id, "name": "سارة", "is_online": true },
        "listing": { "id": 900, "title": "شقة للإيجار" },
        "last_message": {
            "id": 3,
            "chat_id": id,
            "body": "السلام عليكم",
            "is_me": false,
            "created_at": "2026-10-16T08:00:00Z"
        },
        "unread_count": 2,
        "updated_at": "2026-10-16T08:00:00Z"
    })
}

#[tokio::test]
async fn test_list_conversations_sends_bearer_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "",
            "data": {
                "data": [conversation_json(5)],
                "current_page": 2,
                "last_page": 3
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api_for(&server, signed_in())
        .list_conversations(2)
        .await
        .expect("list");
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.next_page(), Some(3));
    let conversation = &page.data[0];
    assert_eq!(conversation.id, ChatId(5));
    assert_eq!(conversation.unread_count, 2);
    assert_eq!(conversation.last_message_text(), "السلام عليكم");
}

#[tokio::test]
async fn test_missing_token_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = api_for(&server, SessionStore::in_memory())
        .list_conversations(1)
        .await;
    assert_matches!(result, Err(ApiError::NotAuthenticated));
}

#[tokio::test]
async fn test_unauthorized_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Unauthenticated."
        })))
        .mount(&server)
        .await;

    let result = api_for(&server, signed_in()).list_conversations(1).await;
    let err = result.unwrap_err();
    assert!(err.is_auth_failure());
    assert_matches!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn test_envelope_rejection_is_application_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/5/messages"))
        .and(body_json(json!({ "body": "مرحبا" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "لا يمكنك مراسلة هذا المستخدم",
            "data": null
        })))
        .mount(&server)
        .await;

    let request = SendMessageRequest::new("مرحبا", None).unwrap();
    let err = api_for(&server, signed_in())
        .send_message(ChatId(5), &request)
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Application(ref message) if message == "لا يمكنك مراسلة هذا المستخدم");
}

#[tokio::test]
async fn test_rejection_with_empty_data_list_keeps_server_message() {
    for status in [200u16, 422] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "success": false,
                "message": "تعذر تحميل المحادثات",
                "data": []
            })))
            .mount(&server)
            .await;

        let err = api_for(&server, signed_in())
            .list_conversations(1)
            .await
            .unwrap_err();
        assert_matches!(err, ApiError::Application(ref message) if message == "تعذر تحميل المحادثات");
    }
}

#[tokio::test]
async fn test_server_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/5/messages"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = api_for(&server, signed_in())
        .list_messages(ChatId(5), 1)
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Http { status: 503, .. });
}

#[tokio::test]
async fn test_mark_seen_accepts_empty_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/5/messages/12/seen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "تم"
        })))
        .expect(1)
        .mount(&server)
        .await;

    api_for(&server, signed_in())
        .mark_seen(ChatId(5), MessageId(12))
        .await
        .expect("seen");
}

#[tokio::test]
async fn test_authorizer_posts_form_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/broadcasting/auth"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_string_contains("socket_id=123.456"))
        .and(body_string_contains("channel_name=private-user.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": "app-key:signature"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let authorizer =
        HttpChannelAuthorizer::new(format!("{}/broadcasting/auth", server.uri()), signed_in());
    let auth = authorizer
        .authorize("123.456", "private-user.7")
        .await
        .expect("authorized");
    assert_eq!(auth.auth, "app-key:signature");
    assert_eq!(auth.channel_data, None);
}

#[tokio::test]
async fn test_authorizer_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/broadcasting/auth"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let authorizer =
        HttpChannelAuthorizer::new(format!("{}/broadcasting/auth", server.uri()), signed_in());
    let err = authorizer
        .authorize("1.2", "private-user.8")
        .await
        .unwrap_err();
    assert_matches!(err, RealtimeError::Unauthorized(_));
}

#[tokio::test]
async fn test_authorizer_without_session() {
    let authorizer =
        HttpChannelAuthorizer::new("http://127.0.0.1:9/broadcasting/auth", SessionStore::in_memory());
    let err = authorizer.authorize("1.2", "private-user.8").await.unwrap_err();
    assert_matches!(err, RealtimeError::Unauthorized(_));
}
