//! Chat REST API Client
//!
//! Typed access to the `/chats` endpoints. Every call sends the bearer token
//! from the [`SessionStore`] and unwraps the `{success, message, data}`
//! envelope.
//!
//! The [`ChatApi`] trait is the seam the conversation sync drives, so tests
//! can substitute a scripted implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::client::config::Config;
use crate::client::session::SessionStore;
use crate::shared::envelope::{ApiEnvelope, EnvelopeFailure, Page};
use crate::shared::messaging::{
    ChatId, Conversation, CreateChatRequest, Message, MessageId, SendMessageRequest,
};

/// REST failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// No token in the session store; the request was not sent
    #[error("Not authenticated")]
    NotAuthenticated,
    /// The server rejected the token (HTTP 401)
    #[error("Session expired, please sign in again")]
    Unauthorized,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request failed: {status} - {body}")]
    Http { status: u16, body: String },
    /// The envelope said `success: false`
    #[error("{0}")]
    Application(String),
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the caller should drop its credentials and ask for a new sign-in
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated | ApiError::Unauthorized)
    }
}

/// Operations on conversations and messages
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chats?page=N`
    async fn list_conversations(&self, page: u32) -> Result<Page<Conversation>, ApiError>;

    /// `GET /chats/{id}/messages?page=N`
    async fn list_messages(&self, chat_id: ChatId, page: u32) -> Result<Page<Message>, ApiError>;

    /// `POST /chats`: create a conversation together with its first message
    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Conversation, ApiError>;

    /// `POST /chats/{id}/messages`
    async fn send_message(
        &self,
        chat_id: ChatId,
        request: &SendMessageRequest,
    ) -> Result<Message, ApiError>;

    /// `POST /chats/{id}/messages/{id}/seen`
    async fn mark_seen(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), ApiError>;
}

/// [`ChatApi`] over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct RestChatApi {
    config: Config,
    session: SessionStore,
    client: Client,
}

impl RestChatApi {
    pub fn new(config: Config, session: SessionStore) -> Self {
        Self {
            config,
            session,
            client: Client::new(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.session.token().ok_or(ApiError::NotAuthenticated)?;
        Ok(request
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<(StatusCode, String), ApiError> {
        let response = self.authorized(request)?.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("[API] Token rejected by server");
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let (status, body) = self.send_raw(request).await?;
        parse_envelope::<T>(status, &body)?
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))
    }

    /// Like [`Self::execute`] for endpoints whose `data` carries nothing we need
    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let (status, body) = self.send_raw(request).await?;
        parse_envelope::<serde_json::Value>(status, &body).map(|_| ())
    }
}

/// Interpret a response body, yielding its `data` if there is any.
///
/// `success` is read before `data` is decoded, so `success: false` reaches the
/// caller as [`ApiError::Application`] whatever the HTTP status and whatever
/// shape the failure's `data` has.
fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    let envelope = match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: body.to_string(),
            })
        }
        Err(e) => return Err(ApiError::Decode(e.to_string())),
    };

    if envelope.success && !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    match envelope.into_result() {
        Ok(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string())),
        Err(EnvelopeFailure::MissingData) => Ok(None),
        Err(EnvelopeFailure::Rejected(message)) => Err(ApiError::Application(message)),
    }
}

#[async_trait]
impl ChatApi for RestChatApi {
    async fn list_conversations(&self, page: u32) -> Result<Page<Conversation>, ApiError> {
        let url = self.config.api_url("/chats");
        tracing::debug!("[API] GET {} page={}", url, page);
        self.execute(self.client.get(&url).query(&[("page", page)]))
            .await
    }

    async fn list_messages(&self, chat_id: ChatId, page: u32) -> Result<Page<Message>, ApiError> {
        let url = self.config.api_url(&format!("/chats/{}/messages", chat_id));
        tracing::debug!("[API] GET {} page={}", url, page);
        self.execute(self.client.get(&url).query(&[("page", page)]))
            .await
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Conversation, ApiError> {
        let url = self.config.api_url("/chats");
        tracing::debug!("[API] POST {} recipient={}", url, request.recipient_id);
        self.execute(self.client.post(&url).json(request)).await
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        request: &SendMessageRequest,
    ) -> Result<Message, ApiError> {
        let url = self.config.api_url(&format!("/chats/{}/messages", chat_id));
        tracing::debug!("[API] POST {}", url);
        self.execute(self.client.post(&url).json(request)).await
    }

    async fn mark_seen(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), ApiError> {
        let url = self
            .config
            .api_url(&format!("/chats/{}/messages/{}/seen", chat_id, message_id));
        tracing::debug!("[API] POST {}", url);
        self.execute_unit(self.client.post(&url)).await
    }
}
