//! Private Channel Authorization
//!
//! `private-` and `presence-` channels need a signature from the backend before
//! the realtime service accepts the subscription. The backend signs
//! `socket_id:channel_name` at its broadcasting auth endpoint, authenticated
//! with the same bearer token as the REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::transport::RealtimeError;
use crate::client::session::SessionStore;

/// Signature returned by the auth endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChannelAuth {
    pub auth: String,
    /// Member info, only present for presence channels
    #[serde(default)]
    pub channel_data: Option<String>,
}

/// Whether a channel must be authorized before subscribing
pub fn requires_auth(channel: &str) -> bool {
    channel.starts_with("private-") || channel.starts_with("presence-")
}

#[async_trait]
pub trait ChannelAuthorizer: Send + Sync {
    async fn authorize(&self, socket_id: &str, channel: &str) -> Result<ChannelAuth, RealtimeError>;
}

/// Authorizer that POSTs to the broadcasting auth endpoint
#[derive(Debug, Clone)]
pub struct HttpChannelAuthorizer {
    endpoint: String,
    session: SessionStore,
    client: Client,
}

impl HttpChannelAuthorizer {
    pub fn new(endpoint: impl Into<String>, session: SessionStore) -> Self {
        Self {
            endpoint: endpoint.into(),
            session,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChannelAuthorizer for HttpChannelAuthorizer {
    async fn authorize(&self, socket_id: &str, channel: &str) -> Result<ChannelAuth, RealtimeError> {
        let token = self
            .session
            .token()
            .ok_or_else(|| RealtimeError::Unauthorized("no session token".to_string()))?;

        tracing::debug!("[REALTIME] Authorizing {} for socket {}", channel, socket_id);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .form(&[("socket_id", socket_id), ("channel_name", channel)])
            .send()
            .await
            .map_err(|e| RealtimeError::Authorization(format!("network: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RealtimeError::Unauthorized(format!(
                "{} refused {}",
                status, channel
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(RealtimeError::Authorization(format!("{} - {}", status, body)));
        }

        response
            .json::<ChannelAuth>()
            .await
            .map_err(|e| RealtimeError::Authorization(format!("bad response: {}", e)))
    }
}
