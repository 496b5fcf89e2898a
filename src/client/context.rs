//! Chat Context
//!
//! Everything a mounted chat view needs, owned by the application root and
//! handed down explicitly. One context means one realtime connection and one
//! channel table for the whole session.

use std::sync::Arc;

use crate::client::api::{ChatApi, RestChatApi};
use crate::client::config::Config;
use crate::client::realtime::{ChannelClient, HttpChannelAuthorizer, PusherTransport, Transport};
use crate::client::session::SessionStore;

#[derive(Clone)]
pub struct ChatContext {
    pub config: Config,
    pub session: SessionStore,
    pub api: Arc<dyn ChatApi>,
    pub channels: Arc<ChannelClient>,
}

impl ChatContext {
    pub fn new(
        config: Config,
        session: SessionStore,
        api: Arc<dyn ChatApi>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            session,
            api,
            channels: Arc::new(ChannelClient::new(transport)),
        }
    }

    /// Production wiring: REST over reqwest, Pusher over websocket
    pub fn connect(config: Config, session: SessionStore) -> Self {
        let api = Arc::new(RestChatApi::new(config.clone(), session.clone()));
        let authorizer = Arc::new(HttpChannelAuthorizer::new(
            config.auth_endpoint(),
            session.clone(),
        ));
        let transport = Arc::new(PusherTransport::new(config.realtime().clone(), authorizer));
        Self::new(config, session, api, transport)
    }
}

impl std::fmt::Debug for ChatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatContext")
            .field("config", &self.config)
            .field("authenticated", &self.session.is_authenticated())
            .field("channels", &self.channels)
            .finish()
    }
}
