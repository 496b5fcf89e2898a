//! Realtime channel layer: transports, channel authorization and the
//! subscription bookkeeping shared by every view.

pub mod auth;
pub mod channel_client;
pub mod loopback;
pub mod pusher;
pub mod transport;

pub use auth::{requires_auth, ChannelAuth, ChannelAuthorizer, HttpChannelAuthorizer};
pub use channel_client::ChannelClient;
pub use loopback::LoopbackTransport;
pub use pusher::PusherTransport;
pub use transport::{Channel, ConnectionState, Handler, RawEvent, RealtimeError, Transport};

/// Private channel carrying a user's chat events
pub fn user_channel(user_id: crate::shared::messaging::UserId) -> String {
    format!("private-user.{}", user_id)
}
