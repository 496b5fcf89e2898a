//! Client Module
//!
//! Everything that runs on the user's machine: configuration, session, REST
//! client, realtime layer, conversation sync and the egui chat panel.

pub mod api;
pub mod config;
pub mod context;
pub mod messaging;
pub mod realtime;
pub mod session;
pub mod sync;
pub mod theme;

pub use api::{ApiError, ChatApi, RestChatApi};
pub use config::Config;
pub use context::ChatContext;
pub use messaging::{ConversationSync, SyncError};
pub use session::SessionStore;
