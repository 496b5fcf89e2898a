//! Shared Module
//!
//! Wire types exchanged with the marketplace backend and its realtime service.
//! Nothing here performs I/O; the types are used by the REST client, the
//! realtime layer and the UI alike.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// `{success, message, data}` envelope and pagination
pub mod envelope;

/// Realtime event kinds and payloads
pub mod event;

/// Conversations, messages and ids
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Locale, RealtimeSettings};
pub use envelope::{ApiEnvelope, Page};
pub use error::SharedError;
pub use event::{EventKind, PushEvent};
