//! Souq Chat - Client Library
//!
//! The chat client of the Souq classifieds marketplace: conversation lists and
//! threads over REST, live updates over a Pusher-protocol channel service, and
//! unread badges that stay consistent across the app.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types exchanged with the backend
//!   - Conversations, messages, typed ids
//!   - Realtime event kinds and payloads
//!   - `{success, message, data}` envelope, configuration, errors
//!
//! - **`client`** - Everything that runs in the app
//!   - REST client and session store
//!   - Realtime channel client and the Pusher transport
//!   - Conversation sync, unread aggregation and the egui chat panel
//!
//! # Usage
//!
//! ```rust,no_run
//! use souq_chat::client::{ChatContext, Config, ConversationSync, SessionStore};
//! use souq_chat::shared::messaging::UserId;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let context = ChatContext::connect(Config::load()?, SessionStore::in_memory());
//! let sync = ConversationSync::mount(&context, UserId(42))?;
//! sync.refresh().await?;
//! println!("unread: {}", sync.cache().unread_summary().total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod shared;
