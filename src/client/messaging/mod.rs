//! Messaging Module
//!
//! Live conversation data and the chat panel UI:
//!
//! - **ConversationSync**: mounts on the user's private channel and keeps the
//!   cache current
//! - **ConversationCache**: conversations, threads, loading/error state
//! - **Unread**: badge counts derived from the cache
//! - **List view**: search, timestamps and previews for the sidebar
//! - **UI**: sidebar, chat area, badges and their components

pub mod badges;
pub mod chat_area;
pub mod components;
pub mod conversation_sync;
pub mod list_view;
pub mod sidebar;
pub mod state;
pub mod unread;
pub mod view;

pub use conversation_sync::{ConversationSync, SyncError};
pub use list_view::{ConversationRow, ListState};
pub use state::{ConversationCache, PushOutcome, Toast};
pub use unread::{BadgeCount, UnreadSummary};
pub use view::{ChatAction, ChatViewState};
