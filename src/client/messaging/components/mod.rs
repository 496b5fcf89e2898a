//! Messaging UI Components
//!
//! Reusable widgets for the chat panel.

pub mod conversation_item;
pub mod message_bubble;
pub mod search_bar;
pub mod unread_badge;
