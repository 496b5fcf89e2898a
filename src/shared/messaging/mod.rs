//! Messaging Module
//!
//! This module contains all the data structures for the chat system:
//!
//! - `Conversation` - A thread between the viewer and another participant
//! - `Message` - A message in a conversation
//! - Id newtypes and request bodies
//!
//! # Usage
//!
//! ```rust
//! use souq_chat::shared::messaging::{ChatId, Conversation, Message};
//! ```

pub mod ids;
pub mod message;
pub mod conversation;

pub use ids::{ChatId, ListingId, MessageId, UserId};
pub use message::{CreateChatRequest, Message, MessageBody, SendMessageRequest, SenderRole};
pub use conversation::{Conversation, ListingSummary, Participant};
