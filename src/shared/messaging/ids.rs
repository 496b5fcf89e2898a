//! Identifier newtypes
//!
//! The backend hands out plain numeric ids for chats, messages and users.
//! Wrapping them keeps a message id from being passed where a chat id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifies a conversation (a "chat" on the wire)
    ChatId
);
numeric_id!(
    /// Identifies a single message within a conversation
    MessageId
);
numeric_id!(
    /// Identifies a marketplace user
    UserId
);
numeric_id!(
    /// Identifies a classified listing a conversation may be about
    ListingId
);
