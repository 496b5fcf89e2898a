//! Unread Counts
//!
//! Badge numbers come from the per-conversation `unread_count` reported by the
//! server and bumped on live pushes. Per-message `seen` flags only decide which
//! messages an acknowledgment covers.

use crate::shared::messaging::Conversation;

/// Largest number a badge shows before switching to "99+"
pub const BADGE_CAP: u32 = 99;

/// Total unread over all conversations, saturating
pub fn global_unread<'a, I>(conversations: I) -> u32
where
    I: IntoIterator<Item = &'a Conversation>,
{
    conversations
        .into_iter()
        .fold(0u32, |total, c| total.saturating_add(c.unread_count))
}

/// Unread count as shown on a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeCount(pub u32);

impl BadgeCount {
    /// Text for the badge, `None` when nothing should be drawn
    pub fn label(self) -> Option<String> {
        match self.0 {
            0 => None,
            n if n > BADGE_CAP => Some(format!("{}+", BADGE_CAP)),
            n => Some(n.to_string()),
        }
    }

    pub fn is_visible(self) -> bool {
        self.0 > 0
    }
}

/// Everything the header, mobile nav and sidebar badges need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnreadSummary {
    pub total: u32,
    pub conversations_with_unread: usize,
}

impl UnreadSummary {
    pub fn from_conversations(conversations: &[Conversation]) -> Self {
        Self {
            total: global_unread(conversations),
            conversations_with_unread: conversations.iter().filter(|c| c.unread_count > 0).count(),
        }
    }

    pub fn badge(&self) -> BadgeCount {
        BadgeCount(self.total)
    }
}
