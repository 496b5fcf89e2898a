//! Property-based tests for unread totals

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use souq_chat::client::messaging::unread::{global_unread, BADGE_CAP};
use souq_chat::client::messaging::{BadgeCount, UnreadSummary};
use souq_chat::shared::messaging::{ChatId, Conversation, Participant, UserId};

fn conversation(id: u64, unread: u32) -> Conversation {
    Conversation {
        id: ChatId(id),
        participant: Participant {
            id: UserId(id),
            name: format!("user {}", id),
            avatar: None,
            is_online: false,
        },
        listing: None,
        last_message: None,
        unread_count: unread,
        updated_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
    }
}

proptest! {
    #[test]
    fn test_global_unread_is_saturating_sum(counts in prop::collection::vec(any::<u32>(), 0..20)) {
        let conversations: Vec<Conversation> = counts
            .iter()
            .enumerate()
            .map(|(i, n)| conversation(i as u64, *n))
            .collect();
        let expected = counts.iter().map(|n| *n as u64).sum::<u64>().min(u32::MAX as u64) as u32;
        prop_assert_eq!(global_unread(&conversations), expected);

        let summary = UnreadSummary::from_conversations(&conversations);
        prop_assert_eq!(summary.conversations_with_unread, counts.iter().filter(|n| **n > 0).count());
    }

    #[test]
    fn test_badge_label_matches_count(count in any::<u32>()) {
        let label = BadgeCount(count).label();
        match count {
            0 => prop_assert!(label.is_none()),
            n if n > BADGE_CAP => prop_assert_eq!(label.as_deref(), Some("99+")),
            n => prop_assert_eq!(label, Some(n.to_string())),
        }
    }
}
