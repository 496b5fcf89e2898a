//! Property-based tests for list row text

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use souq_chat::client::messaging::list_view::{format_timestamp, truncate_preview};
use souq_chat::shared::Locale;

proptest! {
    #[test]
    fn test_truncation_respects_budget(text in "\\PC{0,120}", budget in 1usize..60) {
        let cut = truncate_preview(&text, budget);
        let chars = text.chars().count();
        if chars <= budget {
            prop_assert_eq!(&cut, &text);
        } else {
            prop_assert!(cut.ends_with("..."));
            prop_assert!(cut.chars().count() <= budget + 3);
            let kept = cut.trim_end_matches("...");
            prop_assert!(text.starts_with(kept));
        }
    }

    #[test]
    fn test_arabic_timestamps_have_no_ascii_digits(offset_minutes in 0i64..(60 * 24 * 400)) {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let ts = now - chrono::Duration::minutes(offset_minutes);
        let label = format_timestamp(ts, &now, Locale::Arabic);
        prop_assert!(!label.is_empty());
        prop_assert!(!label.chars().any(|c| c.is_ascii_digit()));
    }
}
