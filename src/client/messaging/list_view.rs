//! Conversation list model
//!
//! Everything the sidebar shows, computed from the cache without touching it:
//! list state, search filtering, relative timestamps and preview truncation.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use super::state::ConversationCache;
use super::unread::BadgeCount;
use crate::shared::config::Locale;
use crate::shared::messaging::{ChatId, Conversation};

/// Characters of the last message shown in a row
pub const PREVIEW_BUDGET: usize = 40;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// First fetch still running and nothing cached
    Loading,
    Empty,
    Populated,
}

impl ListState {
    pub fn of(cache: &ConversationCache) -> Self {
        if !cache.conversations().is_empty() {
            ListState::Populated
        } else if cache.loading || !cache.is_loaded() {
            ListState::Loading
        } else {
            ListState::Empty
        }
    }
}

/// Conversations whose participant name contains `query`, ignoring case.
///
/// An empty (or blank) query matches everything.
pub fn filter_conversations<'a>(conversations: &'a [Conversation], query: &str) -> Vec<&'a Conversation> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return conversations.iter().collect();
    }
    conversations
        .iter()
        .filter(|c| c.display_name().to_lowercase().contains(&needle))
        .collect()
}

/// Cut `text` to at most `budget` characters, marking the cut with "...".
///
/// Counts chars, not bytes, so multi-byte scripts are never split mid
/// code point.
pub fn truncate_preview(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let kept: String = text.chars().take(budget).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

fn arabic_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Relative timestamp for a list row.
///
/// Same day as `now` gives the time, the day before gives "yesterday", anything
/// else a short day/month/year date. `now` decides the time zone.
pub fn format_timestamp<Tz: TimeZone>(ts: DateTime<Utc>, now: &DateTime<Tz>, locale: Locale) -> String {
    let local = ts.with_timezone(&now.timezone());
    let today = now.date_naive();
    let day = local.date_naive();

    if day == today {
        let (pm, hour) = local.hour12();
        let time = format!("{}:{:02}", hour, local.minute());
        match locale {
            Locale::Arabic => format!("{} {}", arabic_digits(&time), if pm { "م" } else { "ص" }),
            Locale::English => format!("{} {}", time, if pm { "PM" } else { "AM" }),
        }
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        match locale {
            Locale::Arabic => "أمس".to_string(),
            Locale::English => "Yesterday".to_string(),
        }
    } else {
        let date = format!("{}/{}/{}", day.day(), day.month(), day.year());
        match locale {
            Locale::Arabic => arabic_digits(&date),
            Locale::English => date,
        }
    }
}

/// One rendered row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRow {
    pub chat_id: ChatId,
    pub name: String,
    pub listing: Option<String>,
    pub preview: String,
    pub timestamp: String,
    pub unread: BadgeCount,
    pub online: bool,
}

impl ConversationRow {
    pub fn build<Tz: TimeZone>(conversation: &Conversation, now: &DateTime<Tz>, locale: Locale) -> Self {
        Self {
            chat_id: conversation.id,
            name: conversation.display_name().to_string(),
            listing: conversation.listing.as_ref().map(|l| l.title.clone()),
            preview: truncate_preview(conversation.last_message_text(), PREVIEW_BUDGET),
            timestamp: format_timestamp(conversation.updated_at, now, locale),
            unread: BadgeCount(conversation.unread_count),
            online: conversation.participant.is_online,
        }
    }
}

/// Rows for the current search, in cache order
pub fn rows<Tz: TimeZone>(
    conversations: &[Conversation],
    query: &str,
    now: &DateTime<Tz>,
    locale: Locale,
) -> Vec<ConversationRow> {
    filter_conversations(conversations, query)
        .into_iter()
        .map(|c| ConversationRow::build(c, now, locale))
        .collect()
}
