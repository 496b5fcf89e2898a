//! View state and actions
//!
//! Rendering functions never call the network. They edit [`ChatViewState`] and
//! return [`ChatAction`]s, which the shell turns into async operations on the
//! conversation sync.

use crate::shared::messaging::ChatId;

/// Per-window UI state that is not part of the conversation cache
#[derive(Debug, Default, Clone)]
pub struct ChatViewState {
    pub search_query: String,
    pub selected: Option<ChatId>,
    /// Text being typed in the open conversation
    pub draft: String,
}

impl ChatViewState {
    /// Select `chat_id`, clearing the draft when switching conversations
    pub fn select(&mut self, chat_id: ChatId) -> bool {
        if self.selected == Some(chat_id) {
            return false;
        }
        self.selected = Some(chat_id);
        self.draft.clear();
        true
    }

    /// Take the draft for sending, if it has content
    pub fn take_draft(&mut self) -> Option<String> {
        if self.draft.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.draft))
    }
}

/// Something the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Load the thread and acknowledge it
    Open(ChatId),
    Send { chat_id: ChatId, body: String },
    LoadMore,
    Retry,
    DismissToast(u64),
}
