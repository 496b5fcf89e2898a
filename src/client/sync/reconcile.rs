//! # State Reconciliation
//!
//! Merges a cached conversation summary with an incoming one.
//!
//! ## Rules
//!
//! - **Push**: the event is the newest thing we know about, so the incoming
//!   summary replaces the cached one. `updated_at` still never goes back.
//! - **Poll / Refetch**: last write wins on `updated_at`. A snapshot older than
//!   the cached entry is discarded, so a slow poll cannot undo a push that
//!   arrived while it was in flight. On a tie the server copy wins.

use crate::shared::messaging::Conversation;

/// Where an incoming conversation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Realtime event
    Push,
    /// Periodic safety-net fetch
    Poll,
    /// Fetch triggered by the app (mount, reconnect, unknown chat id)
    Refetch,
}

/// How a source is merged into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationStrategy {
    /// Incoming always replaces the cached copy
    IncomingWins,
    /// Newer `updated_at` wins; ties go to incoming
    LastWriteWins,
}

impl SourceKind {
    pub fn strategy(self) -> ReconciliationStrategy {
        match self {
            SourceKind::Push => ReconciliationStrategy::IncomingWins,
            SourceKind::Poll | SourceKind::Refetch => ReconciliationStrategy::LastWriteWins,
        }
    }
}

/// Merge `incoming` into `cached`, returning the copy to keep
pub fn reconcile(cached: Option<Conversation>, incoming: Conversation, source: SourceKind) -> Conversation {
    let Some(cached) = cached else {
        return incoming;
    };

    match source.strategy() {
        ReconciliationStrategy::IncomingWins => {
            let mut merged = incoming;
            merged.updated_at = merged.updated_at.max(cached.updated_at);
            merged
        }
        ReconciliationStrategy::LastWriteWins => {
            if incoming.updated_at < cached.updated_at {
                tracing::debug!(
                    "[SYNC] Keeping cached chat {} over stale {:?} copy",
                    cached.id,
                    source
                );
                cached
            } else {
                incoming
            }
        }
    }
}
