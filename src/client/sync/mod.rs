//! # Conversation Reconciliation
//!
//! Conversations reach the cache from three places: realtime pushes, the
//! safety-net poll and explicit refetches. This module decides which copy wins
//! when two of them disagree.

pub mod reconcile;

pub use reconcile::{reconcile, ReconciliationStrategy, SourceKind};
