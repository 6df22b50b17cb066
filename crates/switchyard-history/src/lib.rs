//! Conversation context across the two continuation models
//!
//! SERVER_SIDE providers keep the conversation and are resumed from the
//! last turn id. CLIENT_SIDE providers get the full message list replayed,
//! trimmed to a token budget.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod manager;
pub mod store;
pub mod strategy;

pub use manager::{DEFAULT_MAX_CONTEXT_TOKENS, HistoryManager};
pub use store::{InMemorySessionStore, SessionKey, SessionLease, SessionStore};
pub use strategy::{ClientSide, ContinuationStrategy, HistoryHandle, Populate, ServerSide, trim_history};
