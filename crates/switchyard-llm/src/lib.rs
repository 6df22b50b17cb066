//! LLM layer for Switchyard
//!
//! Canonical request/response types, one adapter per vendor wire protocol,
//! and the router that picks an adapter from a model name and resolves
//! per-company credentials.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod adapter;
pub mod cache;
pub mod convert;
pub mod protocol;
pub mod proxy;
pub mod registry;
pub mod tokens;
pub mod tool_cache;
pub mod types;

pub use adapter::{Adapter, VendorClient};
pub use cache::{AdapterCache, ClientCache};
pub use proxy::{LlmGateway, LlmProxy};
pub use registry::{HistoryType, ModelRegistry};
pub use tokens::{LengthEstimate, TiktokenCounter, TokenCounter};
pub use tool_cache::ToolCallCache;
pub use types::*;
