use mini_moka::sync::Cache;
use serde_json::Value;

/// Default number of remembered tool calls per adapter
const DEFAULT_CAPACITY: u64 = 1024;

/// Invocation the model emitted, kept to rebuild strict tool pairs
#[derive(Debug, Clone, PartialEq)]
pub struct CachedToolCall {
    pub name: String,
    pub arguments: Value,
}

/// Bounded `call_id -> invocation` map owned by one adapter
///
/// Providers that require a tool-invocation block right before each
/// tool-result block need the original call to replay it. Entries live
/// only as long as the adapter; after eviction or a restart adapters
/// fall back to a plain-text tool result.
pub struct ToolCallCache {
    calls: Cache<String, CachedToolCall>,
}

impl ToolCallCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            calls: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn remember(&self, call_id: &str, name: &str, arguments: Value) {
        self.calls.insert(
            call_id.to_owned(),
            CachedToolCall {
                name: name.to_owned(),
                arguments,
            },
        );
    }

    pub fn recall(&self, call_id: &str) -> Option<CachedToolCall> {
        self.calls.get(&call_id.to_owned())
    }
}

impl Default for ToolCallCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
