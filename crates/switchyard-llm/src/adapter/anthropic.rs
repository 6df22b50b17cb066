//! Anthropic Messages API adapter

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_core::{ProviderKind, Result};

use super::{Adapter, VendorClient};
use crate::convert::anthropic::{build_request, from_wire};
use crate::protocol::anthropic::AnthropicResponse;
use crate::tool_cache::ToolCallCache;
use crate::types::{CreateResponseRequest, LlmResponse};

/// Adapter for the Messages API
///
/// Owns the `tool_use` cache needed to rebuild strict tool pairs.
pub struct AnthropicAdapter {
    client: Arc<VendorClient>,
    tool_calls: ToolCallCache,
}

impl AnthropicAdapter {
    pub fn new(client: Arc<VendorClient>) -> Self {
        Self {
            client,
            tool_calls: ToolCallCache::default(),
        }
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn create_response(&self, request: &CreateResponseRequest) -> Result<LlmResponse> {
        let wire_request = build_request(request, &self.tool_calls);
        tracing::debug!(
            provider = %ProviderKind::Anthropic,
            model = %request.model,
            messages = wire_request.messages.len(),
            "sending messages request"
        );

        let wire_response: AnthropicResponse = self.client.post_json("messages", &wire_request).await?;
        Ok(from_wire(wire_response, &request.model, &self.tool_calls))
    }
}
