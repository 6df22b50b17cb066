//! Gemini `generateContent` adapter

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_core::{ProviderKind, Result};

use super::{Adapter, VendorClient};
use crate::convert::gemini::{build_request, from_wire};
use crate::protocol::gemini::GeminiResponse;
use crate::tool_cache::ToolCallCache;
use crate::types::{CreateResponseRequest, LlmResponse};

pub struct GeminiAdapter {
    client: Arc<VendorClient>,
    tool_calls: ToolCallCache,
}

impl GeminiAdapter {
    pub fn new(client: Arc<VendorClient>) -> Self {
        Self {
            client,
            tool_calls: ToolCallCache::default(),
        }
    }
}

#[async_trait]
impl Adapter for GeminiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn create_response(&self, request: &CreateResponseRequest) -> Result<LlmResponse> {
        let wire_request = build_request(request, &self.tool_calls);
        tracing::debug!(
            provider = %ProviderKind::Gemini,
            model = %request.model,
            contents = wire_request.contents.len(),
            "sending generateContent request"
        );

        let path = format!("models/{}:generateContent", request.model);
        let wire_response: GeminiResponse = self.client.post_json(&path, &wire_request).await?;
        from_wire(wire_response, &request.model, &self.tool_calls)
    }
}
