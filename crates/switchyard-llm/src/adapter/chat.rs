//! OpenAI-compatible Chat Completions adapter, used for `DeepSeek`

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_core::{ProviderKind, Result};

use super::{Adapter, VendorClient};
use crate::convert::chat::from_wire;
use crate::protocol::chat::{ChatRequest, ChatResponse};
use crate::types::{CreateResponseRequest, LlmResponse};

pub struct ChatCompletionsAdapter {
    client: Arc<VendorClient>,
}

impl ChatCompletionsAdapter {
    pub const fn new(client: Arc<VendorClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Adapter for ChatCompletionsAdapter {
    fn provider(&self) -> ProviderKind {
        self.client.provider()
    }

    async fn create_response(&self, request: &CreateResponseRequest) -> Result<LlmResponse> {
        let wire_request = ChatRequest::from(request);
        tracing::debug!(
            provider = %self.client.provider(),
            model = %request.model,
            messages = wire_request.messages.len(),
            "sending chat completions request"
        );

        let wire_response: ChatResponse = self.client.post_json("chat/completions", &wire_request).await?;
        from_wire(wire_response, self.client.provider(), &request.model)
    }
}
