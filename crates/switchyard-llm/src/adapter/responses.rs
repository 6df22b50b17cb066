//! Responses API adapter for `OpenAI` and xAI

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_core::{ProviderKind, Result};

use super::{Adapter, VendorClient};
use crate::convert::responses::from_wire;
use crate::protocol::responses::{ResponsesRequest, ResponsesResponse};
use crate::types::{CreateResponseRequest, LlmResponse};

/// Adapter for providers that keep conversation state server-side
pub struct ResponsesAdapter {
    client: Arc<VendorClient>,
}

impl ResponsesAdapter {
    pub const fn new(client: Arc<VendorClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Adapter for ResponsesAdapter {
    fn provider(&self) -> ProviderKind {
        self.client.provider()
    }

    async fn create_response(&self, request: &CreateResponseRequest) -> Result<LlmResponse> {
        let wire_request = ResponsesRequest::from(request);
        tracing::debug!(
            provider = %self.client.provider(),
            model = %request.model,
            items = wire_request.input.len(),
            "sending responses request"
        );

        let wire_response: ResponsesResponse = self.client.post_json("responses", &wire_request).await?;
        Ok(from_wire(wire_response, self.client.provider(), &request.model))
    }
}
