use std::sync::Arc;

use switchyard_core::Result;
use switchyard_llm::{HistoryType, LlmGateway, LlmResponse, TokenCounter};

use crate::store::{SessionKey, SessionStore};
use crate::strategy::{ClientSide, ContinuationStrategy, HistoryHandle, Populate, ServerSide};

/// Default CLIENT_SIDE token budget
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 100_000;

/// Picks the continuation strategy for a handle and forwards to it
pub struct HistoryManager {
    store: Arc<dyn SessionStore>,
    server_side: ServerSide,
    client_side: ClientSide,
}

impl HistoryManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn LlmGateway>,
        tokens: Arc<dyn TokenCounter>,
        max_context_tokens: usize,
    ) -> Self {
        Self {
            server_side: ServerSide::new(Arc::clone(&store), gateway),
            client_side: ClientSide::new(Arc::clone(&store), tokens, max_context_tokens),
            store,
        }
    }

    pub const fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn strategy(&self, history_type: HistoryType) -> &dyn ContinuationStrategy {
        match history_type {
            HistoryType::ServerSide => &self.server_side,
            HistoryType::ClientSide => &self.client_side,
        }
    }

    pub async fn initialize_context(
        &self,
        company: &str,
        user: &str,
        history_type: HistoryType,
        model: &str,
        preamble: &str,
    ) -> Result<Option<String>> {
        let key = SessionKey::new(company, user, model);
        self.strategy(history_type).initialize(&key, preamble).await
    }

    pub async fn populate_request_params(
        &self,
        handle: &mut HistoryHandle,
        user_turn: &str,
        ignore_history: bool,
    ) -> Result<Populate> {
        self.strategy(handle.history_type)
            .populate(handle, user_turn, ignore_history)
            .await
    }

    pub async fn update_history(&self, handle: &HistoryHandle, user_turn: &str, response: &LlmResponse) -> Result<()> {
        self.strategy(handle.history_type).update(handle, user_turn, response).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use switchyard_core::Error;
    use switchyard_llm::{Continuation, ConversationItem, CreateResponseRequest, LengthEstimate, ToolCall, Usage};

    use super::*;
    use crate::store::InMemorySessionStore;

    struct FixedId;

    #[async_trait]
    impl LlmGateway for FixedId {
        async fn create_response(&self, _company: &str, request: &CreateResponseRequest) -> Result<LlmResponse> {
            Ok(LlmResponse::new("resp_1", &request.model, "", Vec::<ToolCall>::new(), Usage::default()))
        }

        fn history_type(&self, _model: &str) -> Result<HistoryType> {
            Err(Error::Model("unused".into()))
        }

        fn count_tokens(&self, text: &str) -> usize {
            text.len()
        }
    }

    fn manager() -> HistoryManager {
        HistoryManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(FixedId),
            Arc::new(LengthEstimate),
            DEFAULT_MAX_CONTEXT_TOKENS,
        )
    }

    #[tokio::test]
    async fn routes_by_history_type() {
        let manager = manager();

        let id = manager
            .initialize_context("acme", "u1", HistoryType::ServerSide, "gpt-5", "preamble")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("resp_1"));

        let id = manager
            .initialize_context("acme", "u1", HistoryType::ClientSide, "claude-sonnet-4", "preamble")
            .await
            .unwrap();
        assert_eq!(id, None);

        let mut server = HistoryHandle::new("acme", "u1", HistoryType::ServerSide, "gpt-5");
        manager.populate_request_params(&mut server, "hi", false).await.unwrap();
        assert_eq!(server.request_params, Continuation::PreviousResponse("resp_1".into()));

        let mut client = HistoryHandle::new("acme", "u1", HistoryType::ClientSide, "claude-sonnet-4");
        manager.populate_request_params(&mut client, "hi", false).await.unwrap();
        assert_eq!(
            client.request_params,
            Continuation::History(vec![ConversationItem::user("preamble"), ConversationItem::user("hi")])
        );
    }

    #[tokio::test]
    async fn ignore_history_replays_only_preamble() {
        let manager = manager();
        let handle = HistoryHandle::new("acme", "u1", HistoryType::ClientSide, "gemini-2.5-pro");
        manager
            .initialize_context("acme", "u1", HistoryType::ClientSide, "gemini-2.5-pro", "preamble")
            .await
            .unwrap();
        let earlier = LlmResponse::new("r", "gemini-2.5-pro", "earlier answer", Vec::new(), Usage::default());
        manager.update_history(&handle, "earlier", &earlier).await.unwrap();

        let mut fresh = handle.clone();
        manager.populate_request_params(&mut fresh, "new", true).await.unwrap();
        assert_eq!(
            fresh.request_params.history(),
            [ConversationItem::user("preamble"), ConversationItem::user("new")]
        );
    }
}
