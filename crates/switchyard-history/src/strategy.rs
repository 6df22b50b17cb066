//! The two continuation models

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_core::Result;
use switchyard_llm::{
    Continuation, ConversationItem, CreateResponseRequest, HistoryType, LlmGateway, LlmResponse, TokenCounter,
};

use crate::store::{SessionKey, SessionStore};

/// Per-request view of one user's conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryHandle {
    pub company: String,
    pub user: String,
    pub history_type: HistoryType,
    pub model: String,
    /// Filled by `populate` before each provider call
    pub request_params: Continuation,
}

impl HistoryHandle {
    pub fn new(company: &str, user: &str, history_type: HistoryType, model: &str) -> Self {
        Self {
            company: company.to_owned(),
            user: user.to_owned(),
            history_type,
            model: model.to_owned(),
            request_params: Continuation::Fresh,
        }
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.company, &self.user, &self.model)
    }
}

/// Outcome of populating request params
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populate {
    Ready,
    /// Stored context is missing; initialize and populate again
    RebuildNeeded,
}

#[async_trait]
pub trait ContinuationStrategy: Send + Sync {
    /// Start a fresh conversation from `preamble`
    ///
    /// Returns the provider turn id when the provider hosts the history.
    async fn initialize(&self, key: &SessionKey, preamble: &str) -> Result<Option<String>>;

    async fn populate(&self, handle: &mut HistoryHandle, user_turn: &str, ignore_history: bool) -> Result<Populate>;

    async fn update(&self, handle: &HistoryHandle, user_turn: &str, response: &LlmResponse) -> Result<()>;
}

/// Provider keeps the conversation; only the last turn id is stored
pub struct ServerSide {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn LlmGateway>,
}

impl ServerSide {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self { store, gateway }
    }
}

#[async_trait]
impl ContinuationStrategy for ServerSide {
    async fn initialize(&self, key: &SessionKey, preamble: &str) -> Result<Option<String>> {
        self.store.clear_last_response_id(key).await?;

        let request = CreateResponseRequest::new(key.model.clone(), vec![ConversationItem::system(preamble)]);
        let response = self.gateway.create_response(&key.company, &request).await?;

        self.store.save_last_response_id(key, response.id()).await?;
        self.store.save_initial_response_id(key, response.id()).await?;
        tracing::info!(company = %key.company, model = %key.model, response_id = %response.id(), "context initialized");
        Ok(Some(response.id().to_owned()))
    }

    async fn populate(&self, handle: &mut HistoryHandle, _user_turn: &str, ignore_history: bool) -> Result<Populate> {
        let key = handle.session_key();
        let stored = if ignore_history {
            self.store.get_initial_response_id(&key).await?
        } else {
            self.store.get_last_response_id(&key).await?
        };

        match stored {
            Some(id) => {
                handle.request_params = Continuation::PreviousResponse(id);
                Ok(Populate::Ready)
            }
            None => Ok(Populate::RebuildNeeded),
        }
    }

    async fn update(&self, handle: &HistoryHandle, _user_turn: &str, response: &LlmResponse) -> Result<()> {
        self.store.save_last_response_id(&handle.session_key(), response.id()).await
    }
}

/// The full message list is stored and replayed on every call
pub struct ClientSide {
    store: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenCounter>,
    max_context_tokens: usize,
}

impl ClientSide {
    pub fn new(store: Arc<dyn SessionStore>, tokens: Arc<dyn TokenCounter>, max_context_tokens: usize) -> Self {
        Self {
            store,
            tokens,
            max_context_tokens,
        }
    }
}

#[async_trait]
impl ContinuationStrategy for ClientSide {
    async fn initialize(&self, key: &SessionKey, preamble: &str) -> Result<Option<String>> {
        self.store.clear_context_history(key).await?;
        self.store
            .save_context_history(key, &[ConversationItem::user(preamble)])
            .await?;
        tracing::info!(company = %key.company, model = %key.model, "context initialized");
        Ok(None)
    }

    async fn populate(&self, handle: &mut HistoryHandle, user_turn: &str, ignore_history: bool) -> Result<Populate> {
        let mut candidate = self.store.get_context_history(&handle.session_key()).await?;
        if candidate.is_empty() {
            return Ok(Populate::RebuildNeeded);
        }
        if ignore_history {
            candidate.truncate(1);
        }

        candidate.push(ConversationItem::user(user_turn));
        let dropped = trim_history(&mut candidate, self.tokens.as_ref(), self.max_context_tokens);
        if dropped > 0 {
            tracing::debug!(company = %handle.company, model = %handle.model, dropped, "trimmed context history");
        }

        handle.request_params = Continuation::History(candidate);
        Ok(Populate::Ready)
    }

    async fn update(&self, handle: &HistoryHandle, user_turn: &str, response: &LlmResponse) -> Result<()> {
        let key = handle.session_key();
        let mut history = self.store.get_context_history(&key).await?;
        history.push(ConversationItem::user(user_turn));
        history.push(ConversationItem::assistant(response.output_text()));
        self.store.save_context_history(&key, &history).await
    }
}

/// Drop the oldest non-preamble messages until the total fits `budget`
/// or only the preamble and the newest two remain
///
/// Returns how many messages were removed.
pub fn trim_history(history: &mut Vec<ConversationItem>, tokens: &dyn TokenCounter, budget: usize) -> usize {
    let mut costs: Vec<usize> = history.iter().map(|item| tokens.count(item.text())).collect();
    let mut total: usize = costs.iter().sum();
    let mut dropped = 0;

    while total > budget && history.len() > 3 {
        history.remove(1);
        total -= costs.remove(1);
        dropped += 1;
    }
    dropped
}
