use std::sync::Arc;

use serde::Serialize;
use switchyard_config::AgentConfig;
use switchyard_core::{Error, PreambleSource, Result};
use switchyard_history::{HistoryHandle, HistoryManager, Populate, SessionLease};
use switchyard_llm::{
    ContentPart, Continuation, ConversationItem, CreateResponseRequest, HistoryType, ImageAttachment, LlmGateway,
    LlmResponse, ToolCall, ToolChoice, Usage,
};
use switchyard_tools::ToolExecutor;

/// One user question
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub company: String,
    pub user: String,
    pub question: String,
    /// Falls back to `agent.default_model`
    pub model: Option<String>,
    pub images: Vec<ImageAttachment>,
    /// Answer from a fresh context and leave stored history untouched
    pub ignore_history: bool,
}

impl QueryRequest {
    pub fn new(company: impl Into<String>, user: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            user: user.into(),
            question: question.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Final answer of a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub response_id: String,
    pub model: String,
    pub answer: String,
    /// Summed over every provider call of the query
    pub usage: Usage,
    /// Tool-calling rounds it took
    pub tool_rounds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_parts: Option<Vec<ContentPart>>,
}

/// Runs the question / tool-call / answer cycle for one user at a time
pub struct QueryService {
    gateway: Arc<dyn LlmGateway>,
    history: Arc<HistoryManager>,
    tools: Arc<dyn ToolExecutor>,
    preambles: Arc<dyn PreambleSource>,
    settings: AgentConfig,
}

impl QueryService {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        history: Arc<HistoryManager>,
        tools: Arc<dyn ToolExecutor>,
        preambles: Arc<dyn PreambleSource>,
        settings: AgentConfig,
    ) -> Self {
        Self {
            gateway,
            history,
            tools,
            preambles,
            settings,
        }
    }

    fn model_or_default(&self, model: Option<&str>) -> String {
        model
            .filter(|m| !m.trim().is_empty())
            .map_or_else(|| self.settings.default_model.clone(), str::to_owned)
    }

    /// Answer one question under the user's session lock
    pub async fn ask(&self, request: QueryRequest) -> Result<QueryAnswer> {
        let model = self.model_or_default(request.model.as_deref());
        let lease = SessionLease::acquire(Arc::clone(self.history.store()), &request.company, &request.user).await?;
        let result = self.ask_locked(&request, &model).await;
        if let Err(e) = lease.release().await {
            tracing::error!(company = %request.company, error = %e, "failed to release session lock");
        }

        if let Err(e) = &result {
            tracing::warn!(company = %request.company, model = %model, kind = %e.kind(), error = %e, "query failed");
        }
        result
    }

    /// Force a context rebuild; returns the new turn id for SERVER_SIDE models
    pub async fn init_context(&self, company: &str, user: &str, model: Option<&str>) -> Result<Option<String>> {
        let model = self.model_or_default(model);
        let history_type = self.gateway.history_type(&model)?;
        let lease = SessionLease::acquire(Arc::clone(self.history.store()), company, user).await?;
        let result = self.rebuild_context(company, user, history_type, &model).await;
        if let Err(e) = lease.release().await {
            tracing::error!(company = %company, error = %e, "failed to release session lock");
        }
        result
    }

    async fn rebuild_context(
        &self,
        company: &str,
        user: &str,
        history_type: HistoryType,
        model: &str,
    ) -> Result<Option<String>> {
        let preamble = self.preambles.build_preamble(company, user).await?;
        self.history
            .initialize_context(company, user, history_type, model, &preamble)
            .await
    }

    /// Populate, rebuilding the context at most once
    async fn prepare(&self, handle: &mut HistoryHandle, question: &str, ignore_history: bool) -> Result<()> {
        if self.history.populate_request_params(handle, question, ignore_history).await? == Populate::Ready {
            return Ok(());
        }

        tracing::info!(company = %handle.company, model = %handle.model, "context rebuild needed");
        self.rebuild_context(&handle.company, &handle.user, handle.history_type, &handle.model)
            .await?;

        match self.history.populate_request_params(handle, question, ignore_history).await? {
            Populate::Ready => Ok(()),
            Populate::RebuildNeeded => Err(Error::Context(format!(
                "context for user '{}' in company '{}' could not be rebuilt",
                handle.user, handle.company
            ))),
        }
    }

    async fn ask_locked(&self, query: &QueryRequest, model: &str) -> Result<QueryAnswer> {
        let company = query.company.as_str();
        let history_type = self.gateway.history_type(model)?;
        let mut handle = HistoryHandle::new(company, &query.user, history_type, model);
        self.prepare(&mut handle, &query.question, query.ignore_history).await?;

        let (continuation, input) = split_user_turn(handle.request_params.clone(), &query.question);
        let mut request = CreateResponseRequest::new(model, input)
            .with_continuation(continuation)
            .with_tools(self.tools.tools_for_llm(company), ToolChoice::Auto)
            .with_images(query.images.clone());

        let mut usage = Usage::default();
        let mut round = 0;
        let response = loop {
            tracing::info!(company = %company, model = %model, round, "calling model");
            let response = self.gateway.create_response(company, &request).await?;
            usage += response.usage();

            if !response.has_tool_calls() {
                break response;
            }
            if round >= self.settings.max_tool_rounds {
                return Err(Error::Llm(format!(
                    "model '{model}' still requested tools after {round} rounds"
                )));
            }
            round += 1;

            self.run_tools(company, response.output(), &mut request.input).await?;
            if history_type == HistoryType::ServerSide {
                request.continuation = Continuation::PreviousResponse(response.id().to_owned());
            }
        };

        if !query.ignore_history {
            self.history
                .update_history(&handle, &query.question, &response)
                .await?;
        }

        Ok(answer(response, usage, round))
    }

    /// Dispatch calls in emission order, appending each output
    async fn run_tools(&self, company: &str, calls: &[ToolCall], input: &mut Vec<ConversationItem>) -> Result<()> {
        for call in calls {
            tracing::info!(company = %company, tool = %call.name, call_id = %call.call_id, "running tool");
            let result = self.tools.dispatch(company, &call.name, call.arguments_map()).await?;
            let output = serde_json::to_string(&result).map_err(|e| Error::Internal(e.into()))?;
            input.push(ConversationItem::function_output(call.call_id.clone(), output));
        }
        Ok(())
    }
}

/// Replayed history ends with the new user turn; send that turn as input
fn split_user_turn(continuation: Continuation, question: &str) -> (Continuation, Vec<ConversationItem>) {
    let turn = ConversationItem::user(question);
    match continuation {
        Continuation::History(mut items) => {
            if items.last() == Some(&turn) {
                items.pop();
            }
            (Continuation::History(items), vec![turn])
        }
        other => (other, vec![turn]),
    }
}

fn answer(response: LlmResponse, usage: Usage, tool_rounds: usize) -> QueryAnswer {
    QueryAnswer {
        response_id: response.id().to_owned(),
        model: response.model().to_owned(),
        answer: response.output_text().to_owned(),
        usage,
        tool_rounds,
        reasoning_content: response.reasoning_content().map(str::to_owned),
        content_parts: response.content_parts().map(<[ContentPart]>::to_vec),
    }
}
