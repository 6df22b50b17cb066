use std::path::Path;

use super::{ConversationItem, ToolChoice, ToolSpec};

/// How the conversation so far reaches the provider
///
/// Exactly one mechanism is in play per call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Continuation {
    /// No prior context
    #[default]
    Fresh,
    /// Provider-hosted history, referenced by the last turn id
    PreviousResponse(String),
    /// Client-replayed history, sent in full before `input`
    History(Vec<ConversationItem>),
}

impl Continuation {
    pub fn previous_response_id(&self) -> Option<&str> {
        match self {
            Self::PreviousResponse(id) => Some(id),
            _ => None,
        }
    }

    pub fn history(&self) -> &[ConversationItem] {
        match self {
            Self::History(items) => items,
            _ => &[],
        }
    }
}

/// Sampling parameters forwarded when set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Base64 image supplied alongside the user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Original filename, used to infer the MIME type
    pub name: String,
    /// Base64 payload without a data-URL prefix
    pub base64: String,
}

impl ImageAttachment {
    pub fn new(name: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base64: base64.into(),
        }
    }

    /// MIME type from the file extension, `image/jpeg` when unknown
    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("heic") => "image/heic",
            _ => "image/jpeg",
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.base64)
    }
}

/// Provider-agnostic request for one model turn
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResponseRequest {
    pub model: String,
    /// New items for this turn
    pub input: Vec<ConversationItem>,
    pub continuation: Continuation,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoice,
    pub images: Vec<ImageAttachment>,
    pub params: SamplingParams,
    /// Provider text options (format, verbosity), passed through as-is
    pub text: Option<serde_json::Value>,
}

impl CreateResponseRequest {
    pub fn new(model: impl Into<String>, input: Vec<ConversationItem>) -> Self {
        Self {
            model: model.into(),
            input,
            continuation: Continuation::Fresh,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            images: Vec::new(),
            params: SamplingParams::default(),
            text: None,
        }
    }

    #[must_use]
    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = continuation;
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>, tool_choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    #[must_use]
    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }

    #[must_use]
    pub const fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Replayed history followed by this turn's input
    pub fn all_items(&self) -> impl Iterator<Item = &ConversationItem> {
        self.continuation.history().iter().chain(self.input.iter())
    }

    pub fn has_function_output(&self) -> bool {
        self.all_items().any(ConversationItem::is_function_output)
    }
}
