use std::fmt;

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse error category surfaced to callers
///
/// Callers branch on the kind, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Model,
    ApiKey,
    Llm,
    ToolNotRegistered,
    InvalidParameter,
    MissingParameter,
    Request,
    InvalidOperation,
    DuplicateEntry,
    ExternalSource,
    Context,
    Internal,
}

impl ErrorKind {
    /// Stable upper-case name of the kind
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::ApiKey => "API_KEY",
            Self::Llm => "LLM_ERROR",
            Self::ToolNotRegistered => "TOOL_NOT_REGISTERED",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::Request => "REQUEST_ERROR",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::DuplicateEntry => "DUPLICATE_ENTRY",
            Self::ExternalSource => "EXTERNAL_SOURCE_ERROR",
            Self::Context => "CONTEXT_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the orchestration engine
#[derive(Debug, Error)]
pub enum Error {
    /// Model name does not map to any known provider
    #[error("unsupported model: {0}")]
    Model(String),

    /// Credential reference missing or resolved to an empty value
    #[error("missing credential: {0}")]
    ApiKey(String),

    /// Vendor call failed in transport, status, or parsing
    #[error("llm error: {0}")]
    Llm(String),

    /// No tool with this name for the company or in the system namespace
    #[error("tool not registered: {0}")]
    ToolNotRegistered(String),

    /// Malformed tool configuration or call arguments
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Required tool configuration or call argument absent
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// Outbound tool request rejected or unsuccessful
    #[error("request error: {0}")]
    Request(String),

    /// Operation not allowed on this entity
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Name collision on create
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Native company code failed
    #[error("{0}")]
    ExternalSource(String),

    /// Conversation context could not be established
    #[error("context error: {0}")]
    Context(String),

    /// Unexpected collaborator failure
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(_) => ErrorKind::Model,
            Self::ApiKey(_) => ErrorKind::ApiKey,
            Self::Llm(_) => ErrorKind::Llm,
            Self::ToolNotRegistered(_) => ErrorKind::ToolNotRegistered,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::MissingParameter(_) => ErrorKind::MissingParameter,
            Self::Request(_) => ErrorKind::Request,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::DuplicateEntry(_) => ErrorKind::DuplicateEntry,
            Self::ExternalSource(_) => ErrorKind::ExternalSource,
            Self::Context(_) => ErrorKind::Context,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
