//! Canonical request and response types shared by every adapter

mod item;
mod request;
mod response;
mod tool;

pub use item::{ConversationItem, FunctionCallOutput, MessageItem, Role};
pub use request::{Continuation, CreateResponseRequest, ImageAttachment, SamplingParams};
pub use response::{ContentPart, IMAGE_PLACEHOLDER, ImageSource, LlmResponse, ResponseStatus, ToolCall, Usage};
pub use tool::{ToolChoice, ToolSpec};
