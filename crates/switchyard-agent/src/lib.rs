//! Query orchestration: history, model calls, and tool rounds composed
//! into one question-to-answer cycle

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod query;

pub use query::{QueryAnswer, QueryRequest, QueryService};
