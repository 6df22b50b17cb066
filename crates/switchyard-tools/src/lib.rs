//! Tool registry, dispatcher, and the sandbox for outbound HTTP tools

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod dispatcher;
pub mod execution;
pub mod native;
pub mod registry;
pub mod sandbox;
pub mod system;
pub mod tool;

pub use dispatcher::{Dispatcher, ToolExecution, ToolExecutor};
pub use execution::ExecutionConfig;
pub use native::{CompanyRegistry, InferenceBackend, NativeRegistry, NativeTool, NativeToolset, NoTransaction, TransactionScope};
pub use registry::{SyncSummary, ToolRegistry};
pub use sandbox::{HttpSandbox, ReqwestTransport, TokioResolver};
pub use system::{SystemToolHandler, SystemToolTable};
pub use tool::{NewTool, Tool, ToolType, ToolUpdate};
