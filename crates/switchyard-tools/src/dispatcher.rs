//! Tool dispatch: resolve a tool once, then run its execution strategy

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use switchyard_core::{Error, Result};
use switchyard_llm::ToolSpec;

use crate::execution::ExecutionConfig;
use crate::native::{CompanyRegistry, InferenceBackend, TransactionScope};
use crate::registry::ToolRegistry;
use crate::sandbox::HttpSandbox;
use crate::system::{SystemToolHandler, SystemToolTable};
use crate::tool::{Tool, ToolType};

/// What the agent loop needs from tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn dispatch(&self, company: &str, name: &str, args: Map<String, Value>) -> Result<Value>;

    fn tools_for_llm(&self, company: &str) -> Vec<ToolSpec>;
}

/// A looked-up tool bound to its strategy
pub enum ToolExecution {
    Native,
    System(Arc<dyn SystemToolHandler>),
    Http(ExecutionConfig),
    Inference,
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    system: SystemToolTable,
    companies: Arc<dyn CompanyRegistry>,
    sandbox: HttpSandbox,
    inference: Option<Arc<dyn InferenceBackend>>,
    transaction: Arc<dyn TransactionScope>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        system: SystemToolTable,
        companies: Arc<dyn CompanyRegistry>,
        sandbox: HttpSandbox,
        transaction: Arc<dyn TransactionScope>,
    ) -> Self {
        Self {
            registry,
            system,
            companies,
            sandbox,
            inference: None,
            transaction,
        }
    }

    #[must_use]
    pub fn with_inference(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.inference = Some(backend);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Lookup step of a dispatch
    pub fn resolve(&self, company: &str, name: &str) -> Result<ToolExecution> {
        let tool = self.registry.lookup(company, name)?;
        self.execution_for(tool)
    }

    fn execution_for(&self, tool: Tool) -> Result<ToolExecution> {
        match tool.tool_type {
            ToolType::Native => Ok(ToolExecution::Native),
            ToolType::System => self.system.get(&tool.name).map(ToolExecution::System).ok_or_else(|| {
                Error::ToolNotRegistered(format!("system tool '{}' has no registered handler", tool.name))
            }),
            ToolType::Http => tool.execution_config.map(ToolExecution::Http).ok_or_else(|| {
                Error::MissingParameter(format!("HTTP tool '{}' has no execution_config", tool.name))
            }),
            ToolType::Inference => {
                if self.inference.is_some() {
                    Ok(ToolExecution::Inference)
                } else {
                    Err(Error::ToolNotRegistered(format!(
                        "inference tool '{}' has no inference backend",
                        tool.name
                    )))
                }
            }
        }
    }

    async fn call_native(&self, company: &str, name: &str, args: Map<String, Value>) -> Result<Value> {
        let toolset = self.companies.toolset(company).ok_or_else(|| {
            Error::ExternalSource(format!(
                "Company '{company}' not configured. available companies: {:?}",
                self.companies.companies()
            ))
        })?;
        let method = toolset
            .method(name)
            .ok_or_else(|| Error::ExternalSource(format!("Method '{name}' not found in company '{company}' instance.")))?;

        match method.call(args).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(company = %company, tool = %name, error = %e, "native tool failed");
                if let Err(rollback) = self.transaction.rollback().await {
                    tracing::error!(company = %company, tool = %name, error = %rollback, "rollback failed");
                }
                match e.downcast::<Error>() {
                    Ok(typed) => Err(typed),
                    Err(other) => Err(Error::ExternalSource(format!(
                        "Error executing native tool '{name}': {other}"
                    ))),
                }
            }
        }
    }

    async fn call_inference(&self, company: &str, name: &str, args: &Map<String, Value>) -> Result<Value> {
        let backend = self
            .inference
            .as_ref()
            .ok_or_else(|| Error::ToolNotRegistered(format!("inference tool '{name}' has no inference backend")))?;
        backend
            .predict(company, name, args)
            .await
            .map_err(|e| Error::ExternalSource(format!("Error executing inference tool '{name}': {e}")))
    }
}

#[async_trait]
impl ToolExecutor for Dispatcher {
    async fn dispatch(&self, company: &str, name: &str, args: Map<String, Value>) -> Result<Value> {
        let execution = self.resolve(company, name)?;
        tracing::debug!(company = %company, tool = %name, "dispatching tool");

        let result = match execution {
            ToolExecution::Native => self.call_native(company, name, args).await,
            ToolExecution::System(handler) => handler.call(company, &args).await,
            ToolExecution::Http(config) => self.sandbox.execute(company, name, &config, &args).await,
            ToolExecution::Inference => self.call_inference(company, name, &args).await,
        };

        if let Err(e) = &result {
            tracing::warn!(company = %company, tool = %name, kind = %e.kind(), error = %e, "tool call failed");
        }
        result
    }

    fn tools_for_llm(&self, company: &str) -> Vec<ToolSpec> {
        self.registry.tools_for_llm(company)
    }
}
