//! Company-provided native tools and their collaborators

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

/// One method a company exposes to the model
#[async_trait]
pub trait NativeTool: Send + Sync {
    async fn call(&self, args: Map<String, Value>) -> anyhow::Result<Value>;
}

/// Adapts a synchronous closure into a [`NativeTool`]
pub struct FnTool<F>(pub F);

#[async_trait]
impl<F> NativeTool for FnTool<F>
where
    F: Fn(Map<String, Value>) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, args: Map<String, Value>) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}

/// Explicit table of a company's native methods
#[derive(Default, Clone)]
pub struct NativeToolset {
    methods: HashMap<String, Arc<dyn NativeTool>>,
}

impl NativeToolset {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, name: &str, tool: Arc<dyn NativeTool>) -> Self {
        self.methods.insert(name.to_owned(), tool);
        self
    }

    /// Register a synchronous closure under `name`
    #[must_use]
    pub fn with_fn<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.with_method(name, Arc::new(FnTool(f)))
    }

    pub fn method(&self, name: &str) -> Option<Arc<dyn NativeTool>> {
        self.methods.get(name).cloned()
    }
}

/// Resolves a company short name to its native toolset
pub trait CompanyRegistry: Send + Sync {
    fn toolset(&self, company: &str) -> Option<Arc<NativeToolset>>;

    /// Registered company names, for error messages
    fn companies(&self) -> Vec<String>;
}

/// In-process registry keyed by lower-cased company name
#[derive(Default)]
pub struct NativeRegistry {
    toolsets: DashMap<String, Arc<NativeToolset>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, company: &str, toolset: NativeToolset) {
        tracing::debug!(company = %company, methods = toolset.methods.len(), "registering native toolset");
        self.toolsets.insert(company.to_lowercase(), Arc::new(toolset));
    }
}

impl CompanyRegistry for NativeRegistry {
    fn toolset(&self, company: &str) -> Option<Arc<NativeToolset>> {
        self.toolsets.get(&company.to_lowercase()).map(|entry| Arc::clone(entry.value()))
    }

    fn companies(&self) -> Vec<String> {
        let mut names: Vec<_> = self.toolsets.iter().map(|entry| entry.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

/// Pending transactional state a failed native tool must discard
#[async_trait]
pub trait TransactionScope: Send + Sync {
    async fn rollback(&self) -> anyhow::Result<()>;
}

/// For deployments without transactional collaborators
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransaction;

#[async_trait]
impl TransactionScope for NoTransaction {
    async fn rollback(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Predictions for INFERENCE tools
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn predict(&self, company: &str, tool_name: &str, args: &Map<String, Value>) -> anyhow::Result<Value>;
}
