//! Full engine wired against the mock vendor

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use switchyard_agent::QueryService;
use switchyard_config::Config;
use switchyard_core::{Error, Result};
use switchyard_history::{DEFAULT_MAX_CONTEXT_TOKENS, HistoryManager, InMemorySessionStore};
use switchyard_llm::{ClientCache, LengthEstimate, LlmProxy, TokenCounter};
use switchyard_tools::system::SQL_QUERY;
use switchyard_tools::{
    Dispatcher, HttpSandbox, NativeRegistry, NoTransaction, ReqwestTransport, SystemToolHandler, SystemToolTable,
    TokioResolver, ToolRegistry,
};

/// SQL handler that answers `SELECT 42 AS total` and records every call
#[derive(Default)]
pub struct FakeSql {
    pub calls: Mutex<Vec<Map<String, Value>>>,
}

#[async_trait]
impl SystemToolHandler for FakeSql {
    async fn call(&self, _company: &str, args: &Map<String, Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(args.clone());
        match args.get("query").and_then(Value::as_str) {
            Some(query) if query.to_uppercase().starts_with("SELECT") => Ok(json!([{"total": 42}])),
            _ => Err(Error::InvalidParameter("only SELECT statements are allowed".to_owned())),
        }
    }
}

pub struct Engine {
    pub config: Arc<Config>,
    pub proxy: Arc<LlmProxy>,
    pub store: Arc<InMemorySessionStore>,
    pub sql: Arc<FakeSql>,
    pub service: QueryService,
}

impl Engine {
    pub fn new(config: Config, secrets: HashMap<String, String>) -> Self {
        let config = Arc::new(config);
        let secrets = Arc::new(secrets);
        let tokens: Arc<dyn TokenCounter> = Arc::new(LengthEstimate);

        let proxy = Arc::new(
            LlmProxy::new(
                &config.llm,
                Arc::clone(&config) as _,
                Arc::clone(&secrets) as _,
                Arc::new(ClientCache::new()),
            )
            .with_token_counter(Arc::clone(&tokens)),
        );

        let sql = Arc::new(FakeSql::default());
        let sandbox = HttpSandbox::new(
            Arc::new(ReqwestTransport::new().unwrap()),
            Arc::new(TokioResolver),
            secrets,
            Arc::clone(&config) as _,
        );
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::with_system_tools()),
            SystemToolTable::new().with_handler(SQL_QUERY, Arc::clone(&sql) as _),
            Arc::new(NativeRegistry::new()),
            sandbox,
            Arc::new(NoTransaction),
        );

        let store = Arc::new(InMemorySessionStore::new());
        let history = Arc::new(HistoryManager::new(
            Arc::clone(&store) as _,
            Arc::clone(&proxy) as _,
            tokens,
            DEFAULT_MAX_CONTEXT_TOKENS,
        ));

        let service = QueryService::new(
            Arc::clone(&proxy) as _,
            history,
            Arc::new(dispatcher),
            Arc::clone(&config) as _,
            config.agent.clone(),
        );

        Self {
            config,
            proxy,
            store,
            sql,
            service,
        }
    }
}
