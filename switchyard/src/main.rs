#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::sync::Arc;

use args::Args;
use clap::Parser;
use switchyard_agent::{QueryAnswer, QueryRequest, QueryService};
use switchyard_config::Config;
use switchyard_core::EnvSecretProvider;
use switchyard_history::{HistoryManager, InMemorySessionStore};
use switchyard_llm::{ClientCache, LlmProxy, TiktokenCounter, TokenCounter};
use switchyard_tools::{
    Dispatcher, HttpSandbox, NativeRegistry, NoTransaction, ReqwestTransport, SystemToolTable, TokioResolver,
    ToolRegistry,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Arc::new(Config::load(&args.config)?);

    // Initialize telemetry
    switchyard_telemetry::init(config.telemetry.as_ref(), "warn")?;

    tracing::info!(config_path = %args.config.display(), company = %args.company, "starting switchyard");

    let service = build_service(&config)?;

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let request = QueryRequest {
        company: args.company,
        user: args.user,
        question: args.question,
        model: args.model,
        images: Vec::new(),
        ignore_history: args.ignore_history,
    };

    let answer = tokio::select! {
        result = service.ask(request) => result?,
        () = shutdown.cancelled() => anyhow::bail!("interrupted"),
    };

    print_answer(&answer, args.json)?;
    Ok(())
}

fn build_service(config: &Arc<Config>) -> anyhow::Result<QueryService> {
    let secrets = Arc::new(EnvSecretProvider);
    let tokens: Arc<dyn TokenCounter> = Arc::new(TiktokenCounter::new());

    let proxy = Arc::new(
        LlmProxy::new(
            &config.llm,
            Arc::clone(config) as _,
            Arc::clone(&secrets) as _,
            Arc::new(ClientCache::new()),
        )
        .with_token_counter(Arc::clone(&tokens)),
    );

    let sandbox = HttpSandbox::new(
        Arc::new(ReqwestTransport::new()?),
        Arc::new(TokioResolver),
        secrets,
        Arc::clone(config) as _,
    );
    let dispatcher = Dispatcher::new(
        Arc::new(ToolRegistry::with_system_tools()),
        SystemToolTable::new(),
        Arc::new(NativeRegistry::new()),
        sandbox,
        Arc::new(NoTransaction),
    );

    let history = HistoryManager::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::clone(&proxy) as _,
        tokens,
        config.history.max_context_tokens,
    );

    Ok(QueryService::new(
        proxy,
        Arc::new(history),
        Arc::new(dispatcher),
        Arc::clone(config) as _,
        config.agent.clone(),
    ))
}

fn print_answer(answer: &QueryAnswer, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
    } else {
        println!("{}", answer.answer);
    }
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
