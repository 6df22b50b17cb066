use std::path::PathBuf;

use clap::Parser;

/// Switchyard LLM orchestration engine
#[derive(Debug, Parser)]
#[command(name = "switchyard", about = "Answer a question through an LLM with company tools and history")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchyard.toml", env = "SWITCHYARD_CONFIG")]
    pub config: PathBuf,

    /// Company short name
    #[arg(long, env = "SWITCHYARD_COMPANY")]
    pub company: String,

    /// User identifier the conversation belongs to
    #[arg(long, default_value = "cli")]
    pub user: String,

    /// Model name; defaults to `agent.default_model`
    #[arg(short, long)]
    pub model: Option<String>,

    /// Answer without reading or writing conversation history
    #[arg(long)]
    pub ignore_history: bool,

    /// Print the full answer as JSON
    #[arg(long)]
    pub json: bool,

    /// The question to ask
    pub question: String,
}
