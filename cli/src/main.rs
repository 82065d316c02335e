//! # relay CLI
//!
//! Chat with a completion model that can call the tools of a local MCP
//! server.
//!
//! ## Usage
//!
//! - `relay weather.py` - Start the chat loop against a provider script
//! - `relay weather.py --list-tools` - Show the provider's tools and exit
//!
//! The provider script is launched with `python`, `node` or `sh` depending on
//! its extension and spoken to over stdio.

use anyhow::Result;
use clap::Parser;
use relay_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use relay_core::{ModelParams, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod config;

use commands::{interactive_command, tools_command};
use config::CliConfigLoader;

/// relay - Let an LLM call tools from a local MCP server
#[derive(Parser)]
#[command(name = "relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with an LLM that can call tools from a local MCP server")]
#[command(long_about = None)]
struct Cli {
    /// Path to the tool provider script (.py, .js or .sh)
    server_script: PathBuf,

    /// API key override (defaults to $OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override (defaults to $BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override (defaults to $MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens per completion
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Seconds to wait for each tool provider response
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Print the provider's tools and exit
    #[arg(long)]
    list_tools: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new().with_params(ModelParams {
        max_tokens: cli.max_tokens,
        temperature: cli.temperature,
    });

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    relay_core::init_tracing(cli.verbose);
    config::load_dotenv();

    let session_config =
        SessionConfig::default().with_request_timeout(Duration::from_secs(cli.timeout_secs));

    if cli.list_tools {
        return tools_command(&cli.server_script, session_config).await;
    }

    let config_loader = build_config_loader(&cli);
    interactive_command(&cli.server_script, config_loader, session_config).await
}
