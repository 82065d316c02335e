//! relay-weather: `query_weather` MCP server on stdio

use anyhow::Result;
use clap::Parser;
use relay_weather::{AmapClient, WeatherServer, DEFAULT_ENDPOINT};
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;

/// MCP server exposing a query_weather tool over stdio
#[derive(Parser)]
#[command(name = "relay-weather")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server exposing a query_weather tool over stdio")]
struct Cli {
    /// AMap web service key
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Weather API endpoint
    #[arg(long, env = "WEATHER_API_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Seconds to wait for the weather API
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    http_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    relay_core::init_tracing(cli.verbose);

    let client = AmapClient::with_timeout(
        cli.endpoint,
        cli.api_key,
        Duration::from_secs(cli.http_timeout_secs),
    )?;
    info!(endpoint = %client.endpoint(), "weather server listening on stdio");

    let server = WeatherServer::new(client);
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
