//! Tools listing command

use anyhow::{Context, Result};
use colored::Colorize;
use relay_core::{Session, SessionConfig};
use std::path::Path;
use tracing::info;

/// Connect to the provider, print its tools and disconnect
pub async fn tools_command(script: &Path, session_config: SessionConfig) -> Result<()> {
    info!(script = %script.display(), "Listing available tools");

    let session = Session::open(script, session_config)
        .await
        .with_context(|| format!("Failed to start tool provider {}", script.display()))?;

    let server = session
        .server_info()
        .map(|info| format!("{} {}", info.name, info.version))
        .unwrap_or_else(|| "tool provider".to_string());
    println!("Available tools from {}\n", server.bold());

    for tool in session.tools() {
        println!("  {}", tool.name.green());
        // First line of the description only
        let description = tool.description.as_deref().unwrap_or("");
        if let Some(first_line) = description.lines().next() {
            println!("    {}", first_line);
        }
    }

    session
        .close()
        .await
        .context("Failed to shut down tool provider")?;
    Ok(())
}
