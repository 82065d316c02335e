//! # relay Core
//!
//! Core library for relay - a bridge that lets a chat-completion model call
//! tools served by a local MCP provider process.
//!
//! The pieces, leaves first:
//! - [`session`] launches a provider script, performs the MCP handshake and
//!   exposes tool discovery and invocation over stdio.
//! - [`tools`] turns provider tool descriptors into function schemas.
//! - [`orchestrator`] runs the two-phase completion flow for one query.

// Core modules
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod protocol;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use config::{ModelParams, ResolvedLlmConfig, SessionConfig};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, QueryOutcome};
pub use session::{Session, ToolProvider};

/// Current version of the relay-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing on stderr, `info` by default and `debug` when asked.
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
