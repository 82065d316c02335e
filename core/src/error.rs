//! Error types and handling for relay core

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for relay core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool provider session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Query orchestration errors
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Errors raised while talking to a tool provider process
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported tool provider '{path}': expected a .py, .js or .sh script")]
    UnsupportedToolProviderKind { path: String },

    #[error("Handshake with tool provider failed: {message}")]
    HandshakeFailure { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Tool '{name}' failed: {message}")]
    ToolInvocation { name: String, message: String },

    #[error("Timed out after {seconds}s waiting for '{method}'")]
    Timeout { method: String, seconds: u64 },

    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

/// Query orchestration errors
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Malformed arguments for tool '{tool}': {message}")]
    ArgumentParse { tool: String, message: String },
}

impl SessionError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn handshake(message: impl Into<String>) -> Self {
        Self::HandshakeFailure {
            message: message.into(),
        }
    }

    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the underlying stream or process is gone or unresponsive
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}
