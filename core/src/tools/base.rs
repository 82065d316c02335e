//! Tool invocation and result structures

use crate::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request to run one provider tool, parsed from the model's function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier of the originating tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool
    pub arguments: Map<String, Value>,
}

/// Text produced by a successful tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Result content
    pub content: String,

    /// Round-trip duration in milliseconds
    pub duration_ms: Option<u64>,
}

impl ToolInvocation {
    /// Create a new invocation from already-structured arguments
    pub fn new<S: Into<String>>(id: S, name: S, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Parse the JSON-encoded argument payload of a function call.
    ///
    /// The payload must be a JSON object; anything else is an
    /// [`OrchestratorError::ArgumentParse`].
    pub fn parse(id: &str, name: &str, raw_arguments: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw_arguments).map_err(|e| OrchestratorError::ArgumentParse {
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        match value {
            Value::Object(arguments) => Ok(Self::new(id.to_string(), name.to_string(), arguments)),
            other => Err(OrchestratorError::ArgumentParse {
                tool: name.to_string(),
                message: format!("expected a JSON object, got {}", other),
            }
            .into()),
        }
    }

    /// Get an argument value by key
    pub fn get_argument<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.arguments
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Arguments rendered as compact JSON, for logs and notices
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

impl ToolResult {
    /// Create a result from text content
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            duration_ms: None,
        }
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}
