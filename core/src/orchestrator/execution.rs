//! Query outcome structures

use crate::tools::{ToolInvocation, ToolResult};
use serde::{Deserialize, Serialize};

/// Result of answering one user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Final answer text, verbatim from the completion API
    pub answer: String,

    /// The tool call dispatched on the way, if the model asked for one
    pub tool_call: Option<ToolInvocation>,

    /// What that tool returned
    pub tool_result: Option<ToolResult>,
}

impl QueryOutcome {
    /// The model answered without touching any tool
    pub fn direct(answer: String) -> Self {
        Self {
            answer,
            tool_call: None,
            tool_result: None,
        }
    }

    /// The model answered after one tool round-trip
    pub fn with_tool(answer: String, call: ToolInvocation, result: ToolResult) -> Self {
        Self {
            answer,
            tool_call: Some(call),
            tool_result: Some(result),
        }
    }

    pub fn used_tool(&self) -> bool {
        self.tool_call.is_some()
    }
}
