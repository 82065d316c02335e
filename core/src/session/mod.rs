//! Tool provider sessions over stdio

pub mod kind;
pub mod manager;
pub mod transport;

pub use kind::{LaunchSpec, ProviderKind};
pub use manager::{Session, SessionState};
pub use transport::StdioTransport;

use crate::error::Result;
use crate::protocol::ToolDescriptor;
use crate::tools::ToolResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Discovery and invocation, as seen by the orchestrator
#[async_trait]
pub trait ToolProvider: Send {
    /// Current tool catalog of the provider
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>>;

    /// Run one tool to completion
    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<ToolResult>;
}

#[async_trait]
impl ToolProvider for Session {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        Session::list_tools(self).await
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<ToolResult> {
        Session::call_tool(self, name, arguments).await
    }
}
