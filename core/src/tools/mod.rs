//! Tool invocation types and the function-schema catalog

pub mod base;
pub mod catalog;

pub use base::{ToolInvocation, ToolResult};
pub use catalog::{to_tool_definition, to_tool_definitions};
