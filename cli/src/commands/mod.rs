//! CLI command implementations

pub mod interactive;
pub mod tools;

pub use interactive::interactive_command;
pub use tools::tools_command;
