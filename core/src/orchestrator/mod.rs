//! Completion orchestration: query in, answer out, at most one tool call between

pub mod core;
pub mod execution;

pub use self::core::Orchestrator;
pub use execution::QueryOutcome;
