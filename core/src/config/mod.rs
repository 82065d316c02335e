//! Configuration module for relay core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{
    ModelParams, ResolvedLlmConfig, SessionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
