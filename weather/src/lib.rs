//! # relay Weather
//!
//! An MCP tool provider with a single tool, `query_weather`, that looks up
//! today's weather for a Chinese city name through the AMap API. It speaks
//! newline-delimited JSON-RPC on stdin/stdout; logs go to stderr.

pub mod client;
pub mod format;
pub mod server;

pub use client::{AmapClient, WeatherSource, DEFAULT_ENDPOINT};
pub use format::{format_weather_data, format_weather_text};
pub use server::{WeatherServer, TOOL_NAME};
