//! Drives the real relay-weather binary through a relay-core session

use relay_core::error::{Error, SessionError};
use relay_core::session::SessionState;
use relay_core::{Session, SessionConfig};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Wrapper script so the session can launch the binary as a `.sh` provider.
/// The endpoint points at a closed local port, so lookups fail fast.
fn wrapper(dir: &TempDir) -> PathBuf {
    wrapper_with_args(dir, "--endpoint http://127.0.0.1:9/weather")
}

fn wrapper_with_args(dir: &TempDir, args: &str) -> PathBuf {
    let path = dir.path().join("weather.sh");
    let body = format!(
        "exec '{}' --api-key test-key {}\n",
        env!("CARGO_BIN_EXE_relay-weather"),
        args
    );
    std::fs::write(&path, body).unwrap();
    path
}

/// Accepts connections and never answers them
async fn silent_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}/weather", addr)
}

fn config() -> SessionConfig {
    SessionConfig::default()
        .with_request_timeout(Duration::from_secs(20))
        .with_shutdown_grace(Duration::from_secs(2))
}

fn city(name: &str) -> Map<String, Value> {
    match json!({ "city": name }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn handshake_and_tool_catalog() {
    let dir = TempDir::new().unwrap();
    let session = Session::open(wrapper(&dir), config()).await.unwrap();

    assert_eq!(session.server_info().unwrap().name, "WeatherServer");
    let tools = session.tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "query_weather");

    // closing stdin lets the server exit on its own
    let status = session.close().await.unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn failed_lookup_is_rendered_as_text() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(wrapper(&dir), config()).await.unwrap();

    let result = session.call_tool("query_weather", city("北京")).await.unwrap();
    assert!(
        result.content.starts_with("错误: 请求失败"),
        "got {}",
        result.content
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn missing_city_is_a_tool_error() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::open(wrapper(&dir), config()).await.unwrap();

    let err = session
        .call_tool("query_weather", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Session(SessionError::ToolInvocation { .. })
    ));

    session.close().await.unwrap();
}

#[tokio::test]
async fn stalled_upstream_reports_before_session_timeout() {
    let dir = TempDir::new().unwrap();
    let endpoint = silent_endpoint().await;
    let script = wrapper_with_args(
        &dir,
        &format!("--endpoint {} --http-timeout-secs 1", endpoint),
    );
    let config = SessionConfig::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_shutdown_grace(Duration::from_secs(2));
    let mut session = Session::open(script, config).await.unwrap();

    let result = session.call_tool("query_weather", city("上海")).await.unwrap();
    assert!(
        result.content.starts_with("错误: 请求失败"),
        "got {}",
        result.content
    );
    assert_eq!(session.state(), SessionState::Initialized);

    session.close().await.unwrap();
}

#[test]
fn default_session_timeout_outlasts_weather_lookup() {
    assert!(SessionConfig::default().request_timeout > relay_weather::client::REQUEST_TIMEOUT);
}
