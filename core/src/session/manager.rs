//! Tool provider session: launch, handshake, discovery, invocation, teardown

use crate::config::SessionConfig;
use crate::error::{Error, Result, SessionError};
use crate::protocol::{
    methods, CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcResponse, ListToolsResult, ToolDescriptor, MCP_PROTOCOL_VERSION,
};
use crate::tools::ToolResult;
use serde_json::{Map, Value};
use std::path::Path;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::kind::LaunchSpec;
use super::transport::StdioTransport;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process spawned, handshake not finished
    Uninitialized,
    /// Handshake done, requests accepted
    Initialized,
    /// The stream is gone; only `close` is meaningful
    Closed,
}

/// One live connection to a tool provider process
pub struct Session {
    transport: StdioTransport,
    config: SessionConfig,
    state: SessionState,
    server_info: Option<Implementation>,
    tools: Vec<ToolDescriptor>,
}

impl Session {
    /// Launch the provider script and complete the handshake.
    ///
    /// Unsupported script types are rejected before anything is spawned.
    /// Every later failure is reported as `HandshakeFailure`, with the child
    /// already killed.
    pub async fn open(script: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
        let script = script.as_ref();
        let spec = LaunchSpec::for_script(script)?;
        info!(
            script = %script.display(),
            interpreter = %spec.program.display(),
            "opening tool provider session"
        );
        Self::launch(spec, config).await
    }

    /// Spawn a provider from an explicit launch command and handshake with it
    pub async fn launch(spec: LaunchSpec, config: SessionConfig) -> Result<Self> {
        let transport = StdioTransport::spawn(&spec, config.request_timeout)
            .map_err(|e| SessionError::handshake(session_message(e)))?;

        let mut session = Self {
            transport,
            config,
            state: SessionState::Uninitialized,
            server_info: None,
            tools: Vec::new(),
        };

        match session.handshake().await {
            Ok(()) => Ok(session),
            Err(e) => {
                let message = session_message(e);
                warn!(error = %message, "tool provider handshake failed");
                if let Err(e) = session.transport.shutdown(Duration::ZERO).await {
                    warn!(error = %e, "failed to reap tool provider");
                }
                Err(SessionError::handshake(message).into())
            }
        }
    }

    async fn handshake(&mut self) -> Result<()> {
        let params = serde_json::to_value(InitializeParams::new(&self.config.client_name))?;
        let response = self.request(methods::INITIALIZE, Some(params)).await?;
        let result = response
            .into_result()
            .map_err(|e| SessionError::handshake(format!("initialize rejected: {}", e)))?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| SessionError::handshake(format!("malformed initialize result: {}", e)))?;

        if init.protocol_version != MCP_PROTOCOL_VERSION {
            warn!(
                server = %init.protocol_version,
                client = MCP_PROTOCOL_VERSION,
                "protocol version mismatch, continuing"
            );
        }

        self.transport.notify(methods::INITIALIZED, None).await?;
        info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            "tool provider initialized"
        );
        self.server_info = Some(init.server_info);
        self.state = SessionState::Initialized;

        self.list_tools().await?;
        Ok(())
    }

    /// Ask the provider for its tools; the answer replaces the known set
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        self.ensure_initialized()?;

        let response = self.request(methods::TOOLS_LIST, None).await?;
        let result = response.into_result().map_err(|e| SessionError::Protocol {
            message: format!("tools/list failed: {}", e),
        })?;
        let listed: ListToolsResult =
            serde_json::from_value(result).map_err(|e| SessionError::Protocol {
                message: format!("malformed tools/list result: {}", e),
            })?;

        debug!(
            tools = ?listed.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "discovered tools"
        );
        self.tools = listed.tools;
        Ok(self.tools.clone())
    }

    /// Invoke one tool and wait for its result.
    ///
    /// Names outside the discovered set are rejected without contacting the
    /// provider. Provider-side rejections and results flagged `isError` come
    /// back as `ToolInvocation` errors.
    pub async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<ToolResult> {
        self.ensure_initialized()?;
        if !self.has_tool(name) {
            return Err(SessionError::tool(name, "not offered by this tool provider").into());
        }

        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;

        let started = Instant::now();
        let response = self.request(methods::TOOLS_CALL, Some(params)).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = response
            .into_result()
            .map_err(|e| SessionError::tool(name, e.to_string()))?;
        let result: CallToolResult =
            serde_json::from_value(result).map_err(|e| SessionError::Protocol {
                message: format!("malformed tools/call result: {}", e),
            })?;

        let text = result.joined_text();
        if result.is_error() {
            return Err(SessionError::tool(name, text).into());
        }

        debug!(tool = name, duration_ms, "tool call finished");
        Ok(ToolResult::new(text).with_duration(duration_ms))
    }

    /// Shut the provider down and reap it. Consumes the session.
    pub async fn close(self) -> Result<ExitStatus> {
        debug!(pid = ?self.transport.pid(), state = ?self.state, "closing tool provider session");
        let status = self.transport.shutdown(self.config.shutdown_grace).await?;
        info!(%status, "tool provider exited");
        Ok(status)
    }

    /// Tools from the most recent discovery
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn ensure_initialized(&self) -> Result<()> {
        match self.state {
            SessionState::Initialized => Ok(()),
            SessionState::Uninitialized => Err(SessionError::Protocol {
                message: "session is not initialized".to_string(),
            }
            .into()),
            SessionState::Closed => Err(SessionError::transport("session is closed").into()),
        }
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse> {
        let result = self.transport.request(method, params).await;
        if let Err(Error::Session(e)) = &result {
            if e.is_transport() {
                self.state = SessionState::Closed;
            }
        }
        result
    }
}

fn session_message(error: Error) -> String {
    match error {
        Error::Session(SessionError::HandshakeFailure { message }) => message,
        Error::Session(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HANDSHAKE: &str = r##"
read -r line
printf '%s\n' 'mock provider starting'
printf '%s\n' ''
printf '%s\n' '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}'
printf '%s\n' '{"jsonrpc":"2.0","id":99,"result":{}}'
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"mock","version":"0.1.0"}}}'
read -r line
read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"echo","description":"Echo text","inputSchema":{"type":"object","properties":{"text":{"type":"string"}}}},{"name":"fail"},{"name":"broken"},{"name":"crash"},{"name":"slow"},{"name":"pinger"}]}}'
"##;

    const CALL_LOOP: &str = r##"
while read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo"}]}}\n' "$id" ;;
    *'"name":"echo"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"hello"},{"type":"text","text":"world"}]}}\n' "$id" ;;
    *'"name":"fail"'*)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32602,"message":"missing city"}}\n' "$id" ;;
    *'"name":"broken"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"upstream down"}],"isError":true}}\n' "$id" ;;
    *'"name":"crash"'*)
      exit 3 ;;
    *'"name":"slow"'*)
      exec sleep 5 ;;
    *'"name":"pinger"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":"srv-1","method":"ping"}'
      read -r reply
      case "$reply" in
        *'"id":"srv-1","result":{}'*) answer=pong-ok ;;
        *) answer=pong-bad ;;
      esac
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"%s"}]}}\n' "$id" "$answer" ;;
  esac
done
"##;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn test_config() -> SessionConfig {
        SessionConfig::default()
            .with_request_timeout(Duration::from_secs(5))
            .with_shutdown_grace(Duration::from_millis(200))
    }

    async fn open_mock(dir: &TempDir, config: SessionConfig) -> Session {
        let script = write_script(dir, "mock.sh", &format!("{}{}", HANDSHAKE, CALL_LOOP));
        Session::open(&script, config).await.unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    #[tokio::test]
    async fn test_open_and_call_tool() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(session.server_info().unwrap().name, "mock");
        assert_eq!(session.tools().len(), 6);
        assert_eq!(session.tools()[0].description.as_deref(), Some("Echo text"));

        let result = session
            .call_tool("echo", args(json!({"text": "hi"})))
            .await
            .unwrap();
        assert_eq!(result.content, "hello\nworld");
        assert!(result.duration_ms.is_some());

        // ids keep advancing across calls
        let again = session.call_tool("echo", Map::new()).await.unwrap();
        assert_eq!(again.content, "hello\nworld");

        let status = session.close().await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_list_tools_replaces_catalog() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        let tools = session.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert!(session.has_tool("echo"));
        assert!(!session.has_tool("fail"));

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rejected_locally() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        let err = session.call_tool("nope", Map::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::ToolInvocation { ref name, .. }) if name == "nope"
        ));

        // nothing was sent, the stream is still in step
        assert!(session.call_tool("echo", Map::new()).await.is_ok());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_reply_and_error_result() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        let err = session.call_tool("fail", Map::new()).await.unwrap_err();
        match err {
            Error::Session(SessionError::ToolInvocation { name, message }) => {
                assert_eq!(name, "fail");
                assert!(message.contains("missing city"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = session.call_tool("broken", Map::new()).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));

        assert_eq!(session.state(), SessionState::Initialized);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_provider_exit_is_transport_error() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        let err = session.call_tool("crash", Map::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Transport { .. })
        ));
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.call_tool("echo", Map::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Transport { .. })
        ));

        let status = session.close().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let dir = TempDir::new().unwrap();
        let config = test_config().with_request_timeout(Duration::from_millis(500));
        let mut session = open_mock(&dir, config).await;

        let err = session.call_tool("slow", Map::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Timeout { ref method, .. }) if method == "tools/call"
        ));

        // the hung provider is killed on close
        let status = session.close().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        let dir = TempDir::new().unwrap();
        let mut session = open_mock(&dir, test_config()).await;

        let result = session.call_tool("pinger", Map::new()).await.unwrap();
        assert_eq!(result.content, "pong-ok");

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_failures() {
        let dir = TempDir::new().unwrap();
        let scripts = [
            ("exits.sh", "exit 1\n"),
            (
                "rejects.sh",
                r##"read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"unsupported client"}}'
"##,
            ),
            (
                "garbled.sh",
                r##"read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"unexpected":true}}'
"##,
            ),
        ];

        for (name, body) in scripts {
            let script = write_script(&dir, name, body);
            let err = Session::open(&script, test_config()).await.err().unwrap();
            assert!(
                matches!(err, Error::Session(SessionError::HandshakeFailure { .. })),
                "{}: unexpected error {:?}",
                name,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "silent.sh", "exec sleep 5\n");
        let config = test_config().with_request_timeout(Duration::from_millis(300));

        let started = Instant::now();
        let err = Session::open(&script, config).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Session(SessionError::HandshakeFailure { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_unsupported_script_is_not_spawned() {
        let err = Session::open("/nonexistent/server.rb", test_config())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Session(SessionError::UnsupportedToolProviderKind { .. })
        ));
    }
}
