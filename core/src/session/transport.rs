//! Newline-delimited JSON-RPC over a child process's stdin/stdout

use crate::error::{Result, SessionError};
use crate::protocol::{
    methods, Incoming, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::kind::LaunchSpec;

/// Duplex message stream to one provider process
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    request_timeout: Duration,
    next_id: u64,
}

impl StdioTransport {
    /// Spawn the provider. stderr is inherited so provider logs stay visible.
    pub fn spawn(spec: &LaunchSpec, request_timeout: Duration) -> Result<Self> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            SessionError::transport(format!(
                "failed to spawn '{}': {}",
                spec.program.display(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::transport("failed to capture provider stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::transport("failed to capture provider stdout"))?;

        debug!(
            program = %spec.program.display(),
            pid = ?child.id(),
            "spawned tool provider"
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            request_timeout,
            next_id: 1,
        })
    }

    /// OS process id, while the child is alive
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Send a request and wait for the response carrying the same id.
    ///
    /// The whole round-trip is bounded by the request timeout. Server-side
    /// errors come back inside the response; only stream failures are `Err`.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;
        let request = JsonRpcRequest::new(id.clone(), method, params);

        let limit = self.request_timeout;
        match timeout(limit, self.round_trip(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(method, id = %id, "tool provider request timed out");
                Err(SessionError::Timeout {
                    method: method.to_string(),
                    seconds: limit.as_secs(),
                }
                .into())
            }
        }
    }

    /// Send a notification; no response is expected
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.write_message(&JsonRpcNotification::new(method, params))
            .await
    }

    async fn round_trip(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.write_message(request).await?;
        self.read_response(&request.id).await
    }

    async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        trace!(json = %line, "-> provider");
        line.push('\n');

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SessionError::transport("provider stdin already closed"))?;

        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        }
        .await;

        written.map_err(|e| {
            SessionError::transport(format!("failed to write to provider: {}", e)).into()
        })
    }

    async fn read_response(&mut self, id: &RequestId) -> Result<JsonRpcResponse> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| SessionError::transport(format!("failed to read from provider: {}", e)))?;

            if read == 0 {
                return Err(SessionError::transport(self.describe_eof()).into());
            }

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            trace!(json = %text, "<- provider");

            let message = match serde_json::from_str::<IncomingMessage>(text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, line = %text, "ignoring non-JSON-RPC output from provider");
                    continue;
                }
            };

            match message.classify() {
                Some(Incoming::Response(response)) if &response.id == id => return Ok(response),
                Some(Incoming::Response(response)) => {
                    debug!(expected = %id, got = %response.id, "skipping stale response");
                }
                Some(Incoming::Notification(note)) => {
                    debug!(method = %note.method, "provider notification");
                }
                Some(Incoming::Request(request)) => self.answer_server_request(request).await?,
                None => warn!(line = %text, "ignoring message without id or method"),
            }
        }
    }

    async fn answer_server_request(&mut self, request: JsonRpcRequest) -> Result<()> {
        let response = if request.method == methods::PING {
            JsonRpcResponse::success(request.id, json!({}))
        } else {
            debug!(method = %request.method, "rejecting unsupported server request");
            JsonRpcResponse::failure(request.id, JsonRpcError::method_not_found(&request.method))
        };
        self.write_message(&response).await
    }

    fn describe_eof(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("provider exited ({})", status),
            _ => "provider closed its output stream".to_string(),
        }
    }

    /// Close stdin, give the provider `grace` to exit on its own, then kill
    /// it. Always reaps the child.
    pub async fn shutdown(mut self, grace: Duration) -> Result<ExitStatus> {
        drop(self.stdin.take());

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                debug!(pid = ?self.child.id(), "provider did not exit in time, killing");
                self.child.kill().await?;
                Ok(self.child.wait().await?)
            }
        }
    }
}
