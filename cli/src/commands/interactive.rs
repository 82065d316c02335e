//! Interactive chat loop

use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use colored::Colorize;
use relay_core::{Orchestrator, QueryOutcome, Session, SessionConfig, ToolProvider};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// What one line of user input asks for
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Exit,
    Empty,
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let text = line.trim();
    if text.is_empty() {
        Input::Empty
    } else if text.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else {
        Input::Query(text)
    }
}

/// Start the chat loop against the given provider script.
///
/// The completion API config is resolved before the provider is spawned so
/// a missing key fails fast. The session is closed on every way out.
pub async fn interactive_command(
    script: &Path,
    config_loader: CliConfigLoader,
    session_config: SessionConfig,
) -> Result<()> {
    let llm_config = config_loader.load()?;
    let orchestrator =
        Orchestrator::from_config(&llm_config).context("Failed to create completion API client")?;

    let mut session = Session::open(script, session_config)
        .await
        .with_context(|| format!("Failed to start tool provider {}", script.display()))?;

    print_banner(&session, orchestrator.model_name());

    let stdin = BufReader::new(tokio::io::stdin());
    let outcome = chat_loop(&orchestrator, &mut session, stdin).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to shut down tool provider cleanly");
    }

    outcome
}

fn print_banner(session: &Session, model: &str) {
    let names: Vec<&str> = session.tools().iter().map(|t| t.name.as_str()).collect();
    info!(tools = ?names, model, "connected to tool provider");

    println!("{}", "relay started".green().bold());
    println!("Connected to server with tools: {}", names.join(", "));
    println!("Model: {}", model);
    println!("Type your queries or 'exit' to quit.");
}

/// Read queries until `exit` or end of input. The first failed query ends
/// the loop and its error is returned.
async fn chat_loop<R>(
    orchestrator: &Orchestrator,
    provider: &mut dyn ToolProvider,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        print!("\n{} ", "Query:".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let query = match parse_input(&line) {
            Input::Exit => break,
            Input::Empty => continue,
            Input::Query(query) => query,
        };

        match orchestrator.process_query(provider, query).await {
            Ok(outcome) => print_outcome(&outcome),
            // Any failed query ends the session; main reports the error
            Err(e) => return Err(e).context("Query failed, ending session"),
        }
    }

    Ok(())
}

fn print_outcome(outcome: &QueryOutcome) {
    println!();
    if let Some(call) = &outcome.tool_call {
        let notice = format!(
            "[Calling tool {} with args {}]",
            call.name,
            call.arguments_json()
        );
        println!("{}", notice.dimmed());
    }
    println!("{}", outcome.answer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::error::{LlmError, Result as CoreResult};
    use relay_core::llm::{ChatOptions, LlmClient, LlmMessage, LlmResponse, ToolDefinition};
    use relay_core::protocol::ToolDescriptor;
    use relay_core::tools::ToolResult;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Completion client whose every request fails
    #[derive(Default)]
    struct FailingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn chat_completion(
            &self,
            _messages: Vec<LlmMessage>,
            _tools: Option<Vec<ToolDefinition>>,
            _options: Option<ChatOptions>,
        ) -> CoreResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api {
                message: "service unavailable".to_string(),
            }
            .into())
        }

        fn model_name(&self) -> &str {
            "failing-model"
        }

        fn provider_name(&self) -> &str {
            "test"
        }
    }

    /// Provider without tools
    struct NoTools;

    #[async_trait]
    impl ToolProvider for NoTools {
        async fn list_tools(&mut self) -> CoreResult<Vec<ToolDescriptor>> {
            Ok(Vec::new())
        }

        async fn call_tool(
            &mut self,
            name: &str,
            _arguments: Map<String, Value>,
        ) -> CoreResult<ToolResult> {
            panic!("unexpected call to {}", name)
        }
    }

    #[tokio::test]
    async fn test_failed_query_ends_loop() {
        let llm = Arc::new(FailingLlm::default());
        let orchestrator = Orchestrator::new(llm.clone(), ChatOptions::default());
        let mut provider = NoTools;

        let result = chat_loop(
            &orchestrator,
            &mut provider,
            "first query\nsecond query\n".as_bytes(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("ending session"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exit_stops_before_querying() {
        let llm = Arc::new(FailingLlm::default());
        let orchestrator = Orchestrator::new(llm.clone(), ChatOptions::default());
        let mut provider = NoTools;

        chat_loop(&orchestrator, &mut provider, "\nexit\nnever sent\n".as_bytes())
            .await
            .unwrap();
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("  EXIT \n"), Input::Exit);
        assert_eq!(parse_input(""), Input::Empty);
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input(" 北京天气 "), Input::Query("北京天气"));
        assert_eq!(parse_input("exit now"), Input::Query("exit now"));
    }
}
