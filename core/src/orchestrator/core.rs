//! Two-phase completion flow around a single tool call

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result, SessionError};
use crate::llm::{ChatOptions, ContentBlock, LlmClient, LlmMessage, LlmResponse, OpenAiClient};
use crate::session::ToolProvider;
use crate::tools::{to_tool_definitions, ToolInvocation};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::execution::QueryOutcome;

/// Drives one query through the completion API and, when the model asks for
/// it, through exactly one tool call.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    options: ChatOptions,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, options: ChatOptions) -> Self {
        Self { llm, options }
    }

    /// Build an orchestrator backed by the OpenAI-compatible client
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self> {
        config.validate()?;
        let client = OpenAiClient::new(config)?;
        Ok(Self::new(Arc::new(client), ChatOptions::from(&config.params)))
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer one query.
    ///
    /// The conversation starts fresh for every call and is dropped when it
    /// returns. Only the first tool call of the first completion is
    /// dispatched; the follow-up completion is sent without tools.
    pub async fn process_query(
        &self,
        provider: &mut dyn ToolProvider,
        query: &str,
    ) -> Result<QueryOutcome> {
        let mut messages = vec![LlmMessage::user(query)];

        let tools = provider.list_tools().await?;
        let definitions = to_tool_definitions(&tools);
        debug!(tools = definitions.len(), model = self.llm.model_name(), "first completion");

        // completion APIs reject an empty tools array
        let definitions = (!definitions.is_empty()).then_some(definitions);
        let response = self
            .llm
            .chat_completion(messages.clone(), definitions, Some(self.options.clone()))
            .await?;

        if !response.wants_tool_call() {
            return Ok(QueryOutcome::direct(answer_text(&response)));
        }

        let (id, name, raw_arguments) = first_tool_call(&response)?;
        let invocation = ToolInvocation::parse(&id, &name, &raw_arguments)?;

        if !tools.iter().any(|t| t.name == invocation.name) {
            return Err(SessionError::tool(
                &invocation.name,
                "the model requested a tool the provider does not offer",
            )
            .into());
        }

        info!(
            tool = %invocation.name,
            arguments = %invocation.arguments_json(),
            "dispatching tool call"
        );
        let result = provider
            .call_tool(&invocation.name, invocation.arguments.clone())
            .await?;
        debug!(
            tool = %invocation.name,
            duration_ms = ?result.duration_ms,
            bytes = result.content.len(),
            "tool call returned"
        );

        messages.push(LlmMessage::assistant_tool_call(
            response.message.get_text(),
            &id,
            &name,
            &raw_arguments,
        ));
        messages.push(LlmMessage::tool_result(&id, &result.content));

        let follow_up = self
            .llm
            .chat_completion(messages, None, Some(self.options.clone()))
            .await?;

        Ok(QueryOutcome::with_tool(
            answer_text(&follow_up),
            invocation,
            result,
        ))
    }
}

fn answer_text(response: &LlmResponse) -> String {
    response.message.get_text().unwrap_or_default()
}

/// Pull the first requested tool call out of a completion, warning about any
/// that are dropped.
fn first_tool_call(response: &LlmResponse) -> Result<(String, String, String)> {
    let tool_uses = response.message.get_tool_uses();

    if tool_uses.len() > 1 {
        let dropped: Vec<&str> = tool_uses[1..]
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        warn!(?dropped, "model requested several tool calls, only the first is dispatched");
    }

    match tool_uses.first() {
        Some(ContentBlock::ToolUse {
            id,
            name,
            arguments,
        }) => Ok((id.clone(), name.clone(), arguments.clone())),
        _ => Err(LlmError::InvalidResponse {
            message: "finish reason was tool_calls but no tool call was returned".to_string(),
        }
        .into()),
    }
}
