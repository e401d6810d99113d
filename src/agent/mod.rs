//! Chat driver
//!
//! This module provides the agent that runs one user turn to completion:
//! - Formats the conversation and asks the provider for a reply
//! - Records every (prompt, response) exchange in the chat context
//! - Dispatches tool calls and feeds their results back to the model
//! - Loops until a plain-text reply or a tool ends the conversation

mod error;

pub use error::AgentError;

use tracing::{debug, info, warn};

use crate::context::{ChatContext, CompletionContext};
use crate::core::{
    provider::LlmProvider,
    types::{PromptTurn, ProviderReply, ResponseTurn, TerminalStatus},
};
use crate::tools::{Dispatch, ToolDeclaration, ToolDispatcher};

/// How a chat turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// The model answered in plain text
    Reply {
        text: String,
        /// The provider cut the reply off at the token limit
        truncated: bool,
    },
    /// A tool ended the conversation
    Ended(TerminalStatus),
}

impl ChatOutcome {
    /// Reply text, if the turn produced one
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatOutcome::Reply { text, .. } => Some(text),
            ChatOutcome::Ended(_) => None,
        }
    }
}

/// Drives conversations against one provider and one set of tools
pub struct Agent {
    /// LLM provider (OpenAI or HuggingFace)
    provider: Box<dyn LlmProvider>,

    /// Routes tool calls to their handlers
    dispatcher: Box<dyn ToolDispatcher>,

    /// Maximum tool calls answered within a single user turn (default: 10)
    max_tool_calls: usize,
}

impl Agent {
    /// Create a new agent with default settings
    pub fn new(provider: Box<dyn LlmProvider>, dispatcher: Box<dyn ToolDispatcher>) -> Self {
        Self {
            provider,
            dispatcher,
            max_tool_calls: 10,
        }
    }

    /// Set the per-turn tool call cap (default: 10)
    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    pub fn max_tool_calls(&self) -> usize {
        self.max_tool_calls
    }

    /// Declarations of the tools this agent can dispatch
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.dispatcher.declarations()
    }

    /// Start a conversation formatted for this agent's provider
    pub fn new_chat(&self, system_prompt: impl Into<String>) -> ChatContext {
        ChatContext::new(system_prompt, self.provider.payload_format())
    }

    /// Run one user turn
    ///
    /// Returns once the model replies in plain text or a tool ends the
    /// conversation. On error every exchange recorded during this turn is
    /// removed again, leaving `context` as it was before the call.
    pub async fn chat(
        &self,
        context: &mut ChatContext,
        user_text: impl Into<String>,
    ) -> Result<ChatOutcome, AgentError> {
        let checkpoint = context.chat_length();
        let result = self.run_turn(context, PromptTurn::user(user_text)).await;
        if result.is_err() {
            debug!(
                chat_id = %context.id(),
                dropped = context.chat_length() - checkpoint,
                "Rolling back failed turn"
            );
            context.truncate(checkpoint);
        }
        result
    }

    /// Clear the conversation, then run one user turn
    pub async fn chat_fresh(
        &self,
        context: &mut ChatContext,
        user_text: impl Into<String>,
    ) -> Result<ChatOutcome, AgentError> {
        context.reset();
        self.chat(context, user_text).await
    }

    async fn run_turn(
        &self,
        context: &mut ChatContext,
        mut pending: PromptTurn,
    ) -> Result<ChatOutcome, AgentError> {
        let mut tool_calls = 0;
        let tools = self.dispatcher.declarations();

        loop {
            let payload = context.formatted_prompt(&pending).with_tools(tools.clone());
            let reply = self.provider.get_response(&payload).await?;
            if let Some(usage) = &reply.usage {
                context.record_usage(usage);
            }
            let truncated = reply.is_truncated();

            context.add_exchange(pending, reply.turn.clone())?;

            match reply.turn {
                ResponseTurn::Message(message) => {
                    if truncated {
                        warn!(chat_id = %context.id(), "Reply was truncated at the token limit");
                    }
                    return Ok(ChatOutcome::Reply {
                        text: message.text,
                        truncated,
                    });
                }
                ResponseTurn::ToolCall(call) => {
                    tool_calls += 1;
                    if tool_calls > self.max_tool_calls {
                        return Err(AgentError::ToolCallLimitExceeded(self.max_tool_calls));
                    }

                    info!(
                        chat_id = %context.id(),
                        tool = %call.tool_name,
                        call_id = %call.call_id,
                        "Model requested tool"
                    );
                    match self.dispatcher.dispatch(&call).await? {
                        Dispatch::Continue(response) => pending = PromptTurn::Tool(response),
                        Dispatch::Terminate(status) => {
                            info!(chat_id = %context.id(), status = status.as_str(), "Conversation ended by tool");
                            return Ok(ChatOutcome::Ended(status));
                        }
                    }
                }
            }
        }
    }

    /// Start a single-shot completion context
    pub fn new_completion(&self, system_prompt: impl Into<String>) -> CompletionContext {
        CompletionContext::new(system_prompt, self.provider.payload_format())
    }

    /// Answer one prompt without history or tools
    pub async fn completion(
        &self,
        context: &CompletionContext,
        prompt: &str,
    ) -> Result<String, AgentError> {
        let payload = context.formatted_prompt(prompt);
        let reply = self.provider.get_response(&payload).await?;
        completion_text(reply)
    }

    /// Answer several prompts, one result per prompt in input order
    ///
    /// A failed prompt does not affect the others.
    pub async fn batch_completion<S: AsRef<str>>(
        &self,
        context: &CompletionContext,
        prompts: &[S],
    ) -> Vec<Result<String, AgentError>> {
        let payloads: Vec<_> = prompts
            .iter()
            .map(|prompt| context.formatted_prompt(prompt.as_ref()))
            .collect();

        self.provider
            .get_batch_response(&payloads)
            .await
            .into_iter()
            .map(|reply| completion_text(reply?))
            .collect()
    }
}

fn completion_text(reply: ProviderReply) -> Result<String, AgentError> {
    let truncated = reply.is_truncated();
    match reply.turn {
        ResponseTurn::Message(message) => {
            if truncated {
                warn!("Completion was truncated at the token limit");
            }
            Ok(message.text)
        }
        ResponseTurn::ToolCall(call) => Err(AgentError::UnexpectedToolCall {
            tool_name: call.tool_name,
        }),
    }
}
