//! Conversation state
//!
//! A [`ChatContext`] owns the system prompt and the ordered exchange history of
//! one conversation. It performs no I/O: the agent feeds it exchanges and asks
//! it for the formatted request of the next turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentError;
use crate::core::format::{PayloadFormat, PromptFormatter, ProviderPayload};
use crate::core::types::{
    Exchange, Message, PromptTurn, ResponseTurn, Role, UsageMetadata,
};

/// History of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    id: Uuid,
    created_at: DateTime<Utc>,
    system_prompt: Message,
    history: Vec<Exchange>,
    format: PayloadFormat,
    #[serde(default)]
    usage: UsageMetadata,
}

impl ChatContext {
    /// Start an empty conversation
    pub fn new(system_prompt: impl Into<String>, format: PayloadFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            system_prompt: Message::system(system_prompt),
            history: Vec::new(),
            format,
            usage: UsageMetadata::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn system_prompt(&self) -> &Message {
        &self.system_prompt
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Number of recorded exchanges
    pub fn chat_length(&self) -> usize {
        self.history.len()
    }

    /// Tokens consumed by this conversation so far
    pub fn usage(&self) -> UsageMetadata {
        self.usage
    }

    /// The request for `pending`: `[system] + flatten(history) + [pending]`
    pub fn formatted_prompt(&self, pending: &PromptTurn) -> ProviderPayload {
        self.format
            .formatter()
            .format(&self.system_prompt, &self.history, pending)
    }

    /// Append one exchange
    ///
    /// The prompt must come from the user or a tool and the response from the
    /// assistant; anything else is rejected without touching the history.
    pub fn add_exchange(
        &mut self,
        prompt: PromptTurn,
        response: ResponseTurn,
    ) -> Result<(), AgentError> {
        let prompt_role = prompt.role();
        if !matches!(prompt_role, Role::User | Role::Tool) {
            return Err(AgentError::InvalidTurn(format!(
                "prompt must come from `user` or `tool`, not `{}`",
                prompt_role.as_str()
            )));
        }
        let response_role = response.role();
        if response_role != Role::Assistant {
            return Err(AgentError::InvalidTurn(format!(
                "response must come from `assistant`, not `{}`",
                response_role.as_str()
            )));
        }
        self.history.push(Exchange { prompt, response });
        Ok(())
    }

    /// Accumulate token usage reported for a reply
    pub fn record_usage(&mut self, usage: &UsageMetadata) {
        self.usage.add(usage);
    }

    /// Drop every exchange after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.history.truncate(len);
    }

    /// Clear the history and usage; the system prompt is kept
    pub fn reset(&mut self) {
        self.history.clear();
        self.usage = UsageMetadata::default();
    }

    /// Serialize for external persistence
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuild a context persisted with [`ChatContext::to_json`]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Single-shot prompt state: a system prompt and no history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionContext {
    system_prompt: Message,
    format: PayloadFormat,
}

impl CompletionContext {
    pub fn new(system_prompt: impl Into<String>, format: PayloadFormat) -> Self {
        Self {
            system_prompt: Message::system(system_prompt),
            format,
        }
    }

    pub fn system_prompt(&self) -> &Message {
        &self.system_prompt
    }

    /// `[system, prompt]`
    pub fn formatted_prompt(&self, prompt: &str) -> ProviderPayload {
        self.format
            .formatter()
            .format(&self.system_prompt, &[], &PromptTurn::user(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ToolCall, ToolResponse};

    fn text_exchange(user: &str, assistant: &str) -> (PromptTurn, ResponseTurn) {
        (
            PromptTurn::user(user),
            ResponseTurn::Message(Message::assistant(assistant)),
        )
    }

    #[test]
    fn test_new_context_is_empty() {
        let context = ChatContext::new("You are a helpful assistant.", PayloadFormat::RoleContent);
        assert_eq!(context.chat_length(), 0);
        assert_eq!(context.system_prompt().role, Role::System);

        let payload = context.formatted_prompt(&PromptTurn::user("hi"));
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.messages[0]["content"], "You are a helpful assistant.");
        assert_eq!(payload.messages[1]["content"], "hi");
    }

    #[test]
    fn test_formatted_prompt_orders_turns() {
        let mut context = ChatContext::new("sys", PayloadFormat::RoleContent);
        for i in 0..3 {
            let (prompt, response) = text_exchange(&format!("u{}", i), &format!("a{}", i));
            context.add_exchange(prompt, response).unwrap();
        }

        let payload = context.formatted_prompt(&PromptTurn::user("pending"));
        let contents: Vec<&str> = payload
            .messages
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec!["sys", "u0", "a0", "u1", "a1", "u2", "a2", "pending"]
        );
    }

    #[test]
    fn test_formatted_prompt_is_pure() {
        let mut context = ChatContext::new("sys", PayloadFormat::OpenAiTools);
        let (prompt, response) = text_exchange("hello", "hi");
        context.add_exchange(prompt, response).unwrap();

        let pending = PromptTurn::user("again");
        assert_eq!(context.formatted_prompt(&pending), context.formatted_prompt(&pending));
        assert_eq!(context.chat_length(), 1);
    }

    #[test]
    fn test_add_exchange_rejects_invalid_roles() {
        let mut context = ChatContext::new("sys", PayloadFormat::OpenAiTools);

        let result = context.add_exchange(
            PromptTurn::User(Message::assistant("not a user")),
            ResponseTurn::Message(Message::assistant("ok")),
        );
        assert!(matches!(result, Err(AgentError::InvalidTurn(_))));

        let result = context.add_exchange(
            PromptTurn::user("hello"),
            ResponseTurn::Message(Message::user("not an assistant")),
        );
        assert!(matches!(result, Err(AgentError::InvalidTurn(_))));
        assert_eq!(context.chat_length(), 0);
    }

    #[test]
    fn test_reset_keeps_system_prompt() {
        let mut context = ChatContext::new("sys", PayloadFormat::OpenAiTools);
        let (prompt, response) = text_exchange("hello", "hi");
        context.add_exchange(prompt, response).unwrap();
        context.record_usage(&UsageMetadata::new(10, 5));

        context.reset();

        assert_eq!(context.chat_length(), 0);
        assert_eq!(context.usage(), UsageMetadata::default());
        assert_eq!(context.system_prompt().text, "sys");
    }

    #[test]
    fn test_json_round_trip_preserves_formatted_prompt() {
        let mut context = ChatContext::new("sys", PayloadFormat::OpenAiTools);
        context
            .add_exchange(
                PromptTurn::user("status of 10050?"),
                ResponseTurn::ToolCall(ToolCall::new(
                    "get_order_status",
                    "call_1",
                    r#"{"order_id":"10050"}"#,
                )),
            )
            .unwrap();
        context
            .add_exchange(
                PromptTurn::Tool(ToolResponse::new("get_order_status", "call_1", "In Transit")),
                ResponseTurn::Message(Message::assistant("It is in transit.")),
            )
            .unwrap();

        let json = context.to_json().unwrap();
        let restored = ChatContext::from_json(&json).unwrap();

        let pending = PromptTurn::user("thanks");
        assert_eq!(restored, context);
        assert_eq!(restored.formatted_prompt(&pending), context.formatted_prompt(&pending));
    }

    #[test]
    fn test_completion_context_has_no_history() {
        let completion = CompletionContext::new("Translate to French.", PayloadFormat::RoleContent);
        let payload = completion.formatted_prompt("cheese");
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.messages[0]["role"], "system");
        assert_eq!(payload.messages[1]["content"], "cheese");
    }
}
