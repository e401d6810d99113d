//! Chat templates for hosted causal language models
//!
//! Causal models take one flat prompt string. A template renders the
//! `{role, content}` turns into the markup the model was tuned on, and
//! knows the marker after which the model's own answer starts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prompt markup understood by a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTemplate {
    /// `[INST] ... [/INST]` with a `<<SYS>>` block in the first instruction
    Llama2,
    /// `<|system|>`, `<|user|>`, `<|assistant|>` sections ended by `</s>`
    Zephyr,
    /// `<|im_start|>role ... <|im_end|>`
    ChatMl,
}

impl ChatTemplate {
    /// Guess the template from a model id, e.g. `meta-llama/Llama-2-7b-chat-hf`
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        if model.contains("llama-2") || model.contains("llama2") {
            ChatTemplate::Llama2
        } else if model.contains("zephyr") {
            ChatTemplate::Zephyr
        } else {
            ChatTemplate::ChatMl
        }
    }

    /// Marker preceding the assistant's answer
    pub fn assistant_marker(&self) -> &'static str {
        match self {
            ChatTemplate::Llama2 => "[/INST]",
            ChatTemplate::Zephyr => "<|assistant|>",
            ChatTemplate::ChatMl => "<|im_start|>assistant",
        }
    }

    fn end_tokens(&self) -> &'static [&'static str] {
        match self {
            ChatTemplate::Llama2 | ChatTemplate::Zephyr => &["</s>"],
            ChatTemplate::ChatMl => &["<|im_end|>", "<|endoftext|>"],
        }
    }

    /// Render `{role, content}` turns into a prompt ending where the model should answer
    pub fn render(&self, messages: &[Value]) -> String {
        let turns = messages.iter().map(|message| {
            let role = message.get("role").and_then(Value::as_str).unwrap_or("user");
            let content = message.get("content").and_then(Value::as_str).unwrap_or("");
            (role, content)
        });

        match self {
            ChatTemplate::Llama2 => {
                let mut prompt = String::new();
                let mut system: Option<&str> = None;
                for (role, content) in turns {
                    match role {
                        "system" => system = Some(content),
                        "assistant" => {
                            prompt.push(' ');
                            prompt.push_str(content.trim());
                            prompt.push_str(" </s>");
                        }
                        _ => {
                            prompt.push_str("<s>[INST] ");
                            if let Some(system) = system.take() {
                                prompt.push_str("<<SYS>>\n");
                                prompt.push_str(system.trim());
                                prompt.push_str("\n<</SYS>>\n\n");
                            }
                            prompt.push_str(content.trim());
                            prompt.push_str(" [/INST]");
                        }
                    }
                }
                prompt
            }
            ChatTemplate::Zephyr => {
                let mut prompt = String::new();
                for (role, content) in turns {
                    prompt.push_str(&format!("<|{}|>\n{}</s>\n", zephyr_role(role), content));
                }
                prompt.push_str("<|assistant|>\n");
                prompt
            }
            ChatTemplate::ChatMl => {
                let mut prompt = String::new();
                for (role, content) in turns {
                    prompt.push_str(&format!("<|im_start|>{}\n{}<|im_end|>\n", role, content));
                }
                prompt.push_str("<|im_start|>assistant\n");
                prompt
            }
        }
    }

    /// Extract the answer from generated text
    ///
    /// Keeps whatever follows the last assistant marker, without end tokens
    /// or surrounding whitespace.
    pub fn parse_response(&self, generated: &str) -> String {
        let mut answer = generated
            .rsplit(self.assistant_marker())
            .next()
            .unwrap_or(generated)
            .trim();
        for token in self.end_tokens() {
            if let Some(stripped) = answer.strip_suffix(token) {
                answer = stripped.trim_end();
            }
        }
        answer.to_string()
    }
}

fn zephyr_role(role: &str) -> &str {
    match role {
        "system" | "assistant" => role,
        _ => "user",
    }
}
