//! Prompt construction from assembled memory contexts

use crate::error::{Error, Result};
use crate::llm::ChatMessage;
use crate::turn::MemoryContext;

/// Builds chat messages from a memory context and the current user query.
///
/// Message order mirrors the assembled context: profile facts first as a
/// system message, then retrieved memories as a system block, then the
/// recent-turn window verbatim, then the query as the final user message.
/// Empty sections are omitted entirely.
#[derive(Debug, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Construct the chat messages for one query
    pub fn build(&self, context: &MemoryContext, query: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::new();

        if !context.profile_facts.is_empty() {
            let lines: Vec<String> = context
                .profile_facts
                .iter()
                .map(|f| format!("- {}: {}", f.key, f.value))
                .collect();
            messages.push(ChatMessage::system(format!(
                "Known about the user:\n{}",
                lines.join("\n")
            )));
        }

        if !context.retrieved_turns.is_empty() {
            let lines: Vec<String> = context
                .retrieved_turns
                .iter()
                .map(|t| format!("- {}: {}", t.role, t.text))
                .collect();
            messages.push(ChatMessage::system(format!(
                "Relevant memories:\n{}",
                lines.join("\n")
            )));
        }

        for turn in &context.recent_turns {
            messages.push(ChatMessage {
                role: turn.role.into(),
                content: turn.text.clone(),
            });
        }

        messages.push(ChatMessage::user(query));
        messages
    }
}

/// Token counter using tiktoken
pub struct TokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TokenCounter {
    /// Create a new token counter for a specific model
    pub fn new(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| Error::config(format!("Failed to load tokenizer for {}: {}", model, e)))?;

        Ok(Self { bpe })
    }

    /// Create a token counter for GPT-family models
    pub fn for_gpt() -> Result<Self> {
        Self::new("gpt-4")
    }

    /// Count tokens in a text
    pub fn count(&self, text: &str) -> u32 {
        self.bpe.encode_with_special_tokens(text).len() as u32
    }

    /// Count tokens across a full message list
    pub fn count_messages(&self, messages: &[ChatMessage]) -> u32 {
        messages.iter().map(|m| self.count(&m.content)).sum()
    }

    /// Estimate tokens without using the tokenizer (faster, less accurate)
    pub fn estimate(text: &str) -> u32 {
        // ~4 characters per token is a reasonable estimate
        (text.len() / 4) as u32
    }
}
