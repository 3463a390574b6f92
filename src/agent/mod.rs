// Answering agent
// Wraps retrieved context into a system instruction and asks a chat-completion model

pub mod completion;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

pub use completion::{ApiKey, OpenAiCompatibleClient};

/// Persona and rules placed before the retrieved context
pub const DEFAULT_INSTRUCTION: &str = "You are an expert in the company's data warehouse (DWH). \
Answer questions about tables, fields, relations, business terms and SQL queries. \
Rely only on the context provided below. If the context does not contain the answer, \
say that you do not know instead of guessing. When asked for SQL, return a complete query \
using only the tables and fields that appear in the context.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A hosted model that turns a conversation into one reply
pub trait ChatCompletion: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

impl<C: ChatCompletion + ?Sized> ChatCompletion for Box<C> {
    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages)
    }
}

/// Answers questions from retrieved context through a completion client
pub struct RagAgent<C> {
    client: C,
    instruction: String,
}

impl<C: ChatCompletion> RagAgent<C> {
    #[inline]
    pub fn new(client: C) -> Self {
        Self::with_instruction(client, DEFAULT_INSTRUCTION)
    }

    #[inline]
    pub fn with_instruction(client: C, instruction: impl Into<String>) -> Self {
        Self {
            client,
            instruction: instruction.into(),
        }
    }

    #[inline]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[inline]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// System instruction with `context` embedded verbatim
    #[inline]
    pub fn system_prompt(&self, context: &str) -> String {
        format!("{}\n\nContext:\n{}\n", self.instruction, context)
    }

    /// The system and user messages sent for `query`, in that order
    #[inline]
    pub fn messages(&self, query: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt(context)),
            ChatMessage::user(query),
        ]
    }

    #[inline]
    pub fn answer(&self, query: &str, context: &str) -> Result<String> {
        debug!(
            "Answering query with {} characters of context",
            context.chars().count()
        );
        self.client.complete(&self.messages(query, context))
    }
}
