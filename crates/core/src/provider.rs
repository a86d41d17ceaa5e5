//! Provider trait — the abstraction over the external LLM collaborator.
//!
//! A provider knows how to take one assembled chat turn (system prompt plus
//! the current raw user messages) and return the model's reply text.
//! Conversation history is already embedded in the system prompt by the
//! assembler, so the message list stays role-free.
//!
//! Implementations: OpenAI-compatible endpoints (Groq, OpenAI), mocks in tests.

use crate::error::ProviderError;
use async_trait::async_trait;

/// One outbound model call, fully assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurnRequest {
    /// The model to use (e.g. "llama3-70b-8192", "gpt-4o-mini").
    pub model: String,

    /// The personality-styled system prompt, history window included.
    pub system_prompt: String,

    /// The current turn's raw input message(s), oldest first.
    pub messages: Vec<String>,

    /// Whether the caller asked for web-search augmentation. Accepted and
    /// forwarded; plain chat-completions backends ignore it.
    pub allow_search: bool,
}

/// The external model-invocation collaborator.
///
/// The gateway calls `complete()` without knowing which backend serves the
/// request. Failures surface as [`ProviderError`]; by the time a call is
/// issued the user's message is already durably stored, so a failure loses
/// only the reply.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "groq", "openai").
    fn name(&self) -> &str;

    /// Send one chat turn and get the reply text.
    async fn complete(
        &self,
        request: ChatTurnRequest,
    ) -> std::result::Result<String, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
