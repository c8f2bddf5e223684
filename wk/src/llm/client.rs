//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call carries its whole conversation
///
/// Sessions keep history on their side and replay it on every call, so one
/// client can serve any number of sessions. Implementations make exactly one
/// attempt per call; transient failures are handled by the retry policy.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
