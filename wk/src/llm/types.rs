//! LLM request/response types
//!
//! Provider-agnostic shapes for one completion call. A call carries the full
//! conversation: the completion service is stateless, so history lives in the
//! caller's session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::GroundingSource;

/// A completion request - everything needed for one model call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction (rendered from a Handlebars template)
    pub system_prompt: String,

    /// Prior turns followed by the new user message
    pub messages: Vec<Message>,

    /// Max output tokens
    pub max_tokens: u32,

    /// Sampling temperature, kept low for repeatable plans
    pub temperature: f32,

    /// Response-schema hint for the schema-constrained path
    pub response_schema: Option<serde_json::Value>,

    /// Allow the model to ground answers with web search
    pub web_search: bool,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model message
    pub fn model(text: impl Into<String>) -> Self {
        debug!("Message::model: called");
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Web sources the answer was grounded on
    pub sources: Vec<GroundingSource>,

    /// Token usage
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A plain successful text response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: FinishReason::Stop,
            sources: Vec::new(),
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other(String),
}

impl FinishReason {
    /// Parse from the provider's finishReason string
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "FinishReason::from_gemini: called");
        match s {
            "STOP" | "FINISH_REASON_UNSPECIFIED" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            other => FinishReason::Other(other.to_string()),
        }
    }

    /// Normal completion
    pub fn is_stop(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "STOP"),
            FinishReason::MaxTokens => write!(f, "MAX_TOKENS"),
            FinishReason::Safety => write!(f, "SAFETY"),
            FinishReason::Recitation => write!(f, "RECITATION"),
            FinishReason::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Token usage
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text, "Hello");

        let msg = Message::model("{}");
        assert_eq!(msg.role, Role::Model);
    }

    #[test]
    fn test_message_history_serde() {
        let history = vec![Message::user("plan it"), Message::model("{\"title\": \"x\"}")];
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.contains("\"role\":\"model\""));
        let back: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_finish_reason_from_gemini() {
        assert_eq!(FinishReason::from_gemini("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_gemini("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_gemini("SAFETY"), FinishReason::Safety);
        assert_eq!(
            FinishReason::from_gemini("PROHIBITED_CONTENT"),
            FinishReason::Other("PROHIBITED_CONTENT".to_string())
        );
        assert_eq!(FinishReason::Safety.to_string(), "SAFETY");
        assert!(FinishReason::Stop.is_stop());
    }
}
