//! Planner error types

use thiserror::Error;

use crate::llm::{FinishReason, LlmError};
use crate::sanitize::SanitizeError;

/// Message shown when the model stays overloaded after every retry
pub const BUSY_MESSAGE: &str = "Our AI architect is currently busy. Please try your request again in a moment.";

/// Errors surfaced by planning operations
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The model returned no text. Carries the finish reason when it was not a normal stop.
    #[error("The AI architect provided an empty response{}", .finish_reason.as_ref().map(|r| format!(" (blocked due to: {})", r)).unwrap_or_default())]
    EmptyResponse { finish_reason: Option<FinishReason> },

    #[error("Received malformed JSON from the AI architect: {0}")]
    MalformedJson(#[from] SanitizeError),

    /// Retries exhausted on an overloaded model
    #[error("Model overloaded after retries: {0}")]
    TransientOverload(#[source] LlmError),

    #[error("Incomplete itinerary: {}", .0.join("; "))]
    IncompleteItinerary(Vec<String>),

    #[error("Incomplete replacement, missing: {}", .0.join(", "))]
    IncompleteReplacement(Vec<String>),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Completion service error: {0}")]
    Llm(#[source] LlmError),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A model call is already in flight for this session
    #[error("Session is busy waiting for the model")]
    SessionBusy,
}

impl From<LlmError> for PlannerError {
    fn from(err: LlmError) -> Self {
        if err.is_overloaded() {
            PlannerError::TransientOverload(err)
        } else {
            PlannerError::Llm(err)
        }
    }
}

impl From<eyre::Report> for PlannerError {
    fn from(err: eyre::Report) -> Self {
        PlannerError::Prompt(err.to_string())
    }
}

impl PlannerError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PlannerError::TransientOverload(_))
    }

    /// Text suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::TransientOverload(_) => BUSY_MESSAGE.to_string(),
            PlannerError::Llm(e) if e.is_rate_limit() => BUSY_MESSAGE.to_string(),
            PlannerError::IncompleteReplacement(_) => {
                "Could not find a complete replacement. Try describing what you want differently.".to_string()
            }
            PlannerError::PlanNotFound(_) => "Could not load the requested plan.".to_string(),
            other => other.to_string(),
        }
    }
}
