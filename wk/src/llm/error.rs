//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Model overloaded: {0}")]
    Overloaded(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if this error signals a transiently overloaded service
    ///
    /// This is the only class of error the retry policy tolerates. Besides
    /// the typed variants, any error whose message mentions "overloaded" or
    /// a 503 counts.
    pub fn is_overloaded(&self) -> bool {
        match self {
            LlmError::Overloaded(_) => true,
            LlmError::ApiError { status: 503, .. } => true,
            LlmError::RateLimited { .. } => false,
            other => {
                let msg = other.to_string().to_lowercase();
                msg.contains("overloaded") || msg.contains("503") || msg.contains("unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(err.is_rate_limit());

        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_is_overloaded() {
        assert!(LlmError::Overloaded("The model is overloaded".to_string()).is_overloaded());

        // 503 is overloaded regardless of message
        assert!(
            LlmError::ApiError {
                status: 503,
                message: "Service Unavailable".to_string()
            }
            .is_overloaded()
        );

        // message-based detection
        assert!(
            LlmError::ApiError {
                status: 500,
                message: "The model is overloaded. Please try again later.".to_string()
            }
            .is_overloaded()
        );
        assert!(LlmError::InvalidResponse("upstream returned 503".to_string()).is_overloaded());

        // everything else propagates
        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_overloaded()
        );
        assert!(
            !LlmError::RateLimited {
                retry_after: Duration::from_secs(5)
            }
            .is_overloaded()
        );
        assert!(!LlmError::InvalidResponse("Bad JSON".to_string()).is_overloaded());
    }
}
