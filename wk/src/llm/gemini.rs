//! Gemini API client implementation
//!
//! Implements the LlmClient trait for the `generateContent` REST endpoint,
//! including the Google Search grounding tool and response-schema hints.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, LlmError, Message, Role, TokenUsage};
use crate::config::LlmConfig;
use crate::domain::GroundingSource;

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, web_search = request.web_search, "build_request_body: called");
        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens.min(self.max_tokens),
        });

        if let Some(schema) = &request.response_schema {
            debug!("build_request_body: adding response schema");
            generation_config["responseMimeType"] = serde_json::json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }

        let mut body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": self.convert_messages(&request.messages),
            "generationConfig": generation_config,
        });

        if request.web_search {
            debug!("build_request_body: enabling google search tool");
            body["tools"] = serde_json::json!([{ "googleSearch": {} }]);
        }

        body
    }

    /// Convert internal Message types to Gemini `contents`
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        debug!(message_count = %messages.len(), "convert_messages: called");
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.text }],
                })
            })
            .collect()
    }

    /// Parse the Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> CompletionResponse {
        debug!(candidates = api_response.candidates.len(), "parse_response: called");
        let usage = api_response
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            debug!("parse_response: no candidates");
            let reason = api_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| FinishReason::from_gemini(&r))
                .unwrap_or(FinishReason::Stop);
            return CompletionResponse {
                content: None,
                finish_reason: reason,
                sources: Vec::new(),
                usage,
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|g| {
                g.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter(|web| web.uri.as_deref().is_some_and(|u| !u.is_empty()))
                    .map(|web| GroundingSource {
                        uri: web.uri.unwrap_or_default(),
                        title: web.title.unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            finish_reason: candidate
                .finish_reason
                .as_deref()
                .map(FinishReason::from_gemini)
                .unwrap_or(FinishReason::Stop),
            sources,
            usage,
        }
    }
}

/// Pull the human-readable message out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<GeminiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.clone())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if status == 503 {
            let text = response.text().await.unwrap_or_default();
            debug!("complete: service overloaded (503)");
            return Err(LlmError::Overloaded(error_message(&text)));
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_message(&text),
            });
        }

        debug!("complete: success");
        let api_response: GeminiResponse = response.json().await?;
        Ok(self.parse_response(api_response))
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(max_tokens: u32) -> GeminiClient {
        // Constructed directly: from_config needs the API key env var
        GeminiClient {
            model: "gemini-2.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens,
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are Curate".to_string(),
            messages: vec![Message::model("{}"), Message::user("Make Saturday calmer")],
            max_tokens: 1000,
            temperature: 0.2,
            response_schema: None,
            web_search: true,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let body = client(16384).build_request_body(&request());

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Curate");
        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "Make Saturday calmer");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
        assert!(body["generationConfig"].get("responseSchema").is_none());
        assert!(body["tools"][0].get("googleSearch").is_some());
    }

    #[test]
    fn test_build_request_body_with_schema() {
        let mut req = request();
        req.web_search = false;
        req.response_schema = Some(serde_json::json!({"type": "OBJECT"}));

        let body = client(16384).build_request_body(&req);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_max_tokens_capped() {
        let mut req = request();
        req.max_tokens = 50_000;
        let body = client(1000).build_request_body(&req);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_parse_response_with_grounding() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"title\":"}, {"text": "\"x\"}"}]},
                "finishReason": "STOP",
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://example.com/a", "title": "A"}},
                    {"web": {"uri": "", "title": "empty"}},
                    {"retrievedContext": {}}
                ]}
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let resp = client(1000).parse_response(parsed);

        assert_eq!(resp.content.as_deref(), Some("{\"title\":\"x\"}"));
        assert!(resp.finish_reason.is_stop());
        assert_eq!(resp.sources.len(), 1);
        assert_eq!(resp.sources[0].uri, "https://example.com/a");
        assert_eq!(resp.usage.input_tokens, 10);
    }

    #[test]
    fn test_parse_response_blocked() {
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let resp = client(1000).parse_response(parsed);
        assert!(resp.content.is_none());
        assert_eq!(resp.finish_reason, FinishReason::Safety);

        let raw = r#"{"promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let resp = client(1000).parse_response(parsed);
        assert_eq!(resp.finish_reason, FinishReason::Other("PROHIBITED_CONTENT".to_string()));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}"#;
        assert_eq!(error_message(body), "The model is overloaded.");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
