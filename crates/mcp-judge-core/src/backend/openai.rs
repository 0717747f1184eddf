//! OpenAI-compatible chat completions backend.

use super::{Backend, CompletionRequest};
use crate::error::{BackendErrorKind, JudgeError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Default API base; any OpenAI-compatible gateway works
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Environment variables checked for an API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["MCP_JUDGE_API_KEY", "OPENAI_API_KEY"];

const MAX_TOKENS: u32 = 2000;

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a backend using the key from `MCP_JUDGE_API_KEY` or `OPENAI_API_KEY`
    pub fn from_env(base_url: Option<&str>) -> Result<Self> {
        let api_key = resolve_api_key(None)?;
        Ok(Self::new(base_url.unwrap_or(DEFAULT_BASE_URL), api_key))
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": [
                {
                    "role": "system",
                    "content": request.system_prompt,
                },
                {
                    "role": "user",
                    "content": request.user_prompt,
                }
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature,
            "max_tokens": MAX_TOKENS,
        })
    }
}

/// Resolve an API key: explicit value, else the first non-empty env var
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    API_KEY_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            JudgeError::Configuration(format!(
                "{} environment variable must be set",
                API_KEY_ENV_VARS.join(" or ")
            ))
        })
}

pub(crate) fn classify_status(status: StatusCode) -> BackendErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => BackendErrorKind::RateLimit,
        _ => BackendErrorKind::Server,
    }
}

/// Pull `choices[0].message.content` out of a chat completion response
pub(crate) fn message_content(response: &serde_json::Value) -> Option<&str> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
}

/// POST a chat completions body and return the decoded JSON response
pub(crate) async fn post_chat_completion(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let response = client
        .post(format!("{}/v1/chat/completions", base_url))
        .header("Authorization", format!("Bearer {}", api_key))
        .json(body)
        .send()
        .await
        .map_err(|e| {
            JudgeError::backend(
                BackendErrorKind::Network,
                format!("failed to call chat completions API: {}", e),
            )
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(JudgeError::backend(
            classify_status(status),
            format!("chat completions request failed: {} - {}", status, error_text),
        ));
    }

    response.json().await.map_err(|e| {
        JudgeError::backend(
            BackendErrorKind::Malformed,
            format!("failed to parse chat completions response: {}", e),
        )
    })
}

#[async_trait]
impl Backend for OpenAiBackend {
    #[tracing::instrument(skip(self, request), fields(model = %request.model, base_url = %self.base_url))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response_json = post_chat_completion(
            &self.client,
            &self.base_url,
            &self.api_key,
            &Self::request_body(request),
        )
        .await?;

        let content = message_content(&response_json).ok_or_else(|| {
            JudgeError::backend(
                BackendErrorKind::Malformed,
                "invalid chat completions response format",
            )
        })?;

        tracing::debug!(bytes = content.len(), "backend_response");
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            system_prompt: "You are an expert evaluator.".to_string(),
            user_prompt: "Evaluate this".to_string(),
            schema: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"score\": true, \"reasoning\": \"ok\"}"}}]
            })))
            .mount(&mock_server)
            .await;

        let backend = OpenAiBackend::new(mock_server.uri(), "test-key");
        let content = backend.complete(&request()).await.unwrap();
        assert_eq!(content, "{\"score\": true, \"reasoning\": \"ok\"}");
    }

    #[tokio::test]
    async fn test_complete_sends_model_and_json_format() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{}"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = OpenAiBackend::new(format!("{}/", mock_server.uri()), "k");
        assert!(backend.complete(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_is_classified() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded"}
            })))
            .mount(&mock_server)
            .await;

        let backend = OpenAiBackend::new(mock_server.uri(), "test-key");
        let err = backend.complete(&request()).await.unwrap_err();
        match err {
            JudgeError::Backend { kind, message } => {
                assert_eq!(kind, BackendErrorKind::RateLimit);
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let backend = OpenAiBackend::new(mock_server.uri(), "bad-key");
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            JudgeError::Backend {
                kind: BackendErrorKind::Auth,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_content_field() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {}}]
            })))
            .mount(&mock_server)
            .await;

        let backend = OpenAiBackend::new(mock_server.uri(), "test-key");
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("invalid chat completions response format"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let backend = OpenAiBackend::new("http://127.0.0.1:9", "k");
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            JudgeError::Backend {
                kind: BackendErrorKind::Network,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_api_key_prefers_explicit() {
        assert_eq!(resolve_api_key(Some("sk-explicit")).unwrap(), "sk-explicit");
    }
}
