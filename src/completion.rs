use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message role ("system" or "user")
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A completion request: a model identifier plus an ordered list of
/// role-tagged messages.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Messages in send order
    pub messages: Vec<ChatMessage>,
}

/// Text-completion service boundary.
///
/// The hosted service is treated as opaque: messages in, free-form text
/// out. Implementations must not retain state between calls so that
/// identical requests against an idempotent service stay idempotent.
pub trait CompletionService {
    /// Sends one completion request and returns the response text.
    ///
    /// # Errors
    ///
    /// Returns a classified completion error: rate-limit, invalid
    /// model/access, generic service failure, or unexpected failure.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

// Wire types for the OpenAI-compatible chat endpoint.

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
}

/// Blocking client for an OpenAI-compatible chat-completion endpoint.
///
/// The single network call is the pipeline's only suspension point; it
/// is bounded by the configured request timeout so an abandoned request
/// cannot hang the caller indefinitely.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a client from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API credential is configured or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::config(format!(
                "no API key configured; set one on the builder or via {}",
                crate::config::API_KEY_ENV
            ))
        })?;

        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CompletionService for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, messages = request.messages.len(), "sending completion request");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::unexpected("completion request timed out")
                } else {
                    Error::unexpected(format!("completion request failed: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let (message, code) = match serde_json::from_str::<ApiError>(&body) {
                Ok(parsed) => (parsed.error.message, parsed.error.code),
                Err(_) => (body, None),
            };
            return Err(classify_failure(&request.model, status, message, code));
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| Error::unexpected(format!("malformed completion response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::unexpected("completion response contained no choices"))
    }
}

/// Maps an error response from the completion endpoint onto the error
/// taxonomy. Classification is by HTTP status, with the service's error
/// code refining model-related failures.
pub(crate) fn classify_failure(
    model: &str,
    status: u16,
    message: String,
    code: Option<String>,
) -> Error {
    if status == 429 {
        return Error::RateLimited { message };
    }

    if matches!(status, 401 | 403 | 404) || code.as_deref() == Some("model_not_found") {
        return Error::InvalidModel {
            model: model.to_string(),
            message,
        };
    }

    Error::Service { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = CompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("usr")],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_failure("gpt-4", 429, "quota exceeded".to_string(), None);
        assert!(matches!(err, Error::RateLimited { .. }));
    }

    #[test]
    fn test_classify_invalid_model_by_status() {
        for status in [401, 403, 404] {
            let err = classify_failure("gpt-4", status, "nope".to_string(), None);
            assert!(matches!(err, Error::InvalidModel { .. }), "status {status}");
        }
    }

    #[test]
    fn test_classify_invalid_model_by_code() {
        let err = classify_failure(
            "gpt-unknown",
            400,
            "unknown model".to_string(),
            Some("model_not_found".to_string()),
        );
        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[test]
    fn test_classify_generic_service_error() {
        let err = classify_failure("gpt-4", 500, "server on fire".to_string(), None);
        assert!(matches!(err, Error::Service { status: 500, .. }));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"content":"memo text"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "memo text");
    }

    #[test]
    fn test_api_error_parsing() {
        let body = r#"{"error":{"message":"no such model","code":"model_not_found","type":"x"}}"#;
        let parsed: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.code.as_deref(), Some("model_not_found"));
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = Config::builder().build().unwrap();
        if config.api_key.is_none() {
            assert!(OpenAiClient::new(&config).is_err());
        }
    }
}
