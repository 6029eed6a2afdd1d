//! One-shot HTTP transport for OpenAI-compatible chat completions.
//!
//! [`HttpTransport`] performs exactly one `POST {base_url}/chat/completions`
//! per call and reports a classified outcome; no retry logic lives here.
//! Classification of a non-2xx status is a pure function
//! ([`classify_status`]) so the retry policy can be unit-tested without a
//! network.

use crate::backend::messages::ChatMessage;
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// A single classified chat-completion request.
///
/// Implementations send the message sequence once and either return the
/// assistant's raw text content or a classified [`ExtractError`]. The retry
/// controller drives this trait; tests substitute scripted implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Classify a non-2xx HTTP status into an [`ExtractError`].
///
/// 429 is retryable and carries the parsed `Retry-After` when present;
/// 401/403 are authentication failures; any other 4xx is a fatal request
/// error; 5xx is a retryable network-class failure.
pub fn classify_status(
    status: u16,
    message: String,
    retry_after: Option<Duration>,
) -> ExtractError {
    match status {
        401 | 403 => ExtractError::Auth(message),
        429 => ExtractError::RateLimited {
            message,
            retry_after,
        },
        400..=499 => ExtractError::Request { status, message },
        _ => ExtractError::Network(format!("HTTP {status}: {message}")),
    }
}

/// Parse a `Retry-After` header value given in seconds (integer or decimal).
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull the server's error message out of a non-2xx body, falling back to
/// the raw text when the `{"error": {"message": ...}}` envelope is absent.
fn extract_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("HTTP {status} with empty body")
            } else {
                body.to_string()
            }
        })
}

/// Reqwest-backed [`Transport`] for one OpenAI-compatible endpoint.
pub struct HttpTransport {
    base_url: String,
    model: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `{base_url}/chat/completions` with the given
    /// model name and optional bearer credential.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        debug!(url = %url, model = %self.model, messages = messages.len(), "Sending chat completion request");

        let mut builder = self.http.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        // Connection refused/reset/timeout are all retryable transport failures
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Transport-level request failure");
            ExtractError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            let body = response
                .text()
                .await
                .map_err(|e| ExtractError::Network(e.to_string()))?;
            let message = extract_error_message(&body, status.as_u16());

            let err = classify_status(status.as_u16(), message, retry_after);
            error!(status = %status, error = %err, "Chat completion request failed");
            return Err(err);
        }

        let envelope: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Response body was not a chat completion envelope");
            ExtractError::Parse(format!("invalid chat completion envelope: {e}"))
        })?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ExtractError::Parse("chat completion returned no choices".into())
            })?;

        debug!(content_len = content.len(), "Received chat completion content");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn classifies_auth_failures_as_fatal() {
        for status in [401, 403] {
            let err = classify_status(status, "invalid api key".into(), None);
            assert_eq!(err.kind(), ErrorKind::Auth);
            assert!(!err.is_retryable());
            assert!(err.to_string().contains("invalid api key"));
        }
    }

    #[test]
    fn classifies_rate_limit_with_retry_after() {
        let err = classify_status(
            429,
            "rate limit exceeded".into(),
            Some(Duration::from_secs(7)),
        );
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn classifies_other_4xx_as_fatal_request_errors() {
        for status in [400, 404, 413, 422] {
            let err = classify_status(status, "bad".into(), None);
            assert_eq!(err.kind(), ErrorKind::Request);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn classifies_5xx_as_retryable() {
        for status in [500, 502, 503, 504] {
            let err = classify_status(status, "upstream died".into(), None);
            assert_eq!(err.kind(), ErrorKind::Network);
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn parses_integer_and_decimal_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("0"), Some(Duration::from_secs(0)));
        assert_eq!(
            parse_retry_after("1.5"),
            Some(Duration::from_secs_f64(1.5))
        );
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-2"), None);
    }

    #[test]
    fn extracts_server_error_message_from_envelope() {
        let body = r#"{"error": {"message": "Invalid API key"}}"#;
        assert_eq!(extract_error_message(body, 401), "Invalid API key");
    }

    #[test]
    fn falls_back_to_raw_body_without_envelope() {
        assert_eq!(extract_error_message("gateway exploded", 502), "gateway exploded");
        assert_eq!(extract_error_message("  ", 502), "HTTP 502 with empty body");
    }

    #[test]
    fn decodes_completion_envelope_content() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "llama3",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": "{\"data\":{}}" },
                    "finish_reason": "stop"
                }
            ]
        }"#;
        let envelope: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.choices[0].message.content, "{\"data\":{}}");
    }
}
