//! Orchestration: prompt → retried transport → validation.
//!
//! Two API tiers sit here. [`LlmClient::try_extract`] is fail-fast: any
//! classified failure propagates as an [`ExtractError`]. [`LlmClient::extract`]
//! never fails: every failure becomes an [`Extraction::Failure`] value, which
//! is what batch drivers use so one bad input cannot abort a run.

use crate::backend::prompt::build_messages;
use crate::backend::{HttpTransport, RetryConfig, RetryController, Transport};
use crate::error::{ErrorKind, ExtractError, Result};
use crate::response::{validate_response, FieldIssue, ValidatedResponse};
use crate::schema::Schema;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Connection settings for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub retries: RetryConfig,
}

impl LlmConfig {
    /// Config for `base_url` and `model` with no credential and the default
    /// retry policy.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            retries: RetryConfig::default(),
        }
    }

    /// Set the bearer credential sent with each request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Replace the retry policy.
    pub fn retries(mut self, retries: RetryConfig) -> Self {
        self.retries = retries;
        self
    }
}

/// One extraction to perform: the raw input, the target schema, and where
/// to send it. Suitable for batch drivers that build many of these.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub input: String,
    pub schema: Schema,
    pub config: LlmConfig,
}

/// An error entry in a failed [`Extraction`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub code: ErrorKind,
}

/// Outcome of the high-level tier.
///
/// `Success` means the call reached a parsed model response; field-level
/// problems ride along as `issues` rather than forcing a failure, so the
/// caller decides what quality is acceptable. `Failure` means the call never
/// produced a parseable response (exhausted retries, fatal transport error,
/// or unparsable output).
#[derive(Debug, Clone)]
pub enum Extraction {
    Success {
        data: Map<String, Value>,
        confidence: f64,
        confidence_by_field: BTreeMap<String, f64>,
        issues: Vec<FieldIssue>,
    },
    Failure {
        errors: Vec<ExtractionError>,
    },
}

impl Extraction {
    pub fn is_success(&self) -> bool {
        matches!(self, Extraction::Success { .. })
    }

    /// The extracted data, when the call succeeded.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            Extraction::Success { data, .. } => Some(data),
            Extraction::Failure { .. } => None,
        }
    }

    /// Overall confidence; 0 for failures.
    pub fn confidence(&self) -> f64 {
        match self {
            Extraction::Success { confidence, .. } => *confidence,
            Extraction::Failure { .. } => 0.0,
        }
    }

    /// Render the classic flat result shape
    /// (`{success, data?, confidence, confidenceByField?, errors}`).
    pub fn to_json(&self) -> Value {
        match self {
            Extraction::Success {
                data,
                confidence,
                confidence_by_field,
                issues,
            } => json!({
                "success": true,
                "data": data,
                "confidence": confidence,
                "confidenceByField": confidence_by_field,
                "issues": issues,
            }),
            Extraction::Failure { errors } => json!({
                "success": false,
                "confidence": 0.0,
                "errors": errors,
            }),
        }
    }
}

impl From<ValidatedResponse> for Extraction {
    fn from(validated: ValidatedResponse) -> Self {
        Extraction::Success {
            data: validated.data,
            confidence: validated.confidence,
            confidence_by_field: validated.confidence_by_field,
            issues: validated.issues,
        }
    }
}

/// Client for running extractions against one endpoint/model pair.
pub struct LlmClient {
    transport: Arc<dyn Transport>,
    controller: RetryController,
}

impl LlmClient {
    /// Create a client for the given endpoint.
    ///
    /// Fails when `base_url` or `model` is empty.
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ExtractError::Config("base_url must not be empty".into()));
        }
        if config.model.trim().is_empty() {
            return Err(ExtractError::Config("model must not be empty".into()));
        }
        let transport = Arc::new(HttpTransport::new(
            &config.base_url,
            &config.model,
            config.api_key.clone(),
        ));
        Ok(Self {
            transport,
            controller: RetryController::new(config.retries),
        })
    }

    /// Assemble a client from explicit parts. This is the seam tests and
    /// alternative transports use.
    pub fn from_parts(transport: Arc<dyn Transport>, controller: RetryController) -> Self {
        Self {
            transport,
            controller,
        }
    }

    /// Low-level, fail-fast tier: run the full pipeline and propagate any
    /// classified failure.
    pub async fn try_extract(&self, schema: &Schema, input: &str) -> Result<ValidatedResponse> {
        let messages = build_messages(schema, input);
        debug!(fields = schema.len(), input_len = input.len(), "Starting extraction");

        let transport = Arc::clone(&self.transport);
        let raw = self
            .controller
            .execute(|| {
                let transport = Arc::clone(&transport);
                let messages = messages.clone();
                async move { transport.send(&messages).await }
            })
            .await?;

        let validated = validate_response(&raw, schema)?;
        info!(
            confidence = validated.confidence,
            issues = validated.issues.len(),
            "Extraction complete"
        );
        Ok(validated)
    }

    /// High-level tier: never fails. Any failure is folded into
    /// [`Extraction::Failure`] with a machine-checkable code.
    pub async fn extract(&self, schema: &Schema, input: &str) -> Extraction {
        match self.try_extract(schema, input).await {
            Ok(validated) => validated.into(),
            Err(err) => Extraction::Failure {
                errors: vec![ExtractionError {
                    field: None,
                    message: err.to_string(),
                    code: err.kind(),
                }],
            },
        }
    }
}

/// Run one self-contained [`ExtractionRequest`]. Convenience for batch
/// drivers; never fails.
pub async fn extract(request: &ExtractionRequest) -> Extraction {
    match LlmClient::new(request.config.clone()) {
        Ok(client) => client.extract(&request.schema, &request.input).await,
        Err(err) => Extraction::Failure {
            errors: vec![ExtractionError {
                field: None,
                message: err.to_string(),
                code: err.kind(),
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ChatMessage;
    use async_trait::async_trait;

    struct CannedTransport {
        content: String,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.content.clone())
        }
    }

    fn schema() -> Schema {
        Schema::builder()
            .field(
                "name",
                crate::schema::FieldSpec::new(crate::schema::FieldType::String),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn high_level_tier_converts_parse_failures_into_values() {
        let client = LlmClient::from_parts(
            Arc::new(CannedTransport {
                content: "not json at all".into(),
            }),
            RetryController::new(RetryConfig::default()),
        );

        let result = client.extract(&schema(), "Name: Test").await;
        assert!(!result.is_success());
        match result {
            Extraction::Failure { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, ErrorKind::Parse);
            }
            Extraction::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn success_carries_data_and_confidences() {
        let content = serde_json::json!({
            "data": { "name": "Test" },
            "confidence": 95,
            "confidenceByField": { "name": 95 }
        })
        .to_string();

        let client = LlmClient::from_parts(
            Arc::new(CannedTransport { content }),
            RetryController::new(RetryConfig::default()),
        );

        let result = client.extract(&schema(), "Name: Test").await;
        assert!(result.is_success());
        assert_eq!(result.data().unwrap()["name"], "Test");
        assert_eq!(result.confidence(), 95.0);
    }

    #[test]
    fn client_rejects_empty_endpoint_or_model() {
        assert!(LlmClient::new(LlmConfig::new("", "llama3")).is_err());
        assert!(LlmClient::new(LlmConfig::new("http://localhost:11434/v1", "")).is_err());
    }

    #[test]
    fn failure_json_shape_has_success_false() {
        let failure = Extraction::Failure {
            errors: vec![ExtractionError {
                field: None,
                message: "all 3 attempts failed".into(),
                code: ErrorKind::ExhaustedRetries,
            }],
        };
        let rendered = failure.to_json();
        assert_eq!(rendered["success"], false);
        assert_eq!(rendered["errors"][0]["code"], "exhausted_retries");
    }
}
