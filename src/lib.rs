//! ordis: schema-first structured extraction from LLMs.
//!
//! # Overview
//!
//! ordis turns unstructured text into structured data matching a
//! caller-supplied field schema, using any OpenAI-compatible chat-completion
//! endpoint (a local Ollama, vLLM, or a hosted API). It owns the
//! prompt/retry/validation loop so callers get
//! `extract(input, schema) -> typed data` without building that plumbing
//! themselves:
//!
//! - deterministic prompt construction from the schema
//! - a fault-classifying HTTP client with exponential backoff, jitter, and
//!   `Retry-After` honoring
//! - response parsing and per-field validation with self-reported confidence
//!
//! # Quick start
//!
//! ```no_run
//! use ordis::{extract, ExtractionRequest, LlmConfig, Schema};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::validate(&json!({
//!     "fields": {
//!         "name": { "type": "string", "description": "Sender's full name" },
//!         "amount": { "type": "number" }
//!     }
//! }))?;
//!
//! let request = ExtractionRequest {
//!     input: "Invoice from Ada Lovelace, total $120.50".into(),
//!     schema,
//!     config: LlmConfig::new("http://localhost:11434/v1", "llama3"),
//! };
//!
//! let result = extract(&request).await;
//! if let Some(data) = result.data() {
//!     println!("name = {}", data["name"]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The two API tiers: [`LlmClient::extract`] never fails (batch callers keep
//! going after one bad input), [`LlmClient::try_extract`] propagates
//! classified [`ExtractError`]s for fail-fast callers.
//!
//! Cancellation/timeout is not part of the contract; callers that need to
//! abort mid-retry must layer that on externally.

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod response;
pub mod schema;

pub use backend::{ChatMessage, ChatRole, Delay, RetryConfig, RetryController, TokioDelay, Transport};
pub use error::{ErrorKind, ExtractError, Result};
pub use pipeline::{extract, Extraction, ExtractionError, ExtractionRequest, LlmClient, LlmConfig};
pub use response::{FieldIssue, FieldIssueKind, ValidatedResponse};
pub use schema::{FieldSpec, FieldType, Schema, SchemaBuilder};
