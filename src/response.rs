//! Parsing and schema-checking of model output.
//!
//! The model must answer with a single JSON object
//! `{ "data": {...}, "confidence": n, "confidenceByField": {...} }`.
//! Anything else is a fatal parse error. A response that parses but has
//! field-level problems (missing required fields, type mismatches) still
//! validates: those problems are surfaced as [`FieldIssue`]s for the caller
//! to judge, never as a hard failure.

use crate::error::{ExtractError, Result};
use crate::schema::Schema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Why a field was flagged during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssueKind {
    /// A required field is absent (or null) in the model's `data`.
    MissingRequired,
    /// The field is present but its value does not match the declared type.
    TypeMismatch,
}

/// A per-field validation finding. Advisory, not fatal.
#[derive(Debug, Clone, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub kind: FieldIssueKind,
    pub message: String,
}

/// A successfully parsed model response, checked against the schema.
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    /// The model's extracted values, as returned (unknown keys are kept,
    /// they are not an error).
    pub data: Map<String, Value>,
    /// Overall self-reported confidence, clamped to `[0, 100]`; 0 when the
    /// model omitted it.
    pub confidence: f64,
    /// Per-field self-reported confidences, clamped to `[0, 100]`. Fields
    /// the model did not report on are absent, not defaulted.
    pub confidence_by_field: BTreeMap<String, f64>,
    /// Schema problems found in `data`, in schema field order.
    pub issues: Vec<FieldIssue>,
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Parse `raw` as the extraction response contract and check it against
/// `schema`.
///
/// Fails with a parse error when `raw` is not a JSON object or lacks a
/// `data` object; the pipeline treats that as fatal and never retries it.
pub fn validate_response(raw: &str, schema: &Schema) -> Result<ValidatedResponse> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| ExtractError::Parse(format!("model output is not valid JSON: {e}")))?;

    let root = root
        .as_object()
        .ok_or_else(|| ExtractError::Parse("model output is not a JSON object".into()))?;

    let data = root
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| {
            ExtractError::Parse("model output lacks a \"data\" object".into())
        })?
        .clone();

    let confidence = root
        .get("confidence")
        .and_then(Value::as_f64)
        .map(clamp_confidence)
        .unwrap_or(0.0);

    let confidence_by_field = root
        .get("confidenceByField")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(field, v)| {
                    v.as_f64().map(|n| (field.clone(), clamp_confidence(n)))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut issues = Vec::new();
    for (name, spec) in schema.iter() {
        match data.get(name) {
            None | Some(Value::Null) => {
                if spec.required {
                    issues.push(FieldIssue {
                        field: name.to_string(),
                        kind: FieldIssueKind::MissingRequired,
                        message: format!("required field '{name}' is missing"),
                    });
                }
            }
            Some(value) => {
                if !spec.field_type.accepts(value) {
                    issues.push(FieldIssue {
                        field: name.to_string(),
                        kind: FieldIssueKind::TypeMismatch,
                        message: format!(
                            "field '{name}' should be {} but got {value}",
                            spec.field_type
                        ),
                    });
                }
            }
        }
    }

    if issues.is_empty() {
        debug!(fields = data.len(), confidence, "Response validated cleanly");
    } else {
        warn!(issues = issues.len(), "Response validated with field issues");
    }

    Ok(ValidatedResponse {
        data,
        confidence,
        confidence_by_field,
        issues,
    })
}
