//! Error types for the extraction pipeline.
//!
//! Every failure an extraction can hit is classified into [`ExtractError`].
//! The classification drives the retry policy: [`ExtractError::is_retryable`]
//! is the single source of truth for whether the retry controller may try
//! again, and [`ExtractError::retry_delay`] surfaces a server-mandated wait
//! (HTTP `Retry-After`) when one was given.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Closed, machine-checkable failure classification.
///
/// [`ExtractError`] messages are for humans and may change; `ErrorKind` is the
/// stable code callers (and the high-level result type) match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport-level failure (connection refused/reset/timeout) or HTTP 5xx.
    Network,
    /// HTTP 429.
    RateLimited,
    /// HTTP 401/403.
    Auth,
    /// Any other 4xx.
    Request,
    /// Model output was not the expected JSON shape.
    Parse,
    /// All retryable attempts were consumed.
    ExhaustedRetries,
    /// Malformed field schema.
    Schema,
    /// Invalid client or retry configuration.
    Config,
}

/// Errors produced by schema validation, transport, retry, and response parsing.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transport-level failure or HTTP 5xx. Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 429. Retryable, optionally carrying the server's `Retry-After`.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// HTTP 401/403. Never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other 4xx. Never retried.
    #[error("request rejected (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    /// Model output was not valid JSON or lacked the expected shape. Never retried.
    #[error("failed to parse model output: {0}")]
    Parse(String),

    /// Every retryable attempt failed; wraps the last classified failure.
    #[error("all {attempts} attempts failed, last error: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<ExtractError>,
    },

    /// The field schema itself is malformed.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Invalid [`RetryConfig`](crate::backend::RetryConfig) or client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ExtractError {
    /// Whether the retry controller may attempt this request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::Network(_) | ExtractError::RateLimited { .. }
        )
    }

    /// Server-mandated minimum wait before retrying, if one was provided.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            ExtractError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// The stable machine-checkable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Network(_) => ErrorKind::Network,
            ExtractError::RateLimited { .. } => ErrorKind::RateLimited,
            ExtractError::Auth(_) => ErrorKind::Auth,
            ExtractError::Request { .. } => ErrorKind::Request,
            ExtractError::Parse(_) => ErrorKind::Parse,
            ExtractError::ExhaustedRetries { .. } => ErrorKind::ExhaustedRetries,
            ExtractError::Schema(_) => ErrorKind::Schema,
            ExtractError::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_rate_limit_are_retryable() {
        assert!(ExtractError::Network("connection reset".into()).is_retryable());
        assert!(ExtractError::RateLimited {
            message: "slow down".into(),
            retry_after: None,
        }
        .is_retryable());
    }

    #[test]
    fn fatal_errors_are_not_retryable() {
        assert!(!ExtractError::Auth("bad key".into()).is_retryable());
        assert!(!ExtractError::Request {
            status: 400,
            message: "bad request".into(),
        }
        .is_retryable());
        assert!(!ExtractError::Parse("not json".into()).is_retryable());
        assert!(!ExtractError::ExhaustedRetries {
            attempts: 3,
            last: Box::new(ExtractError::Network("down".into())),
        }
        .is_retryable());
    }

    #[test]
    fn retry_delay_only_from_rate_limit() {
        let err = ExtractError::RateLimited {
            message: "slow down".into(),
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.retry_delay(), Some(Duration::from_secs(2)));
        assert_eq!(ExtractError::Network("x".into()).retry_delay(), None);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            ExtractError::Auth("no".into()).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            ExtractError::ExhaustedRetries {
                attempts: 4,
                last: Box::new(ExtractError::Network("down".into())),
            }
            .kind(),
            ErrorKind::ExhaustedRetries
        );
    }
}
