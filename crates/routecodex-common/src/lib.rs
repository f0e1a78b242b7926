//! Shared primitives used across the workspace: the gateway's error
//! taxonomy and request dialect enum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven error categories the gateway maps every failure into.
/// Names are categories, not concrete error types. Every crate boundary
/// maps its own errors into one of these before they reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Auth,
    RateLimit,
    Upstream,
    Timeout,
    Admission,
    Internal,
}

impl ErrorCategory {
    /// HTTP status mapping for this category.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::Auth => 401,
            ErrorCategory::RateLimit => 429,
            ErrorCategory::Upstream => 502,
            ErrorCategory::Timeout => 504,
            ErrorCategory::Admission => 503,
            ErrorCategory::Internal => 500,
        }
    }

    /// Whether the router may retry a request that failed with this
    /// category against a different pipeline.
    pub fn retriable(self) -> bool {
        matches!(self, ErrorCategory::RateLimit | ErrorCategory::Timeout)
    }

    pub fn type_tag(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation_error",
            ErrorCategory::Auth => "auth_error",
            ErrorCategory::RateLimit => "rate_limit_error",
            ErrorCategory::Upstream => "upstream_error",
            ErrorCategory::Timeout => "timeout_error",
            ErrorCategory::Admission => "admission_error",
            ErrorCategory::Internal => "internal_error",
        }
    }
}

/// A categorized gateway error. Carries an optional `pipeline_id` /
/// `credential_id` so the provider layer can tag the origin before the
/// router decides whether to retry.
#[derive(Debug)]
pub struct GatewayError {
    pub category: ErrorCategory,
    pub message: String,
    pub pipeline_id: Option<String>,
    pub credential_id: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GatewayError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            pipeline_id: None,
            credential_id: None,
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RateLimit, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Upstream, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, message)
    }

    pub fn admission(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Admission, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    pub fn with_pipeline(mut self, pipeline_id: impl Into<String>) -> Self {
        self.pipeline_id = Some(pipeline_id.into());
        self
    }

    pub fn with_credential(mut self, credential_id: impl Into<String>) -> Self {
        self.credential_id = Some(credential_id.into());
        self
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category.type_tag(), self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as _)
    }
}

/// Error envelope wire shape: `{"error":{"message","type","code"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelopeBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(err: &GatewayError) -> Self {
        ErrorEnvelope {
            error: ErrorEnvelopeBody {
                message: err.message.clone(),
                error_type: err.category.type_tag().to_string(),
                code: err.category.type_tag().to_string(),
            },
        }
    }
}

/// The three supported request dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dialect {
    OpenaiChat,
    AnthropicMessages,
    CodexResponses,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::OpenaiChat => "openaiChat",
            Dialect::AnthropicMessages => "anthropicMessages",
            Dialect::CodexResponses => "codexResponses",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_all_categories() {
        assert_eq!(ErrorCategory::Validation.http_status(), 400);
        assert_eq!(ErrorCategory::RateLimit.http_status(), 429);
        assert_eq!(ErrorCategory::Admission.http_status(), 503);
    }

    #[test]
    fn only_rate_limit_and_timeout_are_retriable() {
        for cat in [
            ErrorCategory::Validation,
            ErrorCategory::Auth,
            ErrorCategory::Upstream,
            ErrorCategory::Admission,
            ErrorCategory::Internal,
        ] {
            assert!(!cat.retriable());
        }
        assert!(ErrorCategory::RateLimit.retriable());
        assert!(ErrorCategory::Timeout.retriable());
    }
}
