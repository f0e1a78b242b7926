use routecodex_common::{ErrorCategory, GatewayError};
use thiserror::Error;

/// Router/runtime-local error type; converted to `GatewayError` at the
/// point the router hands a failed request back to the gateway layer,
/// tagged with the selected pipeline id and credential id.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("auth: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimit(String),
    #[error("upstream malfunction: {0}")]
    Upstream(String),
    #[error("upstream timeout: {0}")]
    Timeout(String),
    #[error("no eligible pipeline: {0}")]
    Admission(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RouterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RouterError::Validation(_) => ErrorCategory::Validation,
            RouterError::Auth(_) => ErrorCategory::Auth,
            RouterError::RateLimit(_) => ErrorCategory::RateLimit,
            RouterError::Upstream(_) => ErrorCategory::Upstream,
            RouterError::Timeout(_) => ErrorCategory::Timeout,
            RouterError::Admission(_) => ErrorCategory::Admission,
            RouterError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<RouterError> for GatewayError {
    fn from(err: RouterError) -> Self {
        let category = err.category();
        GatewayError::new(category, err.to_string())
    }
}
