use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::credential::pool::CredentialSnapshot;
use crate::credential::state::UnavailableReason;
use crate::errors::ProviderCoreError;
use crate::headers::Headers;
use routecodex_transform::Proto;

/// Years-scale "effectively permanent" block used for auth failures. Auth
/// errors are not retried against the same credential until an operator
/// clears them.
const AUTH_INVALID_SECS: u64 = 60 * 60 * 24 * 365 * 10;

pub struct UpstreamCallContext {
    pub base_url: String,
    pub path: String,
    pub credential: CredentialSnapshot,
    pub headers: Headers,
    pub body: Bytes,
    pub stream: bool,
    pub timeout: Duration,
}

pub enum UpstreamOutcome {
    Buffered {
        status: u16,
        body: Bytes,
    },
    Streamed {
        status: u16,
        chunks: mpsc::Receiver<Result<Bytes, ProviderCoreError>>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct UnavailableDecision {
    pub duration: Option<Duration>,
    pub reason: UnavailableReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRetryAction {
    None,
    RetrySame,
    UpdateCredential,
}

/// What the provider stage observed on an upstream attempt, used both to
/// decide unavailability and to report stats/events.
#[derive(Debug, Clone)]
pub enum UpstreamFailure {
    Status { code: u16, retry_after_secs: Option<u64> },
    Timeout,
    ConnectFailed,
    TlsFailed,
}

pub fn default_decide_unavailable(failure: &UpstreamFailure) -> Option<UnavailableDecision> {
    match failure {
        UpstreamFailure::Status { code: 404, .. } => None,
        UpstreamFailure::Status { code: 429, retry_after_secs } => Some(UnavailableDecision {
            duration: Some(Duration::from_secs(retry_after_secs.unwrap_or(30))),
            reason: UnavailableReason::RateLimit,
        }),
        UpstreamFailure::Status { code: 401, .. } | UpstreamFailure::Status { code: 403, .. } => {
            Some(UnavailableDecision {
                duration: Some(Duration::from_secs(AUTH_INVALID_SECS)),
                reason: UnavailableReason::AuthInvalid,
            })
        }
        UpstreamFailure::Status { code, .. } if *code >= 500 => Some(UnavailableDecision {
            duration: Some(Duration::from_secs(10)),
            reason: UnavailableReason::Upstream5xx,
        }),
        UpstreamFailure::Status { .. } => None,
        UpstreamFailure::Timeout | UpstreamFailure::ConnectFailed | UpstreamFailure::TlsFailed => {
            Some(UnavailableDecision {
                duration: Some(Duration::from_secs(10)),
                reason: UnavailableReason::Timeout,
            })
        }
    }
}

/// The pluggable abstraction the pipeline assembler binds one instance of
/// per provider definition. Each concrete upstream (OpenAI-like REST,
/// Anthropic-like, OAuth-gated vendor) lives in `routecodex-provider-impl`.
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    fn name(&self) -> &str;

    /// The wire dialect this provider speaks natively; the compatibility
    /// stage only has work to do when this differs from the client's
    /// requested dialect.
    fn native_proto(&self) -> Proto;

    async fn execute(&self, ctx: UpstreamCallContext) -> Result<UpstreamOutcome, ProviderCoreError>;

    fn decide_unavailable(&self, failure: &UpstreamFailure) -> Option<UnavailableDecision> {
        default_decide_unavailable(failure)
    }

    fn on_auth_failure(&self) -> AuthRetryAction {
        AuthRetryAction::UpdateCredential
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderCoreError> {
        Err(ProviderCoreError::Unsupported("list_models"))
    }
}

pub fn recovery_instant(decision: &UnavailableDecision) -> Option<Instant> {
    decision.duration.map(|d| Instant::now() + d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_falls_back_to_30s_without_retry_after() {
        let decision = default_decide_unavailable(&UpstreamFailure::Status {
            code: 429,
            retry_after_secs: None,
        })
        .unwrap();
        assert_eq!(decision.duration, Some(Duration::from_secs(30)));
        assert_eq!(decision.reason, UnavailableReason::RateLimit);
    }

    #[test]
    fn not_found_is_not_an_unavailability_signal() {
        assert!(default_decide_unavailable(&UpstreamFailure::Status {
            code: 404,
            retry_after_secs: None,
        })
        .is_none());
    }

    #[test]
    fn auth_failure_blocks_for_effectively_permanent_duration() {
        let decision = default_decide_unavailable(&UpstreamFailure::Status {
            code: 401,
            retry_after_secs: None,
        })
        .unwrap();
        assert_eq!(decision.reason, UnavailableReason::AuthInvalid);
        assert!(decision.duration.unwrap() > Duration::from_secs(60 * 60 * 24 * 365));
    }
}
