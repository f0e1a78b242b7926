pub mod credential;
pub mod errors;
pub mod events;
pub mod headers;
pub mod provider;

pub use credential::{
    Credential, CredentialId, CredentialKey, CredentialLifecycleState, CredentialPool,
    CredentialSecret, CredentialSnapshot, HealthManager, OAuthRefresher, UnavailableReason,
};
pub use errors::ProviderCoreError;
pub use events::{Event, EventHub, EventSink, TracingEventSink};
pub use headers::Headers;
pub use provider::{
    default_decide_unavailable, recovery_instant, AuthRetryAction, UnavailableDecision,
    UpstreamCallContext, UpstreamFailure, UpstreamOutcome, UpstreamProvider,
};

// Re-export the transform crate's typed dialect vocabulary so downstream
// crates (router, gateway) depend on one place for it.
pub use routecodex_transform::{
    CanonicalRequest, CanonicalResponse, CompletionRequest, CompletionResponse, Op, Proto,
    StreamChunk, StreamFormat, TransformContext,
};
