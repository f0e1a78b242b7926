pub mod health;
pub mod pool;
pub mod state;

pub use health::HealthManager;
pub use pool::{Credential, CredentialPool, CredentialSecret, CredentialSnapshot, OAuthRefresher};
pub use state::{CredentialId, CredentialKey, CredentialLifecycleState, UnavailableReason};
