/// Hand-written `Display` rather than a `thiserror` derive. This enum has
/// no error sources to chain and no `#[from]` conversions to generate.
#[derive(Debug, Clone)]
pub enum ProviderCoreError {
    UnknownCredential(String),
    RefreshFailed(String),
    Unsupported(&'static str),
    InvalidConfig(String),
    Other(String),
}

impl std::fmt::Display for ProviderCoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderCoreError::UnknownCredential(id) => write!(f, "unknown credential: {id}"),
            ProviderCoreError::RefreshFailed(msg) => write!(f, "refresh failed: {msg}"),
            ProviderCoreError::Unsupported(op) => write!(f, "unsupported operation: {op}"),
            ProviderCoreError::InvalidConfig(msg) => write!(f, "invalid provider config: {msg}"),
            ProviderCoreError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ProviderCoreError {}
