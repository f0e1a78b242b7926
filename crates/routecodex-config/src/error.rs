use thiserror::Error;

/// Fail-fast taxonomy for config resolution: every variant names the
/// offending path or reference so the CLI can print something
/// actionable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("credential file not found: {path}")]
    MissingCredentialFile { path: String },

    #[error("routing category {category:?} references unknown provider {provider:?}")]
    DanglingRoute { category: String, provider: String },

    #[error(
        "routing category {category:?} references unknown model {model:?} for provider {provider:?}"
    )]
    DanglingModel {
        category: String,
        provider: String,
        model: String,
    },

    #[error(
        "routing category {category:?} references unknown credential alias {alias:?} for provider {provider:?}"
    )]
    DanglingCredentialAlias {
        category: String,
        provider: String,
        alias: String,
    },

    #[error("routing category {category:?} has no matching pipelines")]
    EmptyPool { category: String },

    #[error("pipeline {pipeline_id:?} references unknown credential {credential_id:?}")]
    DanglingPipelineCredential {
        pipeline_id: String,
        credential_id: String,
    },

    #[error("invalid httpServer port: {0}")]
    InvalidPort(u32),

    #[error("provider {provider:?} declares no credentials")]
    NoCredentials { provider: String },

    #[error("provider {provider:?} declares no models in modelCatalog")]
    NoModels { provider: String },
}
