use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::model::{
    AuthKind, CredentialDef, HttpServerDef, PipelineDef, PoolEntry, ProviderDef, RuntimeConfig,
    SecretRef, Warning,
};
use crate::raw::{RawCredentialDef, RawPoolEntry, RawSystemConfig, RawUserConfig};

fn read_and_parse<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let path_str = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path_str.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path_str,
        source,
    })
}

/// Resolves the user and system config files into a `RuntimeConfig`.
/// Parses both configs strictly, assigns key aliases, expands the
/// pipeline Cartesian product, and validates every cross-reference. Any
/// failure aborts with a structured `ConfigError`; nothing here opens a
/// socket or starts a background task.
pub fn resolve(
    user_path: impl AsRef<Path>,
    system_path: impl AsRef<Path>,
) -> Result<(RuntimeConfig, Vec<Warning>), ConfigError> {
    let user: RawUserConfig = read_and_parse(user_path.as_ref())?;
    let system: RawSystemConfig = if system_path.as_ref().exists() {
        read_and_parse(system_path.as_ref())?
    } else {
        RawSystemConfig::default()
    };

    let mut warnings = Vec::new();

    let mut providers = HashMap::new();
    let mut credentials = HashMap::new();
    let mut pipelines = HashMap::new();

    for (provider_id, raw_provider) in &user.providers {
        if raw_provider.model_catalog.is_empty() {
            return Err(ConfigError::NoModels {
                provider: provider_id.clone(),
            });
        }
        if raw_provider.credentials.is_empty() {
            return Err(ConfigError::NoCredentials {
                provider: provider_id.clone(),
            });
        }

        providers.insert(
            provider_id.clone(),
            ProviderDef {
                id: provider_id.clone(),
                base_url: raw_provider.base_url.clone(),
                protocol_dialect: raw_provider.protocol_dialect,
                timeout_ms: raw_provider.timeout_ms,
                headers: raw_provider.headers.clone(),
                model_catalog: raw_provider.model_catalog.clone(),
            },
        );

        // Key-alias normalization: aliases are assigned in source order,
        // independent of any other provider's aliases.
        let mut alias_by_index = Vec::with_capacity(raw_provider.credentials.len());
        for (index, raw_credential) in raw_provider.credentials.iter().enumerate() {
            let alias = format!("key{}", index + 1);
            let credential_id = format!("{provider_id}:{alias}");
            let (auth_kind, secret_ref) = resolve_credential(provider_id, raw_credential)?;

            credentials.insert(
                credential_id.clone(),
                CredentialDef {
                    id: credential_id.clone(),
                    provider_id: provider_id.clone(),
                    auth_kind,
                    alias_index: alias.clone(),
                    secret_ref,
                },
            );
            alias_by_index.push((alias, credential_id));
        }

        // Cartesian expansion of (provider x model x credential alias).
        for model in &raw_provider.model_catalog {
            for (alias, credential_id) in &alias_by_index {
                let pipeline_id = format!("{provider_id}:{model}:{alias}");
                let stage = system.stages.get(provider_id).cloned().unwrap_or_default();
                pipelines.insert(
                    pipeline_id.clone(),
                    PipelineDef {
                        id: pipeline_id,
                        provider_id: provider_id.clone(),
                        model_id: model.clone(),
                        credential_id: credential_id.clone(),
                        llm_switch_config: stage.llm_switch.clone(),
                        workflow_config: stage.workflow.clone(),
                        compatibility_config: stage.compatibility.clone(),
                        provider_config: stage.provider.clone(),
                    },
                );
            }
        }
    }

    // Route validation: every routing entry must resolve into at least
    // one existing pipeline; dangling references are fatal.
    let mut routing = HashMap::new();
    for (category, entries) in &user.routing {
        let mut pool = Vec::new();
        for entry in entries {
            pool.extend(resolve_pool_entry(category, entry, &providers, &pipelines)?);
        }
        if pool.is_empty() {
            return Err(ConfigError::EmptyPool {
                category: category.clone(),
            });
        }
        routing.insert(category.clone(), pool);
    }

    for pipeline in pipelines.values() {
        if !credentials.contains_key(&pipeline.credential_id) {
            return Err(ConfigError::DanglingPipelineCredential {
                pipeline_id: pipeline.id.clone(),
                credential_id: pipeline.credential_id.clone(),
            });
        }
    }

    let port: u16 = user
        .http_server
        .port
        .try_into()
        .map_err(|_| ConfigError::InvalidPort(user.http_server.port))?;
    if port == 0 {
        return Err(ConfigError::InvalidPort(user.http_server.port));
    }

    if user.http_server.api_key.is_none() {
        warnings.push(
            "httpServer.apiKey is unset: every non-health endpoint will be reachable without authentication"
                .to_string(),
        );
    }

    let runtime = RuntimeConfig {
        providers,
        credentials,
        pipelines,
        routing,
        http_server: HttpServerDef {
            host: user.http_server.host,
            port,
            api_key: user.http_server.api_key,
        },
        quota_routing_enabled: user.quota_routing_enabled,
    };

    Ok((runtime, warnings))
}

fn resolve_credential(
    provider_id: &str,
    raw: &RawCredentialDef,
) -> Result<(AuthKind, SecretRef), ConfigError> {
    match raw {
        RawCredentialDef::ApiKey { secret, secret_file } => {
            let value = match (secret, secret_file) {
                (Some(inline), _) => inline.clone(),
                (None, Some(path)) => read_secret_file(path)?,
                (None, None) => {
                    return Err(ConfigError::MissingCredentialFile {
                        path: format!("{provider_id}: apiKey credential has neither secret nor secretFile"),
                    })
                }
            };
            Ok((AuthKind::ApiKey, SecretRef::ApiKey(value)))
        }
        RawCredentialDef::OauthDevice {
            device_code_url,
            token_url,
            client_id,
            client_secret,
            scopes,
            token_file,
        } => Ok((
            AuthKind::OauthDevice,
            SecretRef::OauthDevice {
                device_code_url: device_code_url.clone(),
                token_url: token_url.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                scopes: scopes.clone(),
                token_file: token_file.clone(),
            },
        )),
        RawCredentialDef::OauthPkce {
            authorize_url,
            token_url,
            client_id,
            token_file,
        } => Ok((
            AuthKind::OauthPkce,
            SecretRef::OauthPkce {
                authorize_url: authorize_url.clone(),
                token_url: token_url.clone(),
                client_id: client_id.clone(),
                token_file: token_file.clone(),
            },
        )),
        RawCredentialDef::None => Ok((AuthKind::None, SecretRef::None)),
    }
}

fn read_secret_file(path: &str) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|_| ConfigError::MissingCredentialFile {
            path: path.to_string(),
        })
}

fn resolve_pool_entry(
    category: &str,
    entry: &RawPoolEntry,
    providers: &HashMap<String, ProviderDef>,
    pipelines: &HashMap<String, PipelineDef>,
) -> Result<Vec<PoolEntry>, ConfigError> {
    let provider = providers.get(&entry.provider).ok_or_else(|| ConfigError::DanglingRoute {
        category: category.to_string(),
        provider: entry.provider.clone(),
    })?;

    let models: Vec<&str> = match &entry.model {
        Some(model) => {
            if !provider.model_catalog.iter().any(|m| m == model) {
                return Err(ConfigError::DanglingModel {
                    category: category.to_string(),
                    provider: entry.provider.clone(),
                    model: model.clone(),
                });
            }
            vec![model.as_str()]
        }
        None => provider.model_catalog.iter().map(String::as_str).collect(),
    };

    let aliases: Vec<String> = match &entry.credential_alias {
        Some(alias) => {
            let credential_id = format!("{}:{}", entry.provider, alias);
            if !pipelines.values().any(|p| p.credential_id == credential_id) {
                return Err(ConfigError::DanglingCredentialAlias {
                    category: category.to_string(),
                    provider: entry.provider.clone(),
                    alias: alias.clone(),
                });
            }
            vec![alias.clone()]
        }
        None => pipelines
            .values()
            .filter(|p| p.provider_id == entry.provider)
            .map(|p| p.credential_id.rsplit(':').next().unwrap_or_default().to_string())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    let mut resolved = Vec::new();
    for model in &models {
        for alias in &aliases {
            let pipeline_id = format!("{}:{}:{}", entry.provider, model, alias);
            if pipelines.contains_key(&pipeline_id) {
                resolved.push(PoolEntry {
                    pipeline_id,
                    weight: entry.weight,
                });
            }
        }
    }
    Ok(resolved)
}
