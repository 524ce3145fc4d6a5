//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// With no path the defaults are used, so a deployment can run purely from
/// `<ACCOUNT>_MAILGUN_API_KEY` variables plus an accounts list in a file.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    finalize(config, |name| std::env::var(name).ok())
}

/// Resolve credentials and normalize, then validate.
///
/// `lookup` stands in for the process environment.
pub fn finalize<F>(mut config: ProxyConfig, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !config.upstream.base_url.ends_with('/') {
        config.upstream.base_url.push('/');
    }

    for account in &mut config.accounts {
        if account.api_key.is_none() {
            account.api_key = lookup(&account.env_var());
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        accounts = config.accounts.len(),
        base_url = %config.upstream.base_url,
        "Configuration finalized"
    );

    Ok(config)
}
