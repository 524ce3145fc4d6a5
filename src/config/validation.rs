//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the upstream base URL can anchor the pagination allow-list
//! - Check every account ended up with a credential
//! - Check the inbound deadline outlasts the slowest retry sequence
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::resilience::backoff::calculate_backoff;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{url}' is invalid: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.log_format '{0}' is not one of: pretty, json")]
    LogFormat(String),

    #[error("account name must not be empty")]
    EmptyAccountName,

    #[error("account '{0}' is configured more than once")]
    DuplicateAccount(String),

    #[error(
        "timeouts.request_secs ({request_secs}s) is shorter than the worst-case retry sequence ({budget_ms} ms)"
    )]
    RetryBudget { request_secs: u64, budget_ms: u128 },

    #[error("account '{account}' has no api_key and {env_var} is not set")]
    MissingApiKey { account: String, env_var: String },
}

/// Check a fully loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Err(reason) = check_base_url(&config.upstream.base_url) {
        errors.push(ValidationError::BaseUrl {
            url: config.upstream.base_url.clone(),
            reason,
        });
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.retries.base_delay_ms == 0 {
        errors.push(ValidationError::Zero("retries.base_delay_ms"));
    }

    let budget = retry_budget(config);
    if config.timeouts.request_secs > 0 && Duration::from_secs(config.timeouts.request_secs) < budget {
        errors.push(ValidationError::RetryBudget {
            request_secs: config.timeouts.request_secs,
            budget_ms: budget.as_millis(),
        });
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::LogFormat(other.to_string())),
    }

    let mut seen = HashSet::new();
    for account in &config.accounts {
        if account.name.trim().is_empty() {
            errors.push(ValidationError::EmptyAccountName);
            continue;
        }
        if !seen.insert(account.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateAccount(account.name.clone()));
        }
        let has_key = account
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            errors.push(ValidationError::MissingApiKey {
                account: account.name.clone(),
                env_var: account.env_var(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Longest a single upstream read can take: every attempt runs into the
/// upstream timeout and every backoff is waited out.
fn retry_budget(config: &ProxyConfig) -> Duration {
    let retries = config.retries.max_retries();
    let attempts = config.upstream.timeout().saturating_mul(retries.saturating_add(1));
    (1..=retries).fold(attempts, |total, retry| {
        total.saturating_add(calculate_backoff(retry, config.retries.base_delay()))
    })
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err("not a base URL".to_string());
    }
    if !raw.ends_with('/') {
        return Err("must end with '/'".to_string());
    }
    Ok(())
}
