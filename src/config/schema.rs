//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the Mailgun proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream provider API settings.
    pub upstream: UpstreamConfig,

    /// Retry budgets per endpoint family.
    pub retries: RetryConfig,

    /// Inbound request timeouts.
    pub timeouts: TimeoutConfig,

    /// Cross-origin settings for the dashboard frontend.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Accounts the proxy holds credentials for.
    pub accounts: Vec<AccountConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream Mailgun API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the provider API. Pagination URLs must start with it.
    pub base_url: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mailgun.net/".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Retry configuration.
///
/// `*_max_retries` counts retries, not attempts: a permanently failing call
/// is tried `max_retries + 1` times.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Retries for the domain listing.
    pub domains_max_retries: u32,

    /// Retries for the domain event listing.
    pub events_max_retries: u32,

    /// Retries for pagination follow-through.
    pub pagination_max_retries: u32,

    /// Retries for each stats fan-out branch.
    pub stats_max_retries: u32,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Largest retry count across all operations.
    pub fn max_retries(&self) -> u32 {
        [
            self.domains_max_retries,
            self.events_max_retries,
            self.pagination_max_retries,
            self.stats_max_retries,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            domains_max_retries: 3,
            events_max_retries: 2,
            pagination_max_retries: 2,
            stats_max_retries: 0,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for a proxied request, retries included, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow any origin, method and header.
    pub permissive: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { permissive: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A Mailgun account the proxy can act for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// Account identifier as it appears in request paths.
    pub name: String,

    /// API key. When omitted, `<NAME>_MAILGUN_API_KEY` is read at load time.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AccountConfig {
    /// Environment variable consulted when no inline key is configured.
    pub fn env_var(&self) -> String {
        format!("{}_MAILGUN_API_KEY", self.name.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upstream_expectations() {
        let config = ProxyConfig::default();
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(config.retries.base_delay(), Duration::from_millis(500));
        assert_eq!(config.retries.domains_max_retries, 3);
        assert_eq!(config.retries.events_max_retries, 2);
        assert_eq!(config.retries.stats_max_retries, 0);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_minimal_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [[accounts]]
            name = "acme"
            api_key = "key-1"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].api_key.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_account_env_var_is_uppercased() {
        let account = AccountConfig {
            name: "acme-eu".to_string(),
            api_key: None,
        };
        assert_eq!(account.env_var(), "ACME-EU_MAILGUN_API_KEY");
    }
}
