//! Mailgun management API client.
//!
//! # Responsibilities
//! - Build provider URLs from the configured base
//! - Authenticate each call with the account's API key
//! - Enforce the per-call timeout
//! - Map transport and status failures into `UpstreamError`
//!
//! Every call is a GET and is therefore safe to retry.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::credentials::ApiKey;
use crate::observability::metrics;
use crate::upstream::error::{UpstreamError, UpstreamResult};
use crate::upstream::types::{EventKind, EventsQuery, StatsQuery};

const USER_AGENT: &str = concat!("mailgun-proxy/", env!("CARGO_PKG_VERSION"));

/// Which `stats/total` endpoint to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope<'a> {
    /// Totals across every domain of the account.
    Account,
    /// Totals for one sending domain.
    Domain(&'a str),
}

/// Shared HTTP client plus provider settings. Cheap to clone.
#[derive(Clone)]
pub struct MailgunClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl MailgunClient {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Bind an API key for a run of calls on behalf of one account.
    pub fn for_account<'a>(&'a self, key: &'a ApiKey) -> AccountClient<'a> {
        AccountClient { client: self, key }
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> UpstreamResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

impl std::fmt::Debug for MailgunClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.timeout.as_millis())
            .finish()
    }
}

/// A `MailgunClient` bound to one account's key.
#[derive(Debug, Clone, Copy)]
pub struct AccountClient<'a> {
    client: &'a MailgunClient,
    key: &'a ApiKey,
}

impl AccountClient<'_> {
    /// `GET v4/domains`
    pub async fn list_domains(&self) -> UpstreamResult<Value> {
        let url = self.client.endpoint(&["v4", "domains"])?;
        self.get("domains", url, &[]).await
    }

    /// `GET v3/stats/total` or `GET v3/{domain}/stats/total` for one event kind.
    pub async fn total_stats(
        &self,
        scope: StatsScope<'_>,
        query: &StatsQuery,
        event: EventKind,
    ) -> UpstreamResult<Value> {
        let url = match scope {
            StatsScope::Account => self.client.endpoint(&["v3", "stats", "total"])?,
            StatsScope::Domain(domain) => self.client.endpoint(&["v3", domain, "stats", "total"])?,
        };
        self.get("stats", url, &query.to_pairs(event)).await
    }

    /// `GET v3/{domain}/events`
    pub async fn domain_events(&self, domain: &str, query: &EventsQuery) -> UpstreamResult<Value> {
        let url = self.client.endpoint(&["v3", domain, "events"])?;
        self.get("events", url, &query.to_pairs()).await
    }

    /// Dereference a pagination link handed out by the provider.
    ///
    /// The caller must have checked it against the allow-list first.
    pub async fn follow(&self, url: &Url) -> UpstreamResult<Value> {
        self.get("pagination", url.clone(), &[]).await
    }

    async fn get(
        &self,
        operation: &'static str,
        url: Url,
        query: &[(&'static str, String)],
    ) -> UpstreamResult<Value> {
        tracing::debug!(operation, path = %url.path(), "Calling upstream");

        let mut request = self
            .client
            .http
            .get(url)
            .basic_auth("api", Some(self.key.expose()));
        if !query.is_empty() {
            request = request.query(query);
        }

        let result = self.send(request).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_upstream_request(operation, outcome);
        result
    }

    async fn send(&self, request: RequestBuilder) -> UpstreamResult<Value> {
        let response = request.send().await.map_err(|e| self.client.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| self.client.classify(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> MailgunClient {
        MailgunClient::new(&UpstreamConfig {
            base_url: base.to_string(),
            timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("https://api.mailgun.net/");
        let url = client.endpoint(&["v3", "mg.example.com", "stats", "total"]).unwrap();
        assert_eq!(url.as_str(), "https://api.mailgun.net/v3/mg.example.com/stats/total");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://127.0.0.1:9000/mailgun/");
        let url = client.endpoint(&["v4", "domains"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/mailgun/v4/domains");
    }

    #[test]
    fn test_domain_cannot_escape_its_segment() {
        let client = client("https://api.mailgun.net/");
        let url = client.endpoint(&["v3", "../v4/keys", "events"]).unwrap();
        assert_eq!(url.path(), "/v3/..%2Fv4%2Fkeys/events");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = MailgunClient::new(&UpstreamConfig {
            base_url: "not a url".into(),
            timeout_ms: 1_000,
        })
        .unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidUrl(_)));
    }
}
