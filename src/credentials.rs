//! Account credential resolution.
//!
//! Maps an account identifier from the request path to the Mailgun API key
//! used against the provider. The mapping is built once at startup from the
//! validated configuration and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::config::AccountConfig;

/// A Mailgun API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Mailgun API key for account {0} is not configured")]
    NotConfigured(String),
}

/// Account → API key lookup. Account names compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    keys: HashMap<String, ApiKey>,
}

impl CredentialStore {
    /// Build the store, failing on the first account without a usable key.
    pub fn from_accounts(accounts: &[AccountConfig]) -> Result<Self, CredentialError> {
        let mut keys = HashMap::with_capacity(accounts.len());
        for account in accounts {
            let key = account
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .ok_or_else(|| CredentialError::NotConfigured(account.name.clone()))?;
            keys.insert(account.name.to_lowercase(), ApiKey::new(key));
        }
        Ok(Self { keys })
    }

    pub fn resolve(&self, account: &str) -> Result<&ApiKey, CredentialError> {
        self.keys
            .get(&account.to_lowercase())
            .ok_or_else(|| CredentialError::NotConfigured(account.to_string()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
