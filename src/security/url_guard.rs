//! Allow-list for caller-supplied upstream URLs.
//!
//! The pagination endpoint dereferences a URL taken from the query string.
//! It must live under the configured provider base URL, otherwise the proxy
//! would fetch arbitrary hosts with an account's credentials attached.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejected {
    #[error("URL is not under the provider base URL")]
    NotAllowed,

    #[error("URL is malformed: {0}")]
    Malformed(String),
}

/// Accept `raw` only if it starts with `base` and parses to the same origin.
///
/// `base` always ends with '/', so a prefix match also pins the host;
/// the origin comparison guards against parser disagreement.
pub fn validate_pagination_url(raw: &str, base: &Url) -> Result<Url, UrlRejected> {
    let raw = raw.trim();
    if !raw.starts_with(base.as_str()) {
        return Err(UrlRejected::NotAllowed);
    }

    let url = Url::parse(raw).map_err(|e| UrlRejected::Malformed(e.to_string()))?;
    if url.origin() != base.origin() || !url.username().is_empty() || url.password().is_some() {
        return Err(UrlRejected::NotAllowed);
    }

    Ok(url)
}
