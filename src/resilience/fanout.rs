//! Fan-out over a fixed key set with per-branch failure isolation.
//!
//! # Responsibilities
//! - Start one operation per key without waiting on the previous one
//! - Join all branches; a failing branch never cancels its siblings
//! - Merge outcomes into a map holding exactly one entry per key
//!
//! # Design Decisions
//! - Branches run concurrently inside the calling task (`join_all`), so no
//!   state is shared across threads and no locking is needed
//! - Completion order is irrelevant; the merge is keyed

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;

use futures_util::future::join_all;
use serde::Serialize;

use crate::observability::metrics;

/// Placeholder stored under a key whose branch failed.
///
/// Carries an empty `items` list so consumers that chart the series can
/// render an empty one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureMarker {
    pub event: String,
    pub items: Vec<serde_json::Value>,
    pub error: bool,
    pub message: String,
}

impl FailureMarker {
    pub fn new(key: impl Display, message: impl Into<String>) -> Self {
        Self {
            event: key.to_string(),
            items: Vec::new(),
            error: true,
            message: message.into(),
        }
    }
}

/// Terminal state of one branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BranchResult<T> {
    Payload(T),
    Failed(FailureMarker),
}

impl<T> BranchResult<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, BranchResult::Failed(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            BranchResult::Payload(payload) => Some(payload),
            BranchResult::Failed(_) => None,
        }
    }
}

/// Run `op` for every key concurrently and wait for all of them.
///
/// Outcomes come back in key order regardless of completion order.
pub async fn fan_out<K, T, E, F, Fut>(keys: &[K], op: F) -> Vec<(K, Result<T, E>)>
where
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let branches = keys.iter().cloned().map(|key| {
        let pending = op(key.clone());
        async move { (key, pending.await) }
    });
    join_all(branches).await
}

/// Fold branch outcomes into a keyed map, degrading failures to markers.
pub fn merge<K, T, E>(outcomes: Vec<(K, Result<T, E>)>) -> BTreeMap<K, BranchResult<T>>
where
    K: Ord + Display,
    E: Display,
{
    outcomes
        .into_iter()
        .map(|(key, outcome)| {
            let entry = match outcome {
                Ok(payload) => BranchResult::Payload(payload),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Fan-out branch failed");
                    metrics::record_fanout_failure(&key.to_string());
                    BranchResult::Failed(FailureMarker::new(&key, err.to_string()))
                }
            };
            (key, entry)
        })
        .collect()
}

/// `fan_out` followed by `merge`.
pub async fn aggregate<K, T, E, F, Fut>(keys: &[K], op: F) -> BTreeMap<K, BranchResult<T>>
where
    K: Clone + Ord + Display,
    E: Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    merge(fan_out(keys, op).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::Instant;

    async fn fetch(key: &'static str, failing: &[&str]) -> Result<Value, String> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if failing.contains(&key) {
            Err(format!("{key} unavailable"))
        } else {
            Ok(json!({ "event": key, "items": [1, 2] }))
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_every_key() {
        let keys = ["a", "b", "c"];
        let result = aggregate(&keys, |key| fetch(key, &["a", "c"])).await;

        assert_eq!(result.len(), 3);
        assert!(result["a"].is_failed());
        assert!(result["c"].is_failed());
        assert_eq!(result["b"].payload(), Some(&json!({ "event": "b", "items": [1, 2] })));

        let rendered = serde_json::to_value(&result).unwrap();
        assert_eq!(rendered["a"]["error"], json!(true));
        assert_eq!(rendered["a"]["message"], json!("a unavailable"));
        assert_eq!(rendered["c"]["items"], json!([]));
        assert_eq!(rendered["b"], json!({ "event": "b", "items": [1, 2] }));
    }

    #[tokio::test]
    async fn test_cardinality_independent_of_failures() {
        let keys = ["a", "b", "c", "d", "e"];
        for failures in 0..=keys.len() {
            let failing: Vec<&str> = keys[..failures].to_vec();
            let result = aggregate(&keys, |key| fetch(key, &failing)).await;
            assert_eq!(result.len(), keys.len());
            assert_eq!(result.values().filter(|r| r.is_failed()).count(), failures);
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_touch_siblings() {
        let keys = ["a", "b", "c", "d", "e"];
        let baseline = aggregate(&keys, |key| fetch(key, &[])).await;
        let degraded = aggregate(&keys, |key| fetch(key, &["d"])).await;

        for key in ["a", "b", "c", "e"] {
            assert_eq!(
                serde_json::to_vec(&baseline[key]).unwrap(),
                serde_json::to_vec(&degraded[key]).unwrap()
            );
        }
        assert!(degraded["d"].is_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_branches_run_concurrently() {
        let keys = ["a", "b", "c", "d", "e"];
        let start = Instant::now();
        let outcomes = fan_out(&keys, |key| fetch(key, &["b"])).await;

        assert_eq!(start.elapsed(), Duration::from_millis(100));
        let order: Vec<&str> = outcomes.iter().map(|(key, _)| *key).collect();
        assert_eq!(order, keys);
    }
}
