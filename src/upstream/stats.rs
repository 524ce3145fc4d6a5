//! Multi-event statistics via fan-out.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::resilience::{aggregate, retry_with_backoff, BranchResult, RetryPolicy};
use crate::upstream::client::{AccountClient, StatsScope};
use crate::upstream::types::{EventKind, StatsQuery};

/// One entry per `EventKind::ALL` member, in kind order.
pub type AggregatedStats = BTreeMap<EventKind, BranchResult<Value>>;

/// Query `stats/total` once per event kind, concurrently.
///
/// Never fails as a whole: a kind whose call fails (after `policy` retries)
/// is reported as a failure marker next to the kinds that succeeded.
pub async fn collect_stats(
    api: &AccountClient<'_>,
    scope: StatsScope<'_>,
    query: &StatsQuery,
    policy: &RetryPolicy,
) -> AggregatedStats {
    let stats = aggregate(&EventKind::ALL, |event| async move {
        retry_with_backoff(policy, "stats", |_| api.total_stats(scope, query, event)).await
    })
    .await;

    let failed = stats.values().filter(|entry| entry.is_failed()).count();
    if failed > 0 {
        tracing::warn!(
            scope = ?scope,
            failed,
            total = stats.len(),
            "Stats fan-out completed with failures"
        );
    }

    stats
}
