//! Exponential backoff.

use std::time::Duration;

/// Delay to wait before retry number `retry` (1-based).
///
/// `2^retry × base`, so with a 500 ms base the sequence is 1 s, 2 s, 4 s.
/// There is no jitter and no ceiling; callers keep `retry` small.
pub fn calculate_backoff(retry: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(retry);
    base.saturating_mul(factor)
}
