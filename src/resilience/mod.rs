//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Single upstream read:
//!     → retries.rs (run, on failure back off via backoff.rs, try again)
//!     → last failure surfaces once the retry budget is spent
//!
//! Multi-event statistics:
//!     → fanout.rs (one branch per key, joined without short-circuit)
//!     → keyed merge, failed branches become markers
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//!   (enforced by the HTTP client, see `upstream::client`)
//! - Retries only for idempotent reads
//! - No circuit breaker: the upstream is a single managed API

pub mod backoff;
pub mod fanout;
pub mod retries;

pub use fanout::{aggregate, fan_out, merge, BranchResult, FailureMarker};
pub use retries::{retry_with_backoff, Attempt, RetryPolicy};
