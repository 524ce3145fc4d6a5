//! Upstream provider subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → client.rs (URL building, auth, timeout, status mapping)
//!     → resilience (retry single reads / fan out stats)
//!     → stats.rs (five event kinds merged into one keyed result)
//! ```

pub mod client;
pub mod error;
pub mod stats;
pub mod types;

pub use client::{AccountClient, MailgunClient, StatsScope};
pub use error::{UpstreamError, UpstreamResult};
pub use stats::{collect_stats, AggregatedStats};
pub use types::{EventKind, EventsParams, EventsQuery, PaginationParams, QueryError, StatsParams, StatsQuery};
