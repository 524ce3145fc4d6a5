//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Caller-supplied URL (pagination follow-through):
//!     → url_guard.rs (prefix allow-list, parse)
//!     → only then handed to the upstream client
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure, before any network I/O
//! - No trust in client input

pub mod url_guard;

pub use url_guard::{validate_pagination_url, UrlRejected};
