//! Provider-facing types: event kinds, query parameters and date handling.

use std::fmt;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Email-delivery telemetry categories reported by the statistics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Accepted,
    Delivered,
    Failed,
    Opened,
    Clicked,
}

impl EventKind {
    /// The fixed set queried by every stats fan-out.
    pub const ALL: [EventKind; 5] = [
        EventKind::Accepted,
        EventKind::Delivered,
        EventKind::Failed,
        EventKind::Opened,
        EventKind::Clicked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Accepted => "accepted",
            EventKind::Delivered => "delivered",
            EventKind::Failed => "failed",
            EventKind::Opened => "opened",
            EventKind::Clicked => "clicked",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections of caller-supplied query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Start and end dates are required")]
    MissingStatsRange,

    #[error("Begin and end dates are required")]
    MissingEventsRange,

    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid date for '{field}': {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}

/// Parse a caller-supplied timestamp.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DDTHH:MM:SS[.fff]`,
/// `YYYY-MM-DD HH:MM:SS` and bare `YYYY-MM-DD` (midnight). Zone-less inputs
/// are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 2822 date in UTC as the provider expects, e.g. `Tue, 01 Oct 2024 00:00:00 GMT`.
pub fn format_provider_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_field(field: &'static str, value: &str) -> Result<DateTime<Utc>, QueryError> {
    parse_timestamp(value).ok_or_else(|| QueryError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Raw `?start=&end=` parameters of the stats endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Validated date range for `stats/total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatsQuery {
    pub fn to_pairs(&self, event: EventKind) -> Vec<(&'static str, String)> {
        vec![
            ("start", format_provider_date(&self.start)),
            ("end", format_provider_date(&self.end)),
            ("event", event.as_str().to_string()),
        ]
    }
}

impl TryFrom<StatsParams> for StatsQuery {
    type Error = QueryError;

    fn try_from(params: StatsParams) -> Result<Self, Self::Error> {
        let (Some(start), Some(end)) = (present(params.start.as_deref()), present(params.end.as_deref()))
        else {
            return Err(QueryError::MissingStatsRange);
        };
        Ok(Self {
            start: parse_field("start", start)?,
            end: parse_field("end", end)?,
        })
    }
}

/// Raw parameters of the domain events endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsParams {
    pub begin: Option<String>,
    pub end: Option<String>,
    pub ascending: Option<String>,
    pub limit: Option<String>,
    pub event: Option<String>,
}

/// Validated query for `{domain}/events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsQuery {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub ascending: String,
    pub limit: u32,
    pub event: String,
}

impl EventsQuery {
    pub const DEFAULT_EVENT: &'static str = "failed";
    pub const DEFAULT_ASCENDING: &'static str = "yes";
    pub const DEFAULT_LIMIT: u32 = 300;

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("begin", format_provider_date(&self.begin)),
            ("end", format_provider_date(&self.end)),
            ("ascending", self.ascending.clone()),
            ("limit", self.limit.to_string()),
            ("event", self.event.clone()),
        ]
    }
}

impl TryFrom<EventsParams> for EventsQuery {
    type Error = QueryError;

    fn try_from(params: EventsParams) -> Result<Self, Self::Error> {
        let (Some(begin), Some(end)) = (present(params.begin.as_deref()), present(params.end.as_deref()))
        else {
            return Err(QueryError::MissingEventsRange);
        };
        let begin = parse_field("begin", begin)?;
        let mut end = parse_field("end", end)?;

        // An empty window would return nothing; widen it to a full day.
        if begin == end {
            end += ChronoDuration::days(1);
        }

        let limit = match present(params.limit.as_deref()) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| QueryError::InvalidLimit(raw.to_string()))?,
            None => Self::DEFAULT_LIMIT,
        };

        Ok(Self {
            begin,
            end,
            ascending: present(params.ascending.as_deref())
                .unwrap_or(Self::DEFAULT_ASCENDING)
                .to_string(),
            limit,
            event: present(params.event.as_deref())
                .unwrap_or(Self::DEFAULT_EVENT)
                .to_string(),
        })
    }
}

/// Raw `?url=` parameter of the pagination endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub url: Option<String>,
}

impl PaginationParams {
    pub fn require_url(&self) -> Result<&str, QueryError> {
        present(self.url.as_deref()).ok_or(QueryError::MissingUrl)
    }
}
