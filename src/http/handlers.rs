//! API handlers.
//!
//! Each handler validates its inputs, resolves the account credential, and
//! only then talks to the provider. Nothing below the credential lookup runs
//! for an unknown account.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::http::response::{ApiError, ApiResult, Envelope};
use crate::http::server::AppState;
use crate::resilience::retry_with_backoff;
use crate::security::validate_pagination_url;
use crate::upstream::{
    collect_stats, AggregatedStats, EventsParams, EventsQuery, PaginationParams, StatsParams,
    StatsQuery, StatsScope,
};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub accounts: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        accounts: state.credentials.len(),
    })
}

/// `GET /api/domains/{account}`
pub async fn get_domains(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<Value> {
    let key = state.credentials.resolve(&account)?;
    let api = state.upstream.for_account(key);

    let domains = retry_with_backoff(&state.retries.domains, "domains", |_| api.list_domains())
        .await
        .map_err(ApiError::upstream("Failed to fetch domains"))?;

    Ok(Json(Envelope::ok(domains)))
}

/// `GET /api/domains/stats/{account}/{domain}?start&end`
pub async fn get_domain_stats(
    State(state): State<AppState>,
    Path((account, domain)): Path<(String, String)>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> ApiResult<AggregatedStats> {
    let Query(params) = params?;
    let query = StatsQuery::try_from(params)?;
    let key = state.credentials.resolve(&account)?;
    let api = state.upstream.for_account(key);

    let stats = collect_stats(&api, StatsScope::Domain(&domain), &query, &state.retries.stats).await;
    Ok(Json(Envelope::ok(stats)))
}

/// `GET /api/domains/stats/{account}?start&end`
pub async fn get_overall_stats(
    State(state): State<AppState>,
    Path(account): Path<String>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> ApiResult<AggregatedStats> {
    let Query(params) = params?;
    let query = StatsQuery::try_from(params)?;
    let key = state.credentials.resolve(&account)?;
    let api = state.upstream.for_account(key);

    let stats = collect_stats(&api, StatsScope::Account, &query, &state.retries.stats).await;
    Ok(Json(Envelope::ok(stats)))
}

/// `GET /api/domains/events/{account}/{domain}?begin&end&ascending&limit&event`
pub async fn get_domain_events(
    State(state): State<AppState>,
    Path((account, domain)): Path<(String, String)>,
    params: Result<Query<EventsParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let query = EventsQuery::try_from(params)?;
    let key = state.credentials.resolve(&account)?;
    let api = state.upstream.for_account(key);

    let events = retry_with_backoff(&state.retries.events, "events", |_| {
        api.domain_events(&domain, &query)
    })
    .await
    .map_err(ApiError::upstream("Failed to fetch domain events"))?;

    Ok(Json(Envelope::ok(events)))
}

/// `GET /api/domains/events/pagination/{account}?url`
pub async fn get_events_pagination(
    State(state): State<AppState>,
    Path(account): Path<String>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let raw = params.require_url()?;
    let key = state.credentials.resolve(&account)?;
    let url = validate_pagination_url(raw, state.upstream.base_url()).map_err(ApiError::ForbiddenUrl)?;
    let api = state.upstream.for_account(key);

    let page = retry_with_backoff(&state.retries.pagination, "pagination", |_| api.follow(&url))
        .await
        .map_err(ApiError::upstream("Failed to fetch paginated events"))?;

    Ok(Json(Envelope::ok(page)))
}
