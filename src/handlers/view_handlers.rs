use axum::{
    extract::{Path, State},
    http::{header::REFERER, HeaderMap},
    Json,
};
use axum_extra::extract::Query;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{load_candidate, load_visible_candidate};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::{RecordedDto, ViewStatsQueryDto};
use crate::errors::ApiError;
use crate::repo;
use crate::services::view_stats::{self, ViewStats};

/// Handler for recording a profile view
///
/// This function handles POST requests to `/candidates/{id}/views`. The
/// `Referer` header, when present, is stored with the view. Owners looking
/// at their own profile are not counted.
#[instrument(skip(pool, identity, headers))]
pub async fn record_view_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the candidate ID from the URL path
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RecordedDto>, ApiError> {
    let candidate = load_visible_candidate(&pool, &candidate_id, &identity)?;

    if identity.user_id().is_some_and(|user_id| candidate.is_owned_by(user_id)) {
        debug!("Skipping owner view of candidate {}", candidate.id);
        return Ok(Json(RecordedDto { recorded: false }));
    }

    let referrer = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(500).collect::<String>())
        .filter(|value| !value.is_empty());

    repo::record_view(&pool, candidate.id, referrer).map_err(ApiError::Database)?;
    Ok(Json(RecordedDto { recorded: true }))
}

/// Handler for a candidate's view statistics
///
/// This function handles GET requests to `/candidates/{id}/views`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller; must own the profile or be staff
/// * `candidate_id` - The profile
/// * `query` - `days`, the window size (1 to 365, default 30)
///
/// ### Returns
///
/// The total and a per-day series ending today
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn view_stats_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
    // Extract the query parameters
    Query(query): Query<ViewStatsQueryDto>,
) -> Result<Json<ViewStats>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;

    let days = view_stats::window_days(query.days).map_err(ApiError::BadRequest)?;
    let today = Utc::now().date_naive();
    let since = view_stats::window_start(today, days).and_time(chrono::NaiveTime::MIN);

    let views = repo::list_view_times(&pool, candidate.id, since).map_err(ApiError::Database)?;
    Ok(Json(view_stats::aggregate(candidate.id, &views, today, days)))
}
