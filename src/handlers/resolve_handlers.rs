use axum::{extract::State, Json};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::dto::ResolveQueryDto;
use crate::errors::ApiError;
use crate::repo;
use crate::services::resolver::{resolve_semantic_route, CandidateRef, RouteMatch};

/// Handler for the search bar
///
/// This function handles GET requests to `/resolve?q=...` and decides which
/// page a free-text query should land on.
///
/// ### Returns
///
/// The route kind, its href, a confidence and the matched candidate, if any
#[instrument(skip(pool))]
pub async fn resolve_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the query parameters
    Query(query): Query<ResolveQueryDto>,
) -> Result<Json<RouteMatch>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    let refs = repo::list_candidate_refs(&pool).map_err(ApiError::Database)?;
    let candidates: Vec<CandidateRef<'_>> = refs
        .iter()
        .map(|(id, name, slug)| CandidateRef { id: *id, name, slug })
        .collect();

    let route = resolve_semantic_route(&query.q, &candidates)?;
    debug!("Resolved query to {:?} {}", route.kind, route.href);
    Ok(Json(route))
}
