use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{load_candidate, page};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::{CreateElectionDto, ElectionCandidateDto, ElectionQueryDto, LinkCandidateDto};
use crate::errors::{parse_id, ApiError};
use crate::models::{Election, ElectionLink, ElectionType, JsonValue, NewElection};
use crate::repo::{self, ElectionFilter};
use crate::services::validation::{non_blank, normalize_state, require};

/// Loads an election, treating hidden ones as missing for non-staff callers
fn load_election(pool: &DbPool, raw_id: &str, include_hidden: bool) -> Result<Election, ApiError> {
    let election_id = parse_id(raw_id, "election")?;
    repo::get_election(pool, election_id)
        .map_err(ApiError::Database)?
        .filter(|election| include_hidden || !election.hidden)
        .ok_or_else(|| ApiError::NotFound("Election".to_string()))
}

fn clean_list(values: Vec<String>) -> JsonValue {
    JsonValue::string_list(values.iter().filter_map(|v| non_blank(Some(v.as_str()))))
}

/// Handler for listing elections
///
/// This function handles GET requests to `/elections`. Hidden elections are
/// only listed for staff.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller, if signed in
/// * `query` - City, state, `upcoming` and paging filters
///
/// ### Returns
///
/// The matching elections, soonest first
#[instrument(skip(pool, identity))]
pub async fn list_elections_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the query parameters
    Query(query): Query<ElectionQueryDto>,
) -> Result<Json<Vec<Election>>, ApiError> {
    let (limit, offset) = page(query.limit, query.offset)?;

    let filter = ElectionFilter {
        city: non_blank(query.city.as_deref()),
        state: non_blank(query.state.as_deref()).map(|s| s.to_ascii_uppercase()),
        on_or_after: query.upcoming.unwrap_or(false).then(|| Utc::now().date_naive()),
        include_hidden: identity.is_staff(),
        limit,
        offset,
    };

    let elections = repo::list_elections(&pool, &filter).map_err(ApiError::Database)?;
    debug!("Returning {} elections", elections.len());
    Ok(Json(elections))
}

/// Handler for retrieving an election
///
/// This function handles GET requests to `/elections/{id}`.
#[instrument(skip(pool, identity))]
pub async fn get_election_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the election ID from the URL path
    Path(election_id): Path<String>,
) -> Result<Json<Election>, ApiError> {
    let election = load_election(&pool, &election_id, identity.is_staff())?;
    Ok(Json(election))
}

/// Handler for creating an election
///
/// This function handles POST requests to `/elections`. Staff only.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller; must be staff
/// * `payload` - The election; `election_date` is `YYYY-MM-DD`
///
/// ### Returns
///
/// 201 with the stored election
///
/// ### Errors
///
/// - 400 for a missing field, a malformed date or state, a seat count below
///   one or an unknown election type
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_election_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateElectionDto>,
) -> Result<(StatusCode, Json<Election>), ApiError> {
    identity.require_staff()?;

    let position = require(Some(&payload.position), "position").map_err(ApiError::BadRequest)?;
    let city = require(Some(&payload.city), "city").map_err(ApiError::BadRequest)?;
    let state = require(Some(&payload.state), "state").map_err(ApiError::BadRequest)?;
    let state = normalize_state(&state).ok_or_else(|| ApiError::BadRequest(format!("Invalid state code: {}", state)))?;
    let raw_date = require(Some(&payload.election_date), "election_date").map_err(ApiError::BadRequest)?;
    let election_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid election_date: {} (expected YYYY-MM-DD)", raw_date)))?;

    let mut new_election = NewElection::new(position, election_date, city, state);
    if let Some(description) = non_blank(payload.description.as_deref()) {
        new_election.description = description;
    }
    if let Some(seats) = payload.seats {
        if seats < 1 {
            return Err(ApiError::BadRequest(format!("seats must be at least 1, got {}", seats)));
        }
        new_election.seats = seats;
    }
    if let Some(raw_type) = non_blank(payload.election_type.as_deref()) {
        new_election.election_type = raw_type
            .to_ascii_uppercase()
            .parse::<ElectionType>()
            .map_err(ApiError::BadRequest)?;
    }
    new_election.hidden = payload.hidden.unwrap_or(false);

    let election = repo::create_election(&pool, new_election).map_err(ApiError::Database)?;
    info!("Created election {} for {} on {}", election.id, election.position, election.election_date);
    Ok((StatusCode::CREATED, Json(election)))
}

/// Handler for listing the candidates on an election's ballot
///
/// This function handles GET requests to `/elections/{id}/candidates`.
#[instrument(skip(pool, identity))]
pub async fn list_election_candidates_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    Path(election_id): Path<String>,
) -> Result<Json<Vec<ElectionCandidateDto>>, ApiError> {
    let include_hidden = identity.is_staff();
    let election = load_election(&pool, &election_id, include_hidden)?;

    let rows = repo::list_election_candidates(&pool, election.id, include_hidden).map_err(ApiError::Database)?;
    let ballot = rows
        .into_iter()
        .map(|(link, candidate)| ElectionCandidateDto { candidate, link })
        .collect();
    Ok(Json(ballot))
}

/// Handler for adding a candidate to an election
///
/// This function handles POST requests to `/elections/{id}/candidates/{candidate_id}`.
/// Staff only. The body carries the race-specific details and may be `{}`.
///
/// ### Errors
///
/// - 404 when the election or the candidate doesn't exist
/// - 409 when the candidate is already linked
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn link_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the election and candidate IDs from the URL path
    Path((election_id, candidate_id)): Path<(String, String)>,
    Json(payload): Json<LinkCandidateDto>,
) -> Result<(StatusCode, Json<ElectionLink>), ApiError> {
    identity.require_staff()?;
    let election = load_election(&pool, &election_id, true)?;
    let candidate = load_candidate(&pool, &candidate_id)?;

    let mut link = ElectionLink::new(election.id, candidate.id);
    link.party = non_blank(payload.party.as_deref())
        .or_else(|| candidate.party.clone())
        .unwrap_or_default();
    link.policies = clean_list(payload.policies);
    link.sources = clean_list(payload.sources);
    link.additional_notes = non_blank(payload.additional_notes.as_deref());
    link.voting_link = non_blank(payload.voting_link.as_deref());

    let link = repo::link_candidate(&pool, link).map_err(|e| ApiError::from_repo(e, "Election link"))?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Handler for removing a candidate from an election
///
/// This function handles DELETE requests to `/elections/{id}/candidates/{candidate_id}`.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn unlink_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path((election_id, candidate_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    identity.require_staff()?;
    let election_id = parse_id(&election_id, "election")?;
    let candidate_id = parse_id(&candidate_id, "candidate")?;

    let deleted = repo::unlink_candidate(&pool, election_id, candidate_id).map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Election link".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
