use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{load_candidate, load_visible_candidate, optional_email, optional_state, page};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::{patch_nullable, CandidateQueryDto, CreateCandidateDto, UpdateCandidateDto};
use crate::errors::ApiError;
use crate::models::{Candidate, CandidateChanges, NewCandidate};
use crate::repo::{self, CandidateFilter};
use crate::services::validation::{non_blank, require};

/// Handler for listing candidates
///
/// This function handles GET requests to `/candidates`. Hidden profiles are
/// only listed for staff.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller, if signed in
/// * `query` - Search, location, verification, id and paging filters
///
/// ### Returns
///
/// The matching candidates as JSON, ordered by name
#[instrument(skip(pool, identity))]
pub async fn list_candidates_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the optional caller identity
    identity: MaybeIdentity,
    // Extract the query parameters; `ids` may repeat
    Query(query): Query<CandidateQueryDto>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let (limit, offset) = page(query.limit, query.offset)?;

    let filter = CandidateFilter {
        search: non_blank(query.search.as_deref()),
        city: non_blank(query.city.as_deref()),
        state: non_blank(query.state.as_deref()),
        verified: query.verified,
        ids: query.ids,
        include_hidden: identity.is_staff(),
        limit,
        offset,
    };

    let candidates = repo::list_candidates(&pool, &filter).map_err(ApiError::Database)?;
    debug!("Returning {} candidates", candidates.len());
    Ok(Json(candidates))
}

/// Handler for creating a candidate profile
///
/// This function handles POST requests to `/candidates`. A caller who is
/// not staff becomes the owner of the profile they create.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The authenticated caller
/// * `payload` - The profile fields
///
/// ### Returns
///
/// 201 with the new candidate, including its generated slug
///
/// ### Errors
///
/// - 400 when the name is blank or the email or state is malformed
/// - 409 when the caller already owns a profile
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id, name = %payload.name))]
pub async fn create_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateCandidateDto>,
) -> Result<(StatusCode, Json<Candidate>), ApiError> {
    info!("Creating candidate");

    let name = require(Some(&payload.name), "name").map_err(ApiError::BadRequest)?;
    let mut new_candidate = NewCandidate::new(name);
    new_candidate.email = optional_email(payload.email.as_deref())?;
    new_candidate.state = optional_state(payload.state.as_deref())?;
    new_candidate.party = non_blank(payload.party.as_deref());
    new_candidate.position = non_blank(payload.position.as_deref());
    new_candidate.city = non_blank(payload.city.as_deref());
    new_candidate.bio = non_blank(payload.bio.as_deref());
    new_candidate.website = non_blank(payload.website.as_deref());
    new_candidate.linkedin = non_blank(payload.linkedin.as_deref());
    new_candidate.phone = non_blank(payload.phone.as_deref());
    new_candidate.photo_url = non_blank(payload.photo_url.as_deref());

    if !identity.is_staff() {
        let existing = repo::get_candidate_by_owner(&pool, &identity.user_id).map_err(ApiError::Database)?;
        if existing.is_some() {
            return Err(ApiError::Conflict("You already have a candidate profile".to_string()));
        }
        new_candidate.clerk_user_id = Some(identity.user_id.clone());
    }

    let candidate = repo::create_candidate(&pool, new_candidate).map_err(|e| ApiError::from_repo(e, "Candidate"))?;

    info!("Created candidate {} ({})", candidate.id, candidate.slug);
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// Handler for retrieving a candidate by id
///
/// This function handles GET requests to `/candidates/{id}`.
///
/// ### Returns
///
/// The candidate as JSON; 404 when it doesn't exist or is hidden from the caller
#[instrument(skip(pool, identity))]
pub async fn get_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the candidate ID from the URL path
    Path(candidate_id): Path<String>,
) -> Result<Json<Candidate>, ApiError> {
    let candidate = load_visible_candidate(&pool, &candidate_id, &identity)?;
    Ok(Json(candidate))
}

/// Handler for retrieving a candidate by slug
///
/// This function handles GET requests to `/candidates/slug/{slug}`.
#[instrument(skip(pool, identity))]
pub async fn get_candidate_by_slug_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    Path(slug): Path<String>,
) -> Result<Json<Candidate>, ApiError> {
    let candidate = repo::get_candidate_by_slug(&pool, &slug)
        .map_err(ApiError::Database)?
        .filter(|c| !c.hidden || identity.can_manage(c))
        .ok_or_else(|| ApiError::NotFound("Candidate".to_string()))?;
    Ok(Json(candidate))
}

/// Handler for updating a candidate profile
///
/// This function handles PATCH requests to `/candidates/{id}`. Only the
/// fields present in the body change; a blank string clears an optional
/// field. The slug never changes here.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The authenticated caller; must own the profile or be staff
/// * `candidate_id` - The candidate to update
/// * `payload` - The fields to change
///
/// ### Returns
///
/// The updated candidate as JSON
///
/// ### Errors
///
/// - 403 when the caller can't manage the profile, or changes `verified` or
///   `hidden` without being staff
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn update_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
    Json(payload): Json<UpdateCandidateDto>,
) -> Result<Json<Candidate>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;

    if (payload.verified.is_some() || payload.hidden.is_some()) && !identity.is_staff() {
        return Err(ApiError::Forbidden);
    }

    let name = match payload.name.as_deref() {
        Some(name) => Some(require(Some(name), "name").map_err(ApiError::BadRequest)?),
        None => None,
    };
    let email = match payload.email.as_deref() {
        Some(email) => Some(optional_email(Some(email))?),
        None => None,
    };
    let state = match payload.state.as_deref() {
        Some(state) => Some(optional_state(Some(state))?),
        None => None,
    };

    let changes = CandidateChanges {
        name,
        party: patch_nullable(payload.party),
        position: patch_nullable(payload.position),
        city: patch_nullable(payload.city),
        state,
        bio: patch_nullable(payload.bio),
        website: patch_nullable(payload.website),
        linkedin: patch_nullable(payload.linkedin),
        email,
        phone: patch_nullable(payload.phone),
        photo_url: patch_nullable(payload.photo_url),
        verified: payload.verified,
        hidden: payload.hidden,
        updated_at: None,
    };

    let updated = repo::update_candidate(&pool, candidate.id, changes).map_err(|e| ApiError::from_repo(e, "Candidate"))?;
    info!("Updated candidate {}", updated.id);
    Ok(Json(updated))
}

/// Handler for deleting a candidate
///
/// This function handles DELETE requests to `/candidates/{id}`. Admin only;
/// content blocks, endorsements, views, donations and election links go
/// with it.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn delete_candidate_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    let candidate_id = crate::errors::parse_id(&candidate_id, "candidate")?;

    let deleted = repo::delete_candidate(&pool, candidate_id).map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Candidate".to_string()));
    }

    info!("Deleted candidate {}", candidate_id);
    Ok(StatusCode::NO_CONTENT)
}
