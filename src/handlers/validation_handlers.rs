use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{deliver_notification, load_candidate, optional_state};
use crate::auth::Identity;
use crate::db::DbPool;
use crate::dto::{CreateValidationRequestDto, ValidationQueryDto};
use crate::errors::{parse_id, ApiError};
use crate::integrations::Integrations;
use crate::models::{NewNotification, NewValidationRequest, NotificationKind, UserValidationRequest};
use crate::repo::{self, Approval};
use crate::services::email_templates;
use crate::services::validation::{is_valid_email, non_blank, require};
use crate::state::Settings;

fn already_decided() -> ApiError {
    ApiError::Conflict("Validation request has already been decided".to_string())
}

/// Handler for claiming a candidate profile
///
/// This function handles POST requests to `/validation-requests`. Staff
/// review the claim; until then the profile stays unclaimed.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The claimant
/// * `payload` - The candidate and the claimant's contact details
///
/// ### Returns
///
/// 201 with the PENDING request
///
/// ### Errors
///
/// - 404 when the candidate doesn't exist
/// - 409 when the profile already has an owner or the caller has a pending
///   claim on it
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id, candidate_id = payload.candidate_id))]
pub async fn create_validation_request_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateValidationRequestDto>,
) -> Result<(StatusCode, Json<UserValidationRequest>), ApiError> {
    let full_name = require(Some(&payload.full_name), "full_name").map_err(ApiError::BadRequest)?;
    let email = require(Some(&payload.email), "email").map_err(ApiError::BadRequest)?;
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest(format!("Invalid email address: {}", email)));
    }
    let state = optional_state(payload.state.as_deref())?;

    let candidate = load_candidate(&pool, &payload.candidate_id.to_string())?;
    if candidate.clerk_user_id.is_some() {
        return Err(ApiError::Conflict("This profile has already been claimed".to_string()));
    }
    if repo::has_pending_request(&pool, candidate.id, &identity.user_id).map_err(ApiError::Database)? {
        return Err(ApiError::Conflict("You already have a pending request for this profile".to_string()));
    }

    let mut new_request = NewValidationRequest::new(candidate.id, identity.user_id.clone(), full_name, email);
    new_request.phone = non_blank(payload.phone.as_deref());
    new_request.position = non_blank(payload.position.as_deref());
    new_request.city = non_blank(payload.city.as_deref());
    new_request.state = state;

    let request = repo::create_validation_request(&pool, new_request)
        .map_err(|e| ApiError::from_repo(e, "Validation request"))?;
    info!("Created validation request {} for candidate {}", request.id, candidate.id);
    Ok((StatusCode::CREATED, Json(request)))
}

/// Handler for the review queue
///
/// This function handles GET requests to `/validation-requests`. Staff
/// only; `?status=PENDING` narrows the list.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn list_validation_requests_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the query parameters
    Query(query): Query<ValidationQueryDto>,
) -> Result<Json<Vec<UserValidationRequest>>, ApiError> {
    identity.require_staff()?;
    let requests = repo::list_validation_requests(&pool, query.status).map_err(ApiError::Database)?;
    Ok(Json(requests))
}

/// Handler for approving a claim
///
/// This function handles POST requests to `/validation-requests/{id}/approve`.
/// The requester becomes the owner of the verified profile and is notified
/// in-app and by email.
///
/// ### Errors
///
/// - 404 when the request doesn't exist
/// - 409 when it was already decided or the requester owns another profile
/// - 409 when the profile got an owner after the claim was filed
#[instrument(skip(pool, integrations, settings, identity), fields(user_id = %identity.user_id))]
pub async fn approve_validation_request_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    State(settings): State<Arc<Settings>>,
    identity: Identity,
    // Extract the request ID from the URL path
    Path(request_id): Path<String>,
) -> Result<Json<UserValidationRequest>, ApiError> {
    identity.require_staff()?;
    let request_id = parse_id(&request_id, "validation request")?;

    let approval = repo::approve_validation_request(&pool, request_id)
        .map_err(|e| ApiError::from_repo(e, "Validation request"))?;
    let (request, candidate) = match approval {
        Approval::Approved(request, candidate) => (request, candidate),
        Approval::AlreadyDecided => return Err(already_decided()),
        Approval::AlreadyClaimed => {
            return Err(ApiError::Conflict("This profile has already been claimed".to_string()));
        }
    };

    let profile_url = settings.url(&format!("/candidates/{}", candidate.slug));
    let notification = NewNotification::new(
        request.clerk_user_id.clone(),
        NotificationKind::Validation,
        "Profile verified".to_string(),
        format!("You now manage the profile of {}", candidate.name),
        Some(profile_url.clone()),
    );
    let email = email_templates::validation_approved(&request.full_name, &candidate.name, &profile_url);
    deliver_notification(&pool, integrations.email.as_ref(), notification, Some((request.email.as_str(), &email))).await;

    Ok(Json(request))
}

/// Handler for denying a claim
///
/// This function handles POST requests to `/validation-requests/{id}/deny`.
#[instrument(skip(pool, integrations, identity), fields(user_id = %identity.user_id))]
pub async fn deny_validation_request_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    Path(request_id): Path<String>,
) -> Result<Json<UserValidationRequest>, ApiError> {
    identity.require_staff()?;
    let request_id = parse_id(&request_id, "validation request")?;

    let request = repo::deny_validation_request(&pool, request_id)
        .map_err(|e| ApiError::from_repo(e, "Validation request"))?
        .ok_or_else(already_decided)?;

    let candidate_name = repo::get_candidate(&pool, request.candidate_id)
        .map_err(ApiError::Database)?
        .map(|candidate| candidate.name)
        .unwrap_or_else(|| "the candidate".to_string());
    let notification = NewNotification::new(
        request.clerk_user_id.clone(),
        NotificationKind::Validation,
        "Verification request denied".to_string(),
        format!("Your request to manage the profile of {} was not approved", candidate_name),
        None,
    );
    let email = email_templates::validation_denied(&request.full_name, &candidate_name);
    deliver_notification(&pool, integrations.email.as_ref(), notification, Some((request.email.as_str(), &email))).await;

    Ok(Json(request))
}
