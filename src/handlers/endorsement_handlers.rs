use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{deliver_notification, load_visible_candidate, owner_notification};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::CreateEndorsementDto;
use crate::errors::{parse_id, ApiError};
use crate::integrations::Integrations;
use crate::models::{Endorsement, NewEndorsement, NotificationKind};
use crate::repo;
use crate::services::email_templates;
use crate::services::validation::{non_blank, require};
use crate::state::Settings;

/// Handler for listing a candidate's endorsements
///
/// This function handles GET requests to `/candidates/{id}/endorsements`.
/// Private endorsements are only included for the profile owner and staff.
#[instrument(skip(pool, identity))]
pub async fn list_endorsements_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the candidate ID from the URL path
    Path(candidate_id): Path<String>,
) -> Result<Json<Vec<Endorsement>>, ApiError> {
    let candidate = load_visible_candidate(&pool, &candidate_id, &identity)?;
    let include_private = identity.can_manage(&candidate);

    let endorsements = repo::list_endorsements(&pool, candidate.id, include_private).map_err(ApiError::Database)?;
    Ok(Json(endorsements))
}

/// Handler for endorsing a candidate
///
/// This function handles POST requests to `/candidates/{id}/endorsements`.
/// The profile owner is notified in-app and, when email is configured, by
/// email.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - Used for the owner's email
/// * `settings` - Public site settings for the profile link
/// * `identity` - The endorser
/// * `candidate_id` - The candidate being endorsed
/// * `payload` - The endorsement text and options
///
/// ### Returns
///
/// 201 with the stored endorsement
///
/// ### Errors
///
/// - 400 for blank content or a candidate endorsing their own profile
/// - 409 when the caller already endorsed this candidate
#[instrument(skip(pool, integrations, settings, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_endorsement_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    State(settings): State<Arc<Settings>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateEndorsementDto>,
) -> Result<(StatusCode, Json<Endorsement>), ApiError> {
    let candidate = load_visible_candidate(&pool, &candidate_id, &MaybeIdentity(Some(identity.clone())))?;
    if identity.owns(&candidate) {
        return Err(ApiError::BadRequest("You cannot endorse your own profile".to_string()));
    }

    let content = require(Some(&payload.content), "content").map_err(ApiError::BadRequest)?;

    let stored_name = repo::get_user_by_clerk_id(&pool, &identity.user_id)
        .map_err(ApiError::Database)?
        .and_then(|user| user.name);
    let endorser_name = non_blank(payload.endorser_name.as_deref())
        .or(stored_name)
        .or_else(|| identity.email.clone())
        .unwrap_or_else(|| "A supporter".to_string());

    let mut new_endorsement = NewEndorsement::new(candidate.id, identity.user_id.clone(), endorser_name, content);
    new_endorsement.relationship = non_blank(payload.relationship.as_deref());
    new_endorsement.is_public = payload.is_public.unwrap_or(true);

    let endorsement = repo::create_endorsement(&pool, new_endorsement)
        .map_err(|e| ApiError::from_repo(e, "Endorsement"))?;
    info!("Stored endorsement {} for candidate {}", endorsement.id, candidate.id);

    let profile_url = settings.url(&format!("/candidates/{}", candidate.slug));
    if let Some(notification) = owner_notification(
        &candidate,
        NotificationKind::Endorsement,
        "New endorsement".to_string(),
        format!("{} endorsed you", endorsement.endorser_name),
        Some(profile_url.clone()),
    ) {
        let email = email_templates::endorsement_received(
            &candidate.name,
            &endorsement.endorser_name,
            &endorsement.content,
            &profile_url,
        );
        let recipient = candidate.email.as_deref().map(|to| (to, &email));
        deliver_notification(&pool, integrations.email.as_ref(), notification, recipient).await;
    }

    Ok((StatusCode::CREATED, Json(endorsement)))
}

/// Handler for withdrawing an endorsement
///
/// This function handles DELETE requests to `/endorsements/{id}`. Only the
/// author or staff may delete it.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn delete_endorsement_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(endorsement_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let endorsement_id = parse_id(&endorsement_id, "endorsement")?;
    let endorsement = repo::get_endorsement(&pool, endorsement_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Endorsement".to_string()))?;

    if endorsement.endorser_clerk_user_id != identity.user_id && !identity.is_staff() {
        return Err(ApiError::Forbidden);
    }

    repo::delete_endorsement(&pool, endorsement.id).map_err(ApiError::Database)?;
    info!("Deleted endorsement {}", endorsement.id);
    Ok(StatusCode::NO_CONTENT)
}
