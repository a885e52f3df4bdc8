/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// checking who may perform it, validating the input, calling the repository
/// or an integration, and returning a properly formatted response.

mod general_handlers;
mod candidate_handlers;
mod content_block_handlers;
mod endorsement_handlers;
mod view_handlers;
mod election_handlers;
mod donation_handlers;
mod vendor_handlers;
mod notification_handlers;
mod validation_handlers;
mod upload_handlers;
mod resolve_handlers;
mod batch_job_handlers;
mod admin_handlers;

// Re-export all handlers
pub use general_handlers::*;
pub use candidate_handlers::*;
pub use content_block_handlers::*;
pub use endorsement_handlers::*;
pub use view_handlers::*;
pub use election_handlers::*;
pub use donation_handlers::*;
pub use vendor_handlers::*;
pub use notification_handlers::*;
pub use validation_handlers::*;
pub use upload_handlers::*;
pub use resolve_handlers::*;
pub use batch_job_handlers::*;
pub use admin_handlers::*;

use crate::auth::MaybeIdentity;
use crate::db::DbPool;
use crate::dto;
use crate::errors::{parse_id, ApiError};
use crate::integrations::email::send_best_effort;
use crate::integrations::EmailClient;
use crate::models::{Candidate, NewNotification, NotificationKind};
use crate::repo;
use crate::services::email_templates::RenderedEmail;
use crate::services::validation;
use tracing::warn;

/// Loads a candidate by raw path id
pub(crate) fn load_candidate(pool: &DbPool, raw_id: &str) -> Result<Candidate, ApiError> {
    let candidate_id = parse_id(raw_id, "candidate")?;
    repo::get_candidate(pool, candidate_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Candidate".to_string()))
}

/// Loads a candidate the caller is allowed to see
///
/// Hidden profiles only exist for their owner and staff.
pub(crate) fn load_visible_candidate(pool: &DbPool, raw_id: &str, identity: &MaybeIdentity) -> Result<Candidate, ApiError> {
    let candidate = load_candidate(pool, raw_id)?;
    if candidate.hidden && !identity.can_manage(&candidate) {
        return Err(ApiError::NotFound("Candidate".to_string()));
    }
    Ok(candidate)
}

pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), ApiError> {
    dto::page(limit, offset).map_err(ApiError::BadRequest)
}

/// Validates an optional email field
pub(crate) fn optional_email(value: Option<&str>) -> Result<Option<String>, ApiError> {
    match validation::non_blank(value) {
        Some(email) if !validation::is_valid_email(&email) => {
            Err(ApiError::BadRequest(format!("Invalid email address: {}", email)))
        }
        other => Ok(other),
    }
}

/// Validates an optional two-letter state code
pub(crate) fn optional_state(value: Option<&str>) -> Result<Option<String>, ApiError> {
    match validation::non_blank(value) {
        Some(state) => validation::normalize_state(&state)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid state code: {}", state))),
        None => Ok(None),
    }
}

/// Stores an in-app notification and optionally emails it
///
/// Failures are logged and never fail the calling request.
pub(crate) async fn deliver_notification(
    pool: &DbPool,
    email_client: Option<&EmailClient>,
    notification: NewNotification,
    email: Option<(&str, &RenderedEmail)>,
) {
    if let Err(err) = repo::create_notification(pool, notification) {
        warn!("Failed to store notification: {:#}", err);
    }
    if let Some((to, rendered)) = email {
        send_best_effort(email_client, to, rendered).await;
    }
}

/// Builds a notification for the owner of a candidate, if it has one
pub(crate) fn owner_notification(
    candidate: &Candidate,
    kind: NotificationKind,
    title: String,
    body: String,
    link: Option<String>,
) -> Option<NewNotification> {
    candidate
        .clerk_user_id
        .as_ref()
        .map(|owner| NewNotification::new(owner.clone(), kind, title, body, link))
}
