use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::optional_email;
use crate::auth::Identity;
use crate::db::DbPool;
use crate::dto::{CreateNotificationDto, NotificationQueryDto, UpdatedCountDto};
use crate::errors::{parse_id, ApiError};
use crate::integrations::email::send_best_effort;
use crate::integrations::Integrations;
use crate::models::{NewNotification, Notification, NotificationKind};
use crate::repo;
use crate::services::email_templates;
use crate::services::validation::{non_blank, require};

/// Handler for the caller's notifications
///
/// This function handles GET requests to `/notifications`, newest first.
/// `?unread=true` leaves out the ones already read.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn list_notifications_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the query parameters
    Query(query): Query<NotificationQueryDto>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = repo::list_notifications(&pool, &identity.user_id, query.unread.unwrap_or(false))
        .map_err(ApiError::Database)?;
    debug!("Returning {} notifications", notifications.len());
    Ok(Json(notifications))
}

/// Handler for sending a notification to a user
///
/// This function handles POST requests to `/notifications`. Staff only.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - The email client, if configured
/// * `identity` - The caller; must be staff
/// * `payload` - Recipient, content and whether to also send an email
///
/// ### Returns
///
/// 201 with the stored notification. Email delivery failures are logged and
/// don't change the response.
#[instrument(skip(pool, integrations, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_notification_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateNotificationDto>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    identity.require_staff()?;

    let recipient = require(Some(&payload.clerk_user_id), "clerk_user_id").map_err(ApiError::BadRequest)?;
    let title = require(Some(&payload.title), "title").map_err(ApiError::BadRequest)?;
    let body = require(Some(&payload.body), "body").map_err(ApiError::BadRequest)?;
    let override_email = optional_email(payload.email.as_deref())?;

    let notification = repo::create_notification(
        &pool,
        NewNotification::new(
            recipient,
            payload.kind.unwrap_or(NotificationKind::System),
            title,
            body,
            non_blank(payload.link.as_deref()),
        ),
    )
    .map_err(ApiError::Database)?;
    info!("Created notification {} for {}", notification.id, notification.clerk_user_id);

    if payload.send_email {
        let address = match override_email {
            Some(address) => Some(address),
            None => repo::get_user_by_clerk_id(&pool, &notification.clerk_user_id)
                .map_err(ApiError::Database)?
                .and_then(|user| user.email),
        };
        match address {
            Some(address) => {
                let email = email_templates::notification(
                    &notification.title,
                    &notification.body,
                    notification.link.as_deref(),
                );
                send_best_effort(integrations.email.as_ref(), &address, &email).await;
            }
            None => debug!("No email address for {}", notification.clerk_user_id),
        }
    }

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Handler for marking one notification read
///
/// This function handles POST requests to `/notifications/{id}/read`.
/// Another user's notification answers 404.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn mark_notification_read_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the notification ID from the URL path
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let notification_id = parse_id(&notification_id, "notification")?;
    let notification = repo::mark_notification_read(&pool, notification_id, &identity.user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Notification".to_string()))?;
    Ok(Json(notification))
}

/// Handler for marking every notification read
///
/// This function handles POST requests to `/notifications/read-all`.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn mark_all_notifications_read_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
) -> Result<Json<UpdatedCountDto>, ApiError> {
    let updated = repo::mark_all_notifications_read(&pool, &identity.user_id).map_err(ApiError::Database)?;
    Ok(Json(UpdatedCountDto { updated }))
}
