use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::Identity;
use crate::db::DbPool;
use crate::dto::MeDto;
use crate::errors::ApiError;
use crate::models::UserRole;
use crate::repo;

/// Handler for the liveness check
///
/// This function handles GET requests to `/health`.
pub async fn health_handler(State(pool): State<Arc<DbPool>>) -> Json<Value> {
    let database = if pool.get().is_ok() { "ok" } else { "unavailable" };
    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for the caller's own account
///
/// This function handles GET requests to `/me`. The user record is created
/// the first time a signed-in user calls it and refreshed on later calls.
///
/// ### Returns
///
/// The identity from the session token together with the stored user
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn me_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller
    identity: Identity,
) -> Result<Json<MeDto>, ApiError> {
    let role = identity
        .role
        .as_deref()
        .and_then(|r| r.parse::<UserRole>().ok())
        .unwrap_or(UserRole::Voter);

    let user = repo::upsert_user(&pool, &identity.user_id, identity.email.clone(), None, role)
        .map_err(ApiError::Database)?;
    debug!("Resolved user record {}", user.id);

    Ok(Json(MeDto {
        user_id: identity.user_id,
        email: identity.email,
        is_admin: identity.is_admin,
        is_sub_admin: identity.is_sub_admin,
        role: identity.role,
        user,
    }))
}

/// Fallback for paths no route matches
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Route".to_string())
}

/// Fallback for known paths called with the wrong method
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}
