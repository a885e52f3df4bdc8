use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::Identity;
use crate::db::DbPool;
use crate::dto::RunTaskDto;
use crate::errors::ApiError;
use crate::integrations::Integrations;
use crate::services::admin_tasks::{self, TaskOutcome, TaskSpec, TASKS};

/// Handler for listing maintenance tasks
///
/// This function handles GET requests to `/admin/tasks`. Staff only.
pub async fn list_admin_tasks_handler(identity: Identity) -> Result<Json<&'static [TaskSpec]>, ApiError> {
    identity.require_staff()?;
    Ok(Json(TASKS))
}

/// Handler for running a maintenance task
///
/// This function handles POST requests to `/admin/tasks/{key}` with a body
/// of `{"params": {...}}`. Sub-admins may run the tasks not marked admin-only.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - Clients some tasks need
/// * `identity` - The caller; must be staff
/// * `key` - Which task to run
/// * `payload` - The task parameters; missing ones take their default
///
/// ### Returns
///
/// The task key, how many rows or jobs it changed and a summary message
///
/// ### Errors
///
/// - 400 for an unknown parameter or a value that isn't a non-negative integer
/// - 403 for an admin-only task run by a sub-admin
/// - 404 for an unknown task
#[instrument(skip(pool, integrations, identity, payload), fields(user_id = %identity.user_id))]
pub async fn run_admin_task_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    // Extract the task key from the URL path
    Path(key): Path<String>,
    Json(payload): Json<RunTaskDto>,
) -> Result<Json<TaskOutcome>, ApiError> {
    identity.require_staff()?;
    info!("Running task {}", key);

    let outcome = admin_tasks::run_task(&pool, &integrations, &key, identity.is_admin, &payload.params).await?;
    Ok(Json(outcome))
}
