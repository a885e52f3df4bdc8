use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{info, instrument};

use super::page;
use crate::auth::Identity;
use crate::db::DbPool;
use crate::dto::{CreateBatchJobDto, PageQueryDto};
use crate::errors::{parse_id, ApiError};
use crate::integrations::Integrations;
use crate::models::BatchJob;
use crate::repo;
use crate::services::batch::{self, validate_prompts};
use crate::services::validation::non_blank;

fn load_batch_job(pool: &DbPool, raw_id: &str) -> Result<BatchJob, ApiError> {
    let job_id = parse_id(raw_id, "batch job")?;
    repo::get_batch_job(pool, job_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Batch job".to_string()))
}

/// Handler for listing tracked batch jobs
///
/// This function handles GET requests to `/batch-jobs`. Staff only; newest first.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn list_batch_jobs_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the query parameters
    Query(query): Query<PageQueryDto>,
) -> Result<Json<Vec<BatchJob>>, ApiError> {
    identity.require_staff()?;
    let (limit, offset) = page(query.limit, query.offset)?;
    let jobs = repo::list_batch_jobs(&pool, limit, offset).map_err(ApiError::Database)?;
    Ok(Json(jobs))
}

/// Handler for retrieving a batch job
///
/// This function handles GET requests to `/batch-jobs/{id}`. The stored
/// state is returned; use the refresh endpoint to poll the provider.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn get_batch_job_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the job ID from the URL path
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, ApiError> {
    identity.require_staff()?;
    Ok(Json(load_batch_job(&pool, &job_id)?))
}

/// Handler for submitting a batch of prompts
///
/// This function handles POST requests to `/batch-jobs`. Admin only.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - The batch API client
/// * `identity` - The caller; must be an admin
/// * `payload` - Display name, optional model and the prompts
///
/// ### Returns
///
/// 201 with the tracked job
///
/// ### Errors
///
/// - 400 for no prompts, blank or duplicate keys, or a blank display name
/// - 503 when the batch API isn't configured
#[instrument(skip(pool, integrations, identity, payload), fields(user_id = %identity.user_id, count = payload.prompts.len()))]
pub async fn create_batch_job_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateBatchJobDto>,
) -> Result<(StatusCode, Json<BatchJob>), ApiError> {
    identity.require_admin()?;
    validate_prompts(&payload.prompts).map_err(ApiError::BadRequest)?;
    let display_name = non_blank(Some(&payload.display_name))
        .ok_or_else(|| ApiError::BadRequest("display_name is required".to_string()))?;

    let provider = integrations.batch()?;
    let model = non_blank(payload.model.as_deref()).unwrap_or_else(|| provider.default_model().to_string());

    let job = batch::submit_job(&pool, provider, &display_name, &model, &payload.prompts).await?;
    info!("Submitted batch job {} with {} prompts", job.id, job.request_count);
    Ok((StatusCode::CREATED, Json(job)))
}

/// Handler for polling a batch job
///
/// This function handles POST requests to `/batch-jobs/{id}/refresh`. A job
/// that already finished is returned without contacting the provider.
#[instrument(skip(pool, integrations, identity), fields(user_id = %identity.user_id))]
pub async fn refresh_batch_job_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJob>, ApiError> {
    identity.require_staff()?;
    let job = load_batch_job(&pool, &job_id)?;
    if job.status.is_terminal() {
        return Ok(Json(job));
    }

    let provider = integrations.batch()?;
    let job = batch::refresh_job(&pool, provider, job).await?;
    Ok(Json(job))
}
