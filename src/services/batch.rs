//! LLM batch-job tracking
//!
//! Jobs are submitted once, then polled on demand. Each poll persists the
//! provider's answer; a job that reached a terminal status is never polled
//! or changed again.

use std::collections::HashSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::db::DbPool;
use crate::integrations::IntegrationError;
use crate::models::{BatchJob, JobSnapshot};
use crate::repo;

/// One prompt in a batch, identified by a caller-chosen key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPrompt {
    pub key: String,
    pub text: String,
}

/// What the provider returns when a batch is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedBatch {
    pub provider_name: String,
    pub snapshot: JobSnapshot,
}

/// A batch API the tracker can submit to and poll
pub trait BatchProvider {
    fn submit(
        &self,
        display_name: &str,
        model: &str,
        prompts: &[BatchPrompt],
    ) -> impl Future<Output = Result<SubmittedBatch, IntegrationError>> + Send;

    fn poll(&self, provider_name: &str) -> impl Future<Output = Result<JobSnapshot, IntegrationError>> + Send;
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Provider(#[from] IntegrationError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Checks that a batch has prompts with unique, non-blank keys and text
pub fn validate_prompts(prompts: &[BatchPrompt]) -> Result<(), String> {
    if prompts.is_empty() {
        return Err("A batch needs at least one prompt".to_string());
    }
    let mut seen = HashSet::new();
    for (index, prompt) in prompts.iter().enumerate() {
        if prompt.key.trim().is_empty() {
            return Err(format!("Prompt {} has an empty key", index));
        }
        if prompt.text.trim().is_empty() {
            return Err(format!("Prompt {} has no text", prompt.key));
        }
        if !seen.insert(prompt.key.as_str()) {
            return Err(format!("Duplicate prompt key: {}", prompt.key));
        }
    }
    Ok(())
}

/// Submits a batch to the provider and records it
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `provider` - The batch API
/// * `display_name` - Human-readable label for the batch
/// * `model` - Model to run the prompts against
/// * `prompts` - The prompts to run
///
/// ### Returns
///
/// The persisted job in whatever status the provider reported on submission
#[instrument(skip(pool, provider, prompts), fields(count = prompts.len()))]
pub async fn submit_job<P: BatchProvider>(
    pool: &DbPool,
    provider: &P,
    display_name: &str,
    model: &str,
    prompts: &[BatchPrompt],
) -> Result<BatchJob, BatchError> {
    validate_prompts(prompts).map_err(BatchError::Invalid)?;
    if display_name.trim().is_empty() {
        return Err(BatchError::Invalid("display_name is required".to_string()));
    }

    let submitted = provider.submit(display_name, model, prompts).await?;
    let job = repo::create_batch_job(pool, &submitted, display_name, model, prompts.len() as i32)?;

    info!("Tracking batch job {} as {}", job.id, job.provider_name);
    Ok(job)
}

/// Polls the provider once for a job and stores the result
///
/// Terminal jobs are returned unchanged without contacting the provider.
#[instrument(skip(pool, provider, job), fields(job_id = job.id))]
pub async fn refresh_job<P: BatchProvider>(pool: &DbPool, provider: &P, job: BatchJob) -> Result<BatchJob, BatchError> {
    if job.status.is_terminal() {
        return Ok(job);
    }

    let snapshot = provider.poll(&job.provider_name).await?;
    let updated = repo::apply_batch_snapshot(pool, job.id, &snapshot)?;
    if updated.status != job.status {
        info!("Batch job {} moved from {} to {}", job.id, job.status, updated.status);
    }
    Ok(updated)
}

/// Refreshes every non-terminal job
///
/// A failed poll is logged and the remaining jobs are still processed.
///
/// ### Returns
///
/// The number of jobs whose status changed
#[instrument(skip(pool, provider))]
pub async fn sync_jobs<P: BatchProvider>(pool: &DbPool, provider: &P) -> Result<usize, BatchError> {
    let jobs = repo::list_active_batch_jobs(pool)?;
    let mut changed = 0;

    for job in jobs {
        let before = job.status;
        let job_id = job.id;
        match refresh_job(pool, provider, job).await {
            Ok(updated) if updated.status != before => changed += 1,
            Ok(_) => {}
            Err(err) => warn!("Could not refresh batch job {}: {}", job_id, err),
        }
    }

    Ok(changed)
}
