use crate::db::DbPool;
use crate::models::{BatchJob, JobSnapshot, JobStatus, NewBatchJob};
use crate::schema::batch_jobs;
use crate::services::batch::SubmittedBatch;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Records a batch the provider has accepted
#[instrument(skip(pool, submitted), fields(provider_name = %submitted.provider_name))]
pub fn create_batch_job(
    pool: &DbPool,
    submitted: &SubmittedBatch,
    display_name: &str,
    model: &str,
    request_count: i32,
) -> Result<BatchJob> {
    let conn = &mut pool.get()?;

    let new_job = NewBatchJob::new(
        submitted.provider_name.clone(),
        display_name.to_string(),
        model.to_string(),
        submitted.snapshot.status,
        request_count,
    );
    let job = diesel::insert_into(batch_jobs::table)
        .values(&new_job)
        .returning(BatchJob::as_returning())
        .get_result(conn)?;

    // A provider may reject a batch synchronously
    if job.status.is_terminal() {
        return apply(conn, job, &submitted.snapshot);
    }

    info!("Created batch job {}", job.id);
    Ok(job)
}

#[instrument(skip(pool))]
pub fn get_batch_job(pool: &DbPool, job_id: i32) -> Result<Option<BatchJob>> {
    let conn = &mut pool.get()?;
    let job = batch_jobs::table
        .find(job_id)
        .select(BatchJob::as_select())
        .first(conn)
        .optional()?;
    Ok(job)
}

/// Lists batch jobs, newest first
#[instrument(skip(pool))]
pub fn list_batch_jobs(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<BatchJob>> {
    let conn = &mut pool.get()?;
    let jobs = batch_jobs::table
        .order(batch_jobs::id.desc())
        .limit(limit)
        .offset(offset)
        .select(BatchJob::as_select())
        .load(conn)?;
    debug!("Found {} batch jobs", jobs.len());
    Ok(jobs)
}

/// Jobs that still need polling, oldest first
#[instrument(skip(pool))]
pub fn list_active_batch_jobs(pool: &DbPool) -> Result<Vec<BatchJob>> {
    let conn = &mut pool.get()?;
    let jobs = batch_jobs::table
        .filter(batch_jobs::status.eq_any([JobStatus::Pending, JobStatus::Running]))
        .order(batch_jobs::id.asc())
        .select(BatchJob::as_select())
        .load(conn)?;
    Ok(jobs)
}

fn apply(conn: &mut SqliteConnection, job: BatchJob, snapshot: &JobSnapshot) -> Result<BatchJob> {
    if job.status.is_terminal() && job.completed_at.is_some() {
        debug!("Batch job {} is already {}, ignoring snapshot", job.id, job.status);
        return Ok(job);
    }

    let now = Utc::now().naive_utc();
    let status = if job.status.is_terminal() { job.status } else { snapshot.status };
    let completed_at = status.is_terminal().then_some(now);

    let updated = diesel::update(batch_jobs::table.find(job.id))
        .set((
            batch_jobs::status.eq(status),
            batch_jobs::result_file.eq(snapshot.result_file.clone().or(job.result_file)),
            batch_jobs::error_message.eq(snapshot.error_message.clone().or(job.error_message)),
            batch_jobs::updated_at.eq(now),
            batch_jobs::completed_at.eq(completed_at),
        ))
        .returning(BatchJob::as_returning())
        .get_result(conn)?;
    Ok(updated)
}

/// Stores a status observation for a job
///
/// A job that already reached a terminal status is left untouched, so late
/// or out-of-order polls can never move it again.
///
/// ### Errors
///
/// A not-found error if the job doesn't exist
#[instrument(skip(pool, snapshot), fields(status = %snapshot.status))]
pub fn apply_batch_snapshot(pool: &DbPool, job_id: i32, snapshot: &JobSnapshot) -> Result<BatchJob> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let job: BatchJob = batch_jobs::table
            .find(job_id)
            .select(BatchJob::as_select())
            .first(conn)?;
        apply(conn, job, snapshot)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn snapshot(status: JobStatus) -> JobSnapshot {
        JobSnapshot {
            status,
            result_file: None,
            error_message: None,
        }
    }

    fn submitted(name: &str, status: JobStatus) -> SubmittedBatch {
        SubmittedBatch {
            provider_name: name.to_string(),
            snapshot: snapshot(status),
        }
    }

    #[test]
    fn test_create_and_list_active_jobs() {
        let pool = setup_test_db();
        let pending = create_batch_job(&pool, &submitted("batches/a", JobStatus::Pending), "Bios", "gemini", 3).unwrap();
        let done = create_batch_job(&pool, &submitted("batches/b", JobStatus::Succeeded), "Tags", "gemini", 1).unwrap();

        assert_eq!(pending.status, JobStatus::Pending);
        assert_eq!(pending.request_count, 3);
        assert!(pending.completed_at.is_none());
        assert!(done.completed_at.is_some());

        let active: Vec<i32> = list_active_batch_jobs(&pool).unwrap().iter().map(|j| j.id).collect();
        assert_eq!(active, vec![pending.id]);

        let all: Vec<i32> = list_batch_jobs(&pool, 50, 0).unwrap().iter().map(|j| j.id).collect();
        assert_eq!(all, vec![done.id, pending.id]);
    }

    #[test]
    fn test_snapshot_moves_job_to_terminal() {
        let pool = setup_test_db();
        let job = create_batch_job(&pool, &submitted("batches/a", JobStatus::Pending), "Bios", "gemini", 3).unwrap();

        let running = apply_batch_snapshot(&pool, job.id, &snapshot(JobStatus::Running)).unwrap();
        assert_eq!(running.status, JobStatus::Running);
        assert!(running.completed_at.is_none());

        let finished = apply_batch_snapshot(
            &pool,
            job.id,
            &JobSnapshot {
                status: JobStatus::Succeeded,
                result_file: Some("files/out-1".to_string()),
                error_message: None,
            },
        )
        .unwrap();
        assert_eq!(finished.status, JobStatus::Succeeded);
        assert_eq!(finished.result_file.as_deref(), Some("files/out-1"));
        assert!(finished.completed_at.is_some());
    }

    #[test]
    fn test_terminal_jobs_never_change() {
        let pool = setup_test_db();
        let job = create_batch_job(&pool, &submitted("batches/a", JobStatus::Pending), "Bios", "gemini", 3).unwrap();
        let failed = apply_batch_snapshot(
            &pool,
            job.id,
            &JobSnapshot {
                status: JobStatus::Failed,
                result_file: None,
                error_message: Some("quota exceeded".to_string()),
            },
        )
        .unwrap();

        let late = apply_batch_snapshot(&pool, job.id, &snapshot(JobStatus::Running)).unwrap();
        assert_eq!(late, failed);
    }

    #[test]
    fn test_duplicate_provider_name_conflicts() {
        let pool = setup_test_db();
        create_batch_job(&pool, &submitted("batches/a", JobStatus::Pending), "Bios", "gemini", 3).unwrap();
        let err = create_batch_job(&pool, &submitted("batches/a", JobStatus::Pending), "Again", "gemini", 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<diesel::result::Error>(),
            Some(diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _))
        ));
    }

    #[test]
    fn test_missing_job_is_not_found() {
        let pool = setup_test_db();
        let err = apply_batch_snapshot(&pool, 7, &snapshot(JobStatus::Running)).unwrap_err();
        assert!(matches!(err.downcast_ref::<diesel::result::Error>(), Some(diesel::result::Error::NotFound)));
    }
}
