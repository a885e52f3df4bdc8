use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    /// Lifecycle of an LLM batch job as tracked locally
    JobStatus {
        Pending => "PENDING",
        Running => "RUNNING",
        Succeeded => "SUCCEEDED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
        Expired => "EXPIRED",
    }
}

impl JobStatus {
    /// Terminal jobs are never polled again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Expired
        )
    }

    /// Maps a provider batch state onto the local status
    ///
    /// Accepts both the `BATCH_STATE_*` and `JOB_STATE_*` spellings. Anything
    /// unrecognised is treated as still pending so it gets polled again.
    pub fn from_provider_state(state: &str) -> Self {
        let suffix = state
            .strip_prefix("BATCH_STATE_")
            .or_else(|| state.strip_prefix("JOB_STATE_"))
            .unwrap_or(state);
        match suffix {
            "PENDING" | "QUEUED" | "UNSPECIFIED" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" | "CANCELLING" => JobStatus::Cancelled,
            "EXPIRED" => JobStatus::Expired,
            _ => JobStatus::Pending,
        }
    }
}

/// A batch of prompts submitted to the LLM batch API
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::batch_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchJob {
    pub id: i32,
    /// Resource name assigned by the provider, e.g. `batches/abc123`
    pub provider_name: String,
    pub display_name: String,
    pub model: String,
    pub status: JobStatus,
    pub request_count: i32,
    /// Provider reference to the results, once succeeded
    pub result_file: Option<String>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::batch_jobs)]
pub struct NewBatchJob {
    pub provider_name: String,
    pub display_name: String,
    pub model: String,
    pub status: JobStatus,
    pub request_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewBatchJob {
    pub fn new(provider_name: String, display_name: String, model: String, status: JobStatus, request_count: i32) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            provider_name,
            display_name,
            model,
            status,
            request_count,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A status observation returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub result_file: Option<String>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_state_mapping() {
        assert_eq!(JobStatus::from_provider_state("BATCH_STATE_PENDING"), JobStatus::Pending);
        assert_eq!(JobStatus::from_provider_state("BATCH_STATE_RUNNING"), JobStatus::Running);
        assert_eq!(JobStatus::from_provider_state("BATCH_STATE_SUCCEEDED"), JobStatus::Succeeded);
        assert_eq!(JobStatus::from_provider_state("JOB_STATE_FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::from_provider_state("JOB_STATE_CANCELLED"), JobStatus::Cancelled);
        assert_eq!(JobStatus::from_provider_state("BATCH_STATE_EXPIRED"), JobStatus::Expired);
        assert_eq!(JobStatus::from_provider_state("SOMETHING_NEW"), JobStatus::Pending);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = JobStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![&JobStatus::Succeeded, &JobStatus::Failed, &JobStatus::Cancelled, &JobStatus::Expired]
        );
    }
}
