//! Registry of named maintenance tasks
//!
//! Every task is listed statically with its parameters, so the admin UI can
//! render a form for it and the dispatcher can type-check what it receives.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::integrations::Integrations;
use crate::repo;
use crate::services::batch::{self, BatchError};

/// A non-negative integer parameter with a default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    /// Sub-admins may list but not run these
    pub admin_only: bool,
}

pub const TASKS: &[TaskSpec] = &[
    TaskSpec {
        key: "expire-pending-donations",
        title: "Expire pending donations",
        description: "Marks donations whose checkout was never completed as failed.",
        params: &[ParamSpec {
            name: "older_than_hours",
            description: "Only donations created at least this many hours ago",
            default: 24,
        }],
        admin_only: true,
    },
    TaskSpec {
        key: "regenerate-candidate-slugs",
        title: "Regenerate candidate slugs",
        description: "Recomputes every candidate slug from the current name.",
        params: &[],
        admin_only: true,
    },
    TaskSpec {
        key: "hide-past-elections",
        title: "Hide past elections",
        description: "Hides elections whose date has passed.",
        params: &[ParamSpec {
            name: "grace_days",
            description: "Keep elections visible for this many days after they happen",
            default: 0,
        }],
        admin_only: false,
    },
    TaskSpec {
        key: "purge-candidate-views",
        title: "Purge old profile views",
        description: "Deletes profile view records older than the retention window.",
        params: &[ParamSpec {
            name: "older_than_days",
            description: "Retention window in days",
            default: 365,
        }],
        admin_only: true,
    },
    TaskSpec {
        key: "sync-batch-jobs",
        title: "Sync LLM batch jobs",
        description: "Polls the batch API once for every job that hasn't finished.",
        params: &[],
        admin_only: false,
    },
];

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Task {0} can only be run by an admin")]
    AdminOnly(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParam { name: String, reason: String },
    #[error("Unknown parameter: {0}")]
    UnknownParam(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Result of a task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub key: String,
    /// Number of rows or jobs the task changed
    pub affected: usize,
    pub message: String,
}

pub fn find_task(key: &str) -> Option<&'static TaskSpec> {
    TASKS.iter().find(|task| task.key == key)
}

/// Type-checks the supplied parameters and fills in defaults
///
/// ### Errors
///
/// - `UnknownParam` for a name the task doesn't declare
/// - `InvalidParam` for anything but a non-negative integer
pub fn resolve_params(task: &TaskSpec, supplied: &Map<String, Value>) -> Result<HashMap<&'static str, i64>, TaskError> {
    if let Some(unknown) = supplied.keys().find(|name| !task.params.iter().any(|p| p.name == name.as_str())) {
        return Err(TaskError::UnknownParam(unknown.clone()));
    }

    task.params
        .iter()
        .map(|param| {
            let value = match supplied.get(param.name) {
                None | Some(Value::Null) => param.default,
                Some(value) => value.as_i64().filter(|v| *v >= 0).ok_or_else(|| TaskError::InvalidParam {
                    name: param.name.to_string(),
                    reason: format!("expected a non-negative integer, got {}", value),
                })?,
            };
            Ok::<_, TaskError>((param.name, value))
        })
        .collect()
}

fn out_of_range(name: &str) -> TaskError {
    TaskError::InvalidParam {
        name: name.to_string(),
        reason: "value is too large".to_string(),
    }
}

fn hours_ago(now: NaiveDateTime, hours: i64, name: &str) -> Result<NaiveDateTime, TaskError> {
    TimeDelta::try_hours(hours)
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| out_of_range(name))
}

fn days_before(today: NaiveDate, days: i64, name: &str) -> Result<NaiveDate, TaskError> {
    today
        .checked_sub_days(Days::new(days as u64))
        .ok_or_else(|| out_of_range(name))
}

/// Runs a task by key
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - Configured third-party clients
/// * `key` - The task to run
/// * `is_admin` - Whether the caller is a full admin
/// * `supplied` - Raw parameters from the request body
///
/// ### Returns
///
/// What the task changed
#[instrument(skip(pool, integrations, supplied))]
pub async fn run_task(
    pool: &DbPool,
    integrations: &Integrations,
    key: &str,
    is_admin: bool,
    supplied: &Map<String, Value>,
) -> Result<TaskOutcome, TaskError> {
    let task = find_task(key).ok_or_else(|| TaskError::UnknownTask(key.to_string()))?;
    if task.admin_only && !is_admin {
        return Err(TaskError::AdminOnly(task.key));
    }
    let params = resolve_params(task, supplied)?;
    let param = |name: &str| params.get(name).copied().unwrap_or_default();

    let now = Utc::now().naive_utc();
    let (affected, message) = match task.key {
        "expire-pending-donations" => {
            let hours = param("older_than_hours");
            let cutoff = hours_ago(now, hours, "older_than_hours")?;
            let affected = repo::expire_pending_donations(pool, cutoff)?;
            (affected, format!("Expired {} pending donation(s) older than {} hour(s)", affected, hours))
        }
        "regenerate-candidate-slugs" => {
            let affected = repo::regenerate_candidate_slugs(pool)?;
            (affected, format!("Updated {} candidate slug(s)", affected))
        }
        "hide-past-elections" => {
            let grace = param("grace_days");
            let before = days_before(now.date(), grace, "grace_days")?;
            let affected = repo::hide_past_elections(pool, before)?;
            (affected, format!("Hid {} election(s) dated before {}", affected, before))
        }
        "purge-candidate-views" => {
            let days = param("older_than_days");
            let cutoff = hours_ago(now, days.saturating_mul(24), "older_than_days")?;
            let affected = repo::purge_views_before(pool, cutoff)?;
            (affected, format!("Deleted {} view(s) older than {} day(s)", affected, days))
        }
        "sync-batch-jobs" => {
            let provider = integrations.batch().map_err(BatchError::from)?;
            let affected = batch::sync_jobs(pool, provider).await?;
            (affected, format!("{} batch job(s) changed status", affected))
        }
        other => return Err(TaskError::UnknownTask(other.to_string())),
    };

    info!("Task {} finished: {}", task.key, message);
    Ok(TaskOutcome {
        key: task.key.to_string(),
        affected,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::IntegrationError;
    use crate::test_utils::{insert_election, setup_test_db};
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_registry_keys_are_unique() {
        let mut keys: Vec<&str> = TASKS.iter().map(|t| t.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), TASKS.len());
        assert!(find_task("sync-batch-jobs").is_some());
        assert!(find_task("drop-database").is_none());
    }

    #[test]
    fn test_resolve_params_defaults_and_checks() {
        let task = find_task("expire-pending-donations").unwrap();

        let resolved = resolve_params(task, &Map::new()).unwrap();
        assert_eq!(resolved["older_than_hours"], 24);

        let resolved = resolve_params(task, &params(json!({"older_than_hours": 6}))).unwrap();
        assert_eq!(resolved["older_than_hours"], 6);

        let err = resolve_params(task, &params(json!({"older_than_hours": -1}))).unwrap_err();
        assert!(matches!(err, TaskError::InvalidParam { .. }));

        let err = resolve_params(task, &params(json!({"older_than_hours": "six"}))).unwrap_err();
        assert!(matches!(err, TaskError::InvalidParam { .. }));

        let err = resolve_params(task, &params(json!({"hours": 6}))).unwrap_err();
        assert_eq!(err.to_string(), "Unknown parameter: hours");
    }

    #[tokio::test]
    async fn test_admin_only_tasks_reject_sub_admins() {
        let pool = setup_test_db();
        let err = run_task(&pool, &Integrations::default(), "regenerate-candidate-slugs", false, &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::AdminOnly("regenerate-candidate-slugs")));
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let pool = setup_test_db();
        let err = run_task(&pool, &Integrations::default(), "nope", true, &Map::new()).await.unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn test_hide_past_elections_task() {
        let pool = setup_test_db();
        insert_election(&pool, "Mayor", NaiveDate::from_ymd_opt(2001, 11, 6).unwrap());
        insert_election(&pool, "Mayor", NaiveDate::from_ymd_opt(2999, 11, 6).unwrap());

        let outcome = run_task(&pool, &Integrations::default(), "hide-past-elections", false, &Map::new())
            .await
            .unwrap();
        assert_eq!(outcome.key, "hide-past-elections");
        assert_eq!(outcome.affected, 1);
    }

    #[tokio::test]
    async fn test_oversized_param_is_rejected() {
        let pool = setup_test_db();
        let err = run_task(
            &pool,
            &Integrations::default(),
            "purge-candidate-views",
            true,
            &params(json!({"older_than_days": i64::MAX})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidParam { .. }));
    }

    #[tokio::test]
    async fn test_sync_batch_jobs_needs_provider() {
        let pool = setup_test_db();
        let err = run_task(&pool, &Integrations::default(), "sync-batch-jobs", false, &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::Batch(BatchError::Provider(IntegrationError::NotConfigured(_)))
        ));
    }
}
