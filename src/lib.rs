/// Elevra: civic-engagement backend
///
/// This library provides candidate profiles, elections listings, voter
/// donations, a vendor marketplace, notifications and admin tooling behind a
/// JSON API.
///
/// ### Modules
///
/// - `auth`: Identity extraction from signed session tokens
/// - `config`: Layered configuration (defaults, config file, CLI/env)
/// - `db`: Database connection management
/// - `dto`: Request and response payloads
/// - `errors`: API error type and its HTTP mapping
/// - `handlers`: Route handlers
/// - `integrations`: Payments, storage, email, telemetry and LLM batch clients
/// - `models`: Data structures mapped to database tables
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
/// - `services`: Fee calculation, slugs, email templates, route resolution,
///   batch tracking and the admin task registry
/// - `state`: Shared application state

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod repo;
pub mod schema;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod test_utils;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

pub use errors::ApiError;
pub use state::AppState;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the application router with all routes configured
///
/// ### Arguments
///
/// * `state` - The shared application state
///
/// ### Returns
///
/// An Axum Router with every API route and JSON fallbacks for unknown paths
/// and methods
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/me", get(handlers::me_handler))
        // Candidates
        .route("/candidates", get(handlers::list_candidates_handler).post(handlers::create_candidate_handler))
        .route(
            "/candidates/{id}",
            get(handlers::get_candidate_handler)
                .patch(handlers::update_candidate_handler)
                .delete(handlers::delete_candidate_handler),
        )
        .route("/candidates/slug/{slug}", get(handlers::get_candidate_by_slug_handler))
        .route(
            "/candidates/{id}/content-blocks",
            get(handlers::list_content_blocks_handler)
                .post(handlers::append_content_block_handler)
                .put(handlers::replace_content_blocks_handler),
        )
        .route("/candidates/{id}/content-blocks/reset", post(handlers::reset_content_blocks_handler))
        .route(
            "/content-blocks/{id}",
            patch(handlers::update_content_block_handler).delete(handlers::delete_content_block_handler),
        )
        .route(
            "/candidates/{id}/endorsements",
            get(handlers::list_endorsements_handler).post(handlers::create_endorsement_handler),
        )
        .route("/endorsements/{id}", delete(handlers::delete_endorsement_handler))
        .route(
            "/candidates/{id}/views",
            get(handlers::view_stats_handler).post(handlers::record_view_handler),
        )
        .route("/candidates/{id}/donations", get(handlers::list_candidate_donations_handler))
        .route("/candidates/{id}/donations/summary", get(handlers::donation_summary_handler))
        // Elections
        .route("/elections", get(handlers::list_elections_handler).post(handlers::create_election_handler))
        .route("/elections/{id}", get(handlers::get_election_handler))
        .route("/elections/{id}/candidates", get(handlers::list_election_candidates_handler))
        .route(
            "/elections/{id}/candidates/{candidate_id}",
            post(handlers::link_candidate_handler).delete(handlers::unlink_candidate_handler),
        )
        // Donations
        .route("/donations/fee-quote", post(handlers::fee_quote_handler))
        .route("/donations/checkout", post(handlers::checkout_handler))
        .route("/donations/confirm", post(handlers::confirm_donation_handler))
        // Vendors
        .route("/vendors", get(handlers::list_vendors_handler).post(handlers::create_vendor_handler))
        .route("/vendors/{id}", get(handlers::get_vendor_handler).patch(handlers::update_vendor_handler))
        .route("/vendors/slug/{slug}", get(handlers::get_vendor_by_slug_handler))
        // Notifications
        .route(
            "/notifications",
            get(handlers::list_notifications_handler).post(handlers::create_notification_handler),
        )
        .route("/notifications/read-all", post(handlers::mark_all_notifications_read_handler))
        .route("/notifications/{id}/read", post(handlers::mark_notification_read_handler))
        // Validation requests
        .route(
            "/validation-requests",
            get(handlers::list_validation_requests_handler).post(handlers::create_validation_request_handler),
        )
        .route("/validation-requests/{id}/approve", post(handlers::approve_validation_request_handler))
        .route("/validation-requests/{id}/deny", post(handlers::deny_validation_request_handler))
        // Uploads and search
        .route("/uploads", post(handlers::create_upload_handler))
        .route("/resolve", get(handlers::resolve_handler))
        // LLM batch jobs
        .route("/batch-jobs", get(handlers::list_batch_jobs_handler).post(handlers::create_batch_job_handler))
        .route("/batch-jobs/{id}", get(handlers::get_batch_job_handler))
        .route("/batch-jobs/{id}/refresh", post(handlers::refresh_batch_job_handler))
        // Admin tasks
        .route("/admin/tasks", get(handlers::list_admin_tasks_handler))
        .route("/admin/tasks/{key}", post(handlers::run_admin_task_handler))
        .fallback(handlers::not_found_handler)
        .method_not_allowed_fallback(handlers::method_not_allowed_handler)
        .with_state(state)
}

/// Runs any pending database migrations
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Errors
///
/// Returns an error if a migration fails to apply
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    if !applied.is_empty() {
        info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}
