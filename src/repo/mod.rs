/// Repository module
///
/// This module provides the data access layer for the application.
/// Every function takes the shared connection pool, checks out a connection
/// and returns an `anyhow::Result`; multi-step writes run in a transaction.
///
/// Handlers classify the errors with `ApiError::from_repo`, so missing rows
/// and constraint violations surface as 404 and 409.

mod user_repo;
mod candidate_repo;
mod content_block_repo;
mod endorsement_repo;
mod view_repo;
mod election_repo;
mod donation_repo;
mod vendor_repo;
mod notification_repo;
mod validation_repo;
mod batch_job_repo;

/// Escapes `\`, `%` and `_` so text matches literally in a LIKE pattern
/// written with `ESCAPE '\'`
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// LIKE pattern matching `text` anywhere in a column
pub(crate) fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text.trim()))
}

// Re-export all repository functions
pub use user_repo::*;
pub use candidate_repo::*;
pub use content_block_repo::*;
pub use endorsement_repo::*;
pub use view_repo::*;
pub use election_repo::*;
pub use donation_repo::*;
pub use vendor_repo::*;
pub use notification_repo::*;
pub use validation_repo::*;
pub use batch_job_repo::*;
