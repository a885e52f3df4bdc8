use crate::db::DbPool;
use crate::models::{Candidate, NewValidationRequest, UserValidationRequest, ValidationStatus};
use crate::schema::{candidates, user_validation_requests};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

#[instrument(skip(pool, new_request), fields(candidate_id = new_request.candidate_id))]
pub fn create_validation_request(pool: &DbPool, new_request: NewValidationRequest) -> Result<UserValidationRequest> {
    let conn = &mut pool.get()?;
    let request = diesel::insert_into(user_validation_requests::table)
        .values(&new_request)
        .returning(UserValidationRequest::as_returning())
        .get_result(conn)?;
    info!("Created validation request {}", request.id);
    Ok(request)
}

/// Lists validation requests, oldest first, optionally by status
#[instrument(skip(pool))]
pub fn list_validation_requests(pool: &DbPool, status: Option<ValidationStatus>) -> Result<Vec<UserValidationRequest>> {
    let conn = &mut pool.get()?;

    let mut query = user_validation_requests::table.into_boxed();
    if let Some(status) = status {
        query = query.filter(user_validation_requests::status.eq(status));
    }

    let results = query
        .order(user_validation_requests::id.asc())
        .select(UserValidationRequest::as_select())
        .load(conn)?;
    debug!("Found {} validation requests", results.len());
    Ok(results)
}

/// Whether the user already has an undecided claim on the candidate
#[instrument(skip(pool))]
pub fn has_pending_request(pool: &DbPool, candidate_id: i32, clerk_user_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;
    let count: i64 = user_validation_requests::table
        .filter(user_validation_requests::candidate_id.eq(candidate_id))
        .filter(user_validation_requests::clerk_user_id.eq(clerk_user_id))
        .filter(user_validation_requests::status.eq(ValidationStatus::Pending))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Result of approving a claim
#[derive(Debug)]
pub enum Approval {
    /// The request was approved and the candidate now belongs to the requester
    Approved(UserValidationRequest, Candidate),
    /// The request had already been approved or denied
    AlreadyDecided,
    /// The candidate gained an owner after the claim was filed; nothing changed
    AlreadyClaimed,
}

/// Approves a pending claim and hands the profile to the requester
///
/// In one transaction: the request becomes APPROVED, the candidate gets the
/// requester as owner and is marked verified, and every other pending claim
/// on the same candidate is denied. The owner is only set on a candidate that
/// is still unclaimed.
///
/// ### Errors
///
/// Returns an error if:
/// - The request does not exist (not found)
/// - The requester already owns another profile (unique violation)
#[instrument(skip(pool))]
pub fn approve_validation_request(pool: &DbPool, request_id: i32) -> Result<Approval> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let request: UserValidationRequest = user_validation_requests::table
            .find(request_id)
            .select(UserValidationRequest::as_select())
            .first(conn)?;
        if request.status != ValidationStatus::Pending {
            return Ok(Approval::AlreadyDecided);
        }

        let now = Utc::now().naive_utc();
        let candidate = diesel::update(
            candidates::table
                .find(request.candidate_id)
                .filter(candidates::clerk_user_id.is_null()),
        )
        .set((
            candidates::clerk_user_id.eq(&request.clerk_user_id),
            candidates::verified.eq(true),
            candidates::updated_at.eq(now),
        ))
        .returning(Candidate::as_returning())
        .get_result(conn)
        .optional()?;
        let Some(candidate) = candidate else {
            info!("Candidate {} was claimed before request {} was approved", request.candidate_id, request_id);
            return Ok(Approval::AlreadyClaimed);
        };

        let approved = diesel::update(user_validation_requests::table.find(request_id))
            .set((
                user_validation_requests::status.eq(ValidationStatus::Approved),
                user_validation_requests::decided_at.eq(Some(now)),
            ))
            .returning(UserValidationRequest::as_returning())
            .get_result(conn)?;

        let denied = diesel::update(
            user_validation_requests::table
                .filter(user_validation_requests::candidate_id.eq(request.candidate_id))
                .filter(user_validation_requests::status.eq(ValidationStatus::Pending)),
        )
        .set((
            user_validation_requests::status.eq(ValidationStatus::Denied),
            user_validation_requests::decided_at.eq(Some(now)),
        ))
        .execute(conn)?;

        info!(
            "Approved validation request {}; candidate {} now owned by {} ({} competing request(s) denied)",
            request_id, candidate.id, request.clerk_user_id, denied
        );
        Ok(Approval::Approved(approved, candidate))
    })
}

/// Denies a pending claim
///
/// ### Returns
///
/// The denied request, or `None` when it was already decided
#[instrument(skip(pool))]
pub fn deny_validation_request(pool: &DbPool, request_id: i32) -> Result<Option<UserValidationRequest>> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let request: UserValidationRequest = user_validation_requests::table
            .find(request_id)
            .select(UserValidationRequest::as_select())
            .first(conn)?;
        if request.status != ValidationStatus::Pending {
            return Ok(None);
        }

        let denied = diesel::update(user_validation_requests::table.find(request_id))
            .set((
                user_validation_requests::status.eq(ValidationStatus::Denied),
                user_validation_requests::decided_at.eq(Some(Utc::now().naive_utc())),
            ))
            .returning(UserValidationRequest::as_returning())
            .get_result(conn)?;
        info!("Denied validation request {}", request_id);
        Ok(Some(denied))
    })
}
