use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{deliver_notification, load_candidate, load_visible_candidate, owner_notification, page};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::{CheckoutDto, CheckoutResponseDto, ConfirmDonationDto, FeeQuoteDto, PageQueryDto};
use crate::errors::ApiError;
use crate::integrations::email::send_best_effort;
use crate::integrations::payments::{CheckoutRequest, SessionOutcome};
use crate::integrations::Integrations;
use crate::models::{Candidate, Donation, DonationSummary, DonorInfo, NewDonation, NotificationKind};
use crate::repo;
use crate::services::email_templates::{self, format_cents, ReceiptDetails};
use crate::services::fees::{self, FeeBreakdown};
use crate::services::validation::{is_valid_email, normalize_state, require};
use crate::state::Settings;

/// Trims and checks the donor details required for a contribution record
fn validate_donor(donor: DonorInfo) -> Result<DonorInfo, ApiError> {
    let field = |value: &str, name: &str| require(Some(value), name).map_err(ApiError::BadRequest);

    let email = field(&donor.email, "email")?;
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest(format!("Invalid email address: {}", email)));
    }
    let state = field(&donor.state, "state")?;
    let state = normalize_state(&state).ok_or_else(|| ApiError::BadRequest(format!("Invalid state code: {}", state)))?;

    Ok(DonorInfo {
        name: field(&donor.name, "name")?,
        email,
        address: field(&donor.address, "address")?,
        city: field(&donor.city, "city")?,
        state,
        zip: field(&donor.zip, "zip")?,
        occupation: field(&donor.occupation, "occupation")?,
        employer: field(&donor.employer, "employer")?,
    })
}

/// Handler for quoting the fees of a donation
///
/// This function handles POST requests to `/donations/fee-quote`.
///
/// ### Returns
///
/// The amount, fee, total charged and what the candidate nets
pub async fn fee_quote_handler(
    // Extract and deserialize the JSON request body
    Json(payload): Json<FeeQuoteDto>,
) -> Result<Json<FeeBreakdown>, ApiError> {
    let breakdown = fees::quote(payload.amount_cents, payload.cover_fee).map_err(ApiError::BadRequest)?;
    Ok(Json(breakdown))
}

/// Handler for starting a donation checkout
///
/// This function handles POST requests to `/donations/checkout`. A PENDING
/// donation is stored, then a checkout session is opened with the payments
/// provider. If the provider refuses, the donation is removed again.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `integrations` - The payments client
/// * `settings` - Public site settings for the redirect URLs
/// * `identity` - The caller, if signed in
/// * `payload` - Candidate, amount, fee coverage and donor details
///
/// ### Returns
///
/// 201 with the pending donation and the URL to send the donor to
///
/// ### Errors
///
/// - 400 for an amount out of range or incomplete donor details
/// - 404 when the candidate doesn't exist or is hidden
/// - 503 when payments aren't configured
#[instrument(skip(pool, integrations, settings, identity, payload), fields(candidate_id = payload.candidate_id))]
pub async fn checkout_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    State(settings): State<Arc<Settings>>,
    identity: MaybeIdentity,
    Json(payload): Json<CheckoutDto>,
) -> Result<(StatusCode, Json<CheckoutResponseDto>), ApiError> {
    let breakdown = fees::quote(payload.amount_cents, payload.cover_fee).map_err(ApiError::BadRequest)?;
    let donor = validate_donor(payload.donor)?;
    let candidate = load_visible_candidate(&pool, &payload.candidate_id.to_string(), &identity)?;
    let payments = integrations.payments()?;

    let donation = repo::create_pending_donation(&pool, NewDonation::pending(candidate.id, donor, &breakdown))
        .map_err(ApiError::Database)?;

    let request = CheckoutRequest {
        donation_id: donation.id,
        candidate_name: candidate.name.clone(),
        total_cents: donation.total_cents,
        donor_email: donation.donor_email.clone(),
        success_url: settings.url(&format!(
            "/candidates/{}/donate/success?session_id={{CHECKOUT_SESSION_ID}}",
            candidate.slug
        )),
        cancel_url: settings.url(&format!("/candidates/{}/donate", candidate.slug)),
    };

    let session = match payments.create_checkout_session(&request).await {
        Ok(session) => session,
        Err(err) => {
            if let Err(cleanup) = repo::delete_donation(&pool, donation.id) {
                error!("Failed to remove donation {} after checkout error: {:#}", donation.id, cleanup);
            }
            return Err(err.into());
        }
    };

    let checkout_url = session
        .url
        .clone()
        .ok_or_else(|| ApiError::Upstream("Checkout session has no URL".to_string()))?;
    let donation = repo::set_payment_session(&pool, donation.id, &session.id).map_err(ApiError::Database)?;

    info!(
        "Opened checkout {} for donation {} of {}",
        session.id,
        donation.id,
        format_cents(donation.total_cents)
    );
    Ok((StatusCode::CREATED, Json(CheckoutResponseDto { donation, checkout_url })))
}

/// Sends the receipt and tells the candidate about a completed donation
async fn announce_donation(pool: &DbPool, integrations: &Integrations, settings: &Settings, donation: &Donation) {
    let candidate: Option<Candidate> = match repo::get_candidate(pool, donation.candidate_id) {
        Ok(candidate) => candidate,
        Err(err) => {
            warn!("Could not load candidate {} for donation {}: {:#}", donation.candidate_id, donation.id, err);
            None
        }
    };
    let candidate_name = candidate.as_ref().map_or("the campaign", |c| c.name.as_str());

    let receipt = email_templates::donation_receipt(&ReceiptDetails {
        donation_id: donation.id,
        donor_name: &donation.donor_name,
        candidate_name,
        amount_cents: donation.amount_cents,
        fee_cents: donation.fee_cents,
        total_cents: donation.total_cents,
        cover_fee: donation.cover_fee,
        paid_at: donation.paid_at.unwrap_or(donation.created_at),
    });
    send_best_effort(integrations.email.as_ref(), &donation.donor_email, &receipt).await;

    let Some(candidate) = candidate else {
        return;
    };
    if let Some(notification) = owner_notification(
        &candidate,
        NotificationKind::Donation,
        "New donation".to_string(),
        format!("{} donated {}", donation.donor_name, format_cents(donation.amount_cents)),
        Some(settings.url("/dashboard/donations")),
    ) {
        deliver_notification(pool, integrations.email.as_ref(), notification, None).await;
    }
}

/// Handler for confirming a donation after checkout
///
/// This function handles POST requests to `/donations/confirm`. The session
/// is looked up with the payments provider: a paid session completes the
/// donation, sends the receipt and notifies the candidate; an expired one
/// fails it. Donations that are already settled are returned as they are.
///
/// ### Returns
///
/// The donation in its current state
#[instrument(skip(pool, integrations, settings, payload), fields(session_id = %payload.session_id))]
pub async fn confirm_donation_handler(
    State(pool): State<Arc<DbPool>>,
    State(integrations): State<Arc<Integrations>>,
    State(settings): State<Arc<Settings>>,
    Json(payload): Json<ConfirmDonationDto>,
) -> Result<Json<Donation>, ApiError> {
    let session_id = require(Some(&payload.session_id), "session_id").map_err(ApiError::BadRequest)?;
    let donation = repo::get_donation_by_session(&pool, &session_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Donation".to_string()))?;

    if donation.status.is_terminal() {
        return Ok(Json(donation));
    }

    let session = integrations.payments()?.retrieve_session(&session_id).await?;
    let settled = match session.outcome() {
        SessionOutcome::Paid => {
            let completed = repo::mark_donation_completed(&pool, donation.id).map_err(ApiError::Database)?;
            if let Some(completed) = &completed {
                info!("Donation {} completed", completed.id);
                announce_donation(&pool, &integrations, &settings, completed).await;
            }
            completed
        }
        SessionOutcome::Expired => {
            let failed = repo::mark_donation_failed(&pool, donation.id).map_err(ApiError::Database)?;
            if failed.is_some() {
                info!("Donation {} failed: checkout expired", donation.id);
            }
            failed
        }
        SessionOutcome::Open => return Ok(Json(donation)),
    };

    // None: another confirmation settled it first
    let current = match settled {
        Some(donation) => donation,
        None => repo::get_donation(&pool, donation.id)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Donation".to_string()))?,
    };
    Ok(Json(current))
}

/// Handler for listing a candidate's donations
///
/// This function handles GET requests to `/candidates/{id}/donations`.
/// Owner or staff only; newest first.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn list_candidate_donations_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the candidate ID from the URL path
    Path(candidate_id): Path<String>,
    Query(query): Query<PageQueryDto>,
) -> Result<Json<Vec<Donation>>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;
    let (limit, offset) = page(query.limit, query.offset)?;

    let donations = repo::list_donations_for_candidate(&pool, candidate.id, limit, offset).map_err(ApiError::Database)?;
    Ok(Json(donations))
}

/// Handler for a candidate's donation totals
///
/// This function handles GET requests to `/candidates/{id}/donations/summary`.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn donation_summary_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
) -> Result<Json<DonationSummary>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;

    let summary = repo::donation_summary(&pool, candidate.id).map_err(ApiError::Database)?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor() -> DonorInfo {
        DonorInfo {
            name: " Pat Voter ".to_string(),
            email: "pat@example.com".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "tx".to_string(),
            zip: "78701".to_string(),
            occupation: "Teacher".to_string(),
            employer: "AISD".to_string(),
        }
    }

    #[test]
    fn test_validate_donor_normalizes() {
        let donor = validate_donor(donor()).unwrap();
        assert_eq!(donor.name, "Pat Voter");
        assert_eq!(donor.state, "TX");
    }

    #[test]
    fn test_validate_donor_rejects_missing_fields() {
        let mut missing_employer = donor();
        missing_employer.employer = "  ".to_string();
        match validate_donor(missing_employer) {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "employer is required"),
            other => panic!("expected BadRequest, got {:?}", other),
        }

        let mut bad_email = donor();
        bad_email.email = "pat@".to_string();
        assert!(matches!(validate_donor(bad_email), Err(ApiError::BadRequest(_))));

        let mut bad_state = donor();
        bad_state.state = "Texas".to_string();
        assert!(matches!(validate_donor(bad_state), Err(ApiError::BadRequest(_))));
    }
}
