use std::collections::HashSet;

use crate::db::DbPool;
use crate::models::{Donation, DonationStatus, DonationSummary, NewDonation};
use crate::schema::donations;
use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Stores a donation in the PENDING state, before checkout starts
#[instrument(skip(pool, new_donation), fields(candidate_id = new_donation.candidate_id))]
pub fn create_pending_donation(pool: &DbPool, new_donation: NewDonation) -> Result<Donation> {
    let conn = &mut pool.get()?;
    let donation = diesel::insert_into(donations::table)
        .values(&new_donation)
        .returning(Donation::as_returning())
        .get_result(conn)?;
    info!("Created pending donation {} for {} cents", donation.id, donation.total_cents);
    Ok(donation)
}

/// Attaches the payment session id created for a donation
#[instrument(skip(pool))]
pub fn set_payment_session(pool: &DbPool, donation_id: i32, session_id: &str) -> Result<Donation> {
    let conn = &mut pool.get()?;
    let donation = diesel::update(donations::table.find(donation_id))
        .set(donations::payment_session_id.eq(session_id))
        .returning(Donation::as_returning())
        .get_result(conn)?;
    Ok(donation)
}

/// Removes a donation whose checkout could not be started
#[instrument(skip(pool))]
pub fn delete_donation(pool: &DbPool, donation_id: i32) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(donations::table.find(donation_id)).execute(conn)?;
    info!("Deleted {} donation(s) with id {}", deleted, donation_id);
    Ok(deleted)
}

#[instrument(skip(pool))]
pub fn get_donation(pool: &DbPool, donation_id: i32) -> Result<Option<Donation>> {
    let conn = &mut pool.get()?;
    let donation = donations::table
        .find(donation_id)
        .select(Donation::as_select())
        .first(conn)
        .optional()?;
    Ok(donation)
}

#[instrument(skip(pool))]
pub fn get_donation_by_session(pool: &DbPool, session_id: &str) -> Result<Option<Donation>> {
    let conn = &mut pool.get()?;
    let donation = donations::table
        .filter(donations::payment_session_id.eq(session_id))
        .select(Donation::as_select())
        .first(conn)
        .optional()?;
    Ok(donation)
}

/// Moves a PENDING donation to `status`
///
/// Returns `None` when the donation was no longer pending, so a second
/// confirmation of the same payment changes nothing.
fn settle(pool: &DbPool, donation_id: i32, status: DonationStatus, paid_at: Option<NaiveDateTime>) -> Result<Option<Donation>> {
    let conn = &mut pool.get()?;
    let donation = diesel::update(
        donations::table
            .find(donation_id)
            .filter(donations::status.eq(DonationStatus::Pending)),
    )
    .set((donations::status.eq(status), donations::paid_at.eq(paid_at)))
    .returning(Donation::as_returning())
    .get_result(conn)
    .optional()?;

    if let Some(donation) = &donation {
        info!("Donation {} is now {}", donation.id, donation.status);
    }
    Ok(donation)
}

/// Marks a pending donation as paid
///
/// ### Returns
///
/// The completed donation, or `None` if it had already settled
#[instrument(skip(pool))]
pub fn mark_donation_completed(pool: &DbPool, donation_id: i32) -> Result<Option<Donation>> {
    settle(pool, donation_id, DonationStatus::Completed, Some(Utc::now().naive_utc()))
}

/// Marks a pending donation as failed
#[instrument(skip(pool))]
pub fn mark_donation_failed(pool: &DbPool, donation_id: i32) -> Result<Option<Donation>> {
    settle(pool, donation_id, DonationStatus::Failed, None)
}

/// Lists a candidate's donations, newest first
#[instrument(skip(pool))]
pub fn list_donations_for_candidate(pool: &DbPool, candidate_id: i32, limit: i64, offset: i64) -> Result<Vec<Donation>> {
    let conn = &mut pool.get()?;
    let results = donations::table
        .filter(donations::candidate_id.eq(candidate_id))
        .order((donations::created_at.desc(), donations::id.desc()))
        .limit(limit)
        .offset(offset)
        .select(Donation::as_select())
        .load(conn)?;
    debug!("Found {} donations for candidate {}", results.len(), candidate_id);
    Ok(results)
}

/// Totals a candidate's donations
///
/// Unique donors are counted by case-insensitive email over completed
/// donations only.
#[instrument(skip(pool))]
pub fn donation_summary(pool: &DbPool, candidate_id: i32) -> Result<DonationSummary> {
    let conn = &mut pool.get()?;
    let rows: Vec<(DonationStatus, i64, i64, i64, String)> = donations::table
        .filter(donations::candidate_id.eq(candidate_id))
        .select((
            donations::status,
            donations::amount_cents,
            donations::fee_cents,
            donations::total_cents,
            donations::donor_email,
        ))
        .load(conn)?;

    let mut summary = DonationSummary::default();
    let mut donors = HashSet::new();
    for (status, amount_cents, fee_cents, total_cents, email) in rows {
        match status {
            DonationStatus::Completed => {
                summary.completed_count += 1;
                summary.completed_amount_cents += amount_cents;
                summary.net_amount_cents += total_cents - fee_cents;
                donors.insert(email.trim().to_lowercase());
            }
            DonationStatus::Pending => summary.pending_count += 1,
            DonationStatus::Failed => {}
        }
    }
    summary.unique_donors = donors.len() as i64;
    Ok(summary)
}

/// Fails every PENDING donation created before `cutoff`
///
/// ### Returns
///
/// The number of donations expired
#[instrument(skip(pool))]
pub fn expire_pending_donations(pool: &DbPool, cutoff: NaiveDateTime) -> Result<usize> {
    let conn = &mut pool.get()?;
    let expired = diesel::update(
        donations::table
            .filter(donations::status.eq(DonationStatus::Pending))
            .filter(donations::created_at.lt(cutoff)),
    )
    .set(donations::status.eq(DonationStatus::Failed))
    .execute(conn)?;
    info!("Expired {} pending donation(s) created before {}", expired, cutoff);
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DonorInfo;
    use crate::services::fees;
    use crate::test_utils::{insert_candidate, setup_test_db};
    use chrono::Duration;

    fn donor(email: &str) -> DonorInfo {
        DonorInfo {
            name: "Pat Voter".to_string(),
            email: email.to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip: "78701".to_string(),
            occupation: "Teacher".to_string(),
            employer: "AISD".to_string(),
        }
    }

    fn pending(pool: &DbPool, candidate_id: i32, email: &str, amount_cents: i64) -> Donation {
        let breakdown = fees::quote(amount_cents, false).unwrap();
        create_pending_donation(pool, NewDonation::pending(candidate_id, donor(email), &breakdown)).unwrap()
    }

    #[test]
    fn test_pending_donation_and_session_lookup() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let donation = pending(&pool, candidate.id, "pat@example.com", 5_000);
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(donation.amount_cents, 5_000);

        set_payment_session(&pool, donation.id, "cs_test_1").unwrap();
        let found = get_donation_by_session(&pool, "cs_test_1").unwrap().unwrap();
        assert_eq!(found.id, donation.id);
        assert!(get_donation_by_session(&pool, "cs_missing").unwrap().is_none());
    }

    #[test]
    fn test_settling_only_applies_to_pending() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let donation = pending(&pool, candidate.id, "pat@example.com", 5_000);

        let completed = mark_donation_completed(&pool, donation.id).unwrap().unwrap();
        assert_eq!(completed.status, DonationStatus::Completed);
        assert!(completed.paid_at.is_some());

        assert!(mark_donation_completed(&pool, donation.id).unwrap().is_none());
        assert!(mark_donation_failed(&pool, donation.id).unwrap().is_none());
        assert_eq!(get_donation(&pool, donation.id).unwrap().unwrap().status, DonationStatus::Completed);
    }

    #[test]
    fn test_donation_summary() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let first = pending(&pool, candidate.id, "pat@example.com", 5_000);
        let second = pending(&pool, candidate.id, "PAT@example.com", 2_000);
        let failed = pending(&pool, candidate.id, "sam@example.com", 1_000);
        pending(&pool, candidate.id, "lee@example.com", 1_000);

        mark_donation_completed(&pool, first.id).unwrap();
        mark_donation_completed(&pool, second.id).unwrap();
        mark_donation_failed(&pool, failed.id).unwrap();

        let summary = donation_summary(&pool, candidate.id).unwrap();
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.completed_amount_cents, 7_000);
        let expected_net = (5_000 - fees::processing_fee(5_000)) + (2_000 - fees::processing_fee(2_000));
        assert_eq!(summary.net_amount_cents, expected_net);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.unique_donors, 1);

        assert_eq!(list_donations_for_candidate(&pool, candidate.id, 50, 0).unwrap().len(), 4);
    }

    #[test]
    fn test_expire_pending_donations() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let stale = pending(&pool, candidate.id, "pat@example.com", 5_000);
        {
            let conn = &mut pool.get().unwrap();
            diesel::update(donations::table.find(stale.id))
                .set(donations::created_at.eq(Utc::now().naive_utc() - Duration::hours(48)))
                .execute(conn)
                .unwrap();
        }
        let fresh = pending(&pool, candidate.id, "sam@example.com", 5_000);

        let cutoff = Utc::now().naive_utc() - Duration::hours(24);
        assert_eq!(expire_pending_donations(&pool, cutoff).unwrap(), 1);
        assert_eq!(get_donation(&pool, stale.id).unwrap().unwrap().status, DonationStatus::Failed);
        assert_eq!(get_donation(&pool, fresh.id).unwrap().unwrap().status, DonationStatus::Pending);
    }

    #[test]
    fn test_delete_donation() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let donation = pending(&pool, candidate.id, "pat@example.com", 5_000);
        assert_eq!(delete_donation(&pool, donation.id).unwrap(), 1);
        assert!(get_donation(&pool, donation.id).unwrap().is_none());
    }
}
