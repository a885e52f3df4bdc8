use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    /// Payment state of a donation
    DonationStatus {
        /// Checkout session created, payment not yet confirmed
        Pending => "PENDING",
        Completed => "COMPLETED",
        /// Session expired or was abandoned
        Failed => "FAILED",
    }
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

/// A voter contribution to a candidate
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::donations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Donation {
    pub id: i32,
    pub candidate_id: i32,
    pub donor_name: String,
    pub donor_email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub occupation: String,
    pub employer: String,
    /// Amount the donor intended to give
    pub amount_cents: i64,
    /// Processing fee on the charged total
    pub fee_cents: i64,
    /// Amount actually charged to the donor
    pub total_cents: i64,
    /// Whether the donor chose to cover the processing fee
    pub cover_fee: bool,
    pub status: DonationStatus,
    pub payment_session_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
}

impl Donation {
    /// What the candidate receives after processing fees
    pub fn net_cents(&self) -> i64 {
        self.total_cents - self.fee_cents
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::donations)]
pub struct NewDonation {
    pub candidate_id: i32,
    pub donor_name: String,
    pub donor_email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub occupation: String,
    pub employer: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub total_cents: i64,
    pub cover_fee: bool,
    pub status: DonationStatus,
    pub created_at: NaiveDateTime,
}

/// Donor details collected at checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonorInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub occupation: String,
    pub employer: String,
}

impl NewDonation {
    pub fn pending(candidate_id: i32, donor: DonorInfo, breakdown: &crate::services::fees::FeeBreakdown) -> Self {
        Self {
            candidate_id,
            donor_name: donor.name,
            donor_email: donor.email,
            address: donor.address,
            city: donor.city,
            state: donor.state,
            zip: donor.zip,
            occupation: donor.occupation,
            employer: donor.employer,
            amount_cents: breakdown.amount_cents,
            fee_cents: breakdown.fee_cents,
            total_cents: breakdown.total_cents,
            cover_fee: breakdown.cover_fee,
            status: DonationStatus::Pending,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Totals for a candidate's completed donations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSummary {
    pub completed_count: i64,
    pub completed_amount_cents: i64,
    pub net_amount_cents: i64,
    pub pending_count: i64,
    pub unique_donors: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!DonationStatus::Pending.is_terminal());
        assert!(DonationStatus::Completed.is_terminal());
        assert!(DonationStatus::Failed.is_terminal());
    }
}
