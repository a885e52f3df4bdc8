use serde::{Deserialize, Serialize};

/// Percentage part of the processing fee, in basis points (2.9%)
pub const FEE_BASIS_POINTS: i64 = 290;

/// Fixed part of the processing fee, in cents
pub const FEE_FIXED_CENTS: i64 = 30;

/// Smallest accepted donation ($1.00)
pub const MIN_DONATION_CENTS: i64 = 100;

/// Largest accepted donation ($3,300.00)
pub const MAX_DONATION_CENTS: i64 = 330_000;

/// What a donor pays and what the candidate receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Amount the donor intends to give
    pub amount_cents: i64,
    /// Processing fee charged on the total
    pub fee_cents: i64,
    /// Amount charged to the donor
    pub total_cents: i64,
    /// Amount the candidate receives
    pub net_cents: i64,
    pub cover_fee: bool,
}

/// Processing fee for a charge of `charge_cents`, rounded half up
pub fn processing_fee(charge_cents: i64) -> i64 {
    (charge_cents * FEE_BASIS_POINTS + 5_000) / 10_000 + FEE_FIXED_CENTS
}

/// Smallest charge whose net after fees reaches `amount_cents`
fn gross_up(amount_cents: i64) -> i64 {
    // ceil((amount + fixed) / (1 - rate))
    let denominator = 10_000 - FEE_BASIS_POINTS;
    let total = ((amount_cents + FEE_FIXED_CENTS) * 10_000 + denominator - 1) / denominator;
    // Half-up fee rounding costs at most half a cent, which the ceiling covers
    debug_assert!(total - processing_fee(total) >= amount_cents);
    total
}

/// Computes the fee breakdown for a donation
///
/// ### Arguments
///
/// * `amount_cents` - The amount the donor wants to give
/// * `cover_fee` - Whether the donor pays the processing fee on top
///
/// ### Returns
///
/// The breakdown, or a message when the amount is outside the accepted range
pub fn quote(amount_cents: i64, cover_fee: bool) -> Result<FeeBreakdown, String> {
    if !(MIN_DONATION_CENTS..=MAX_DONATION_CENTS).contains(&amount_cents) {
        return Err(format!(
            "Donation amount must be between {} and {}",
            crate::services::email_templates::format_cents(MIN_DONATION_CENTS),
            crate::services::email_templates::format_cents(MAX_DONATION_CENTS),
        ));
    }

    let total_cents = if cover_fee { gross_up(amount_cents) } else { amount_cents };
    let fee_cents = processing_fee(total_cents);

    Ok(FeeBreakdown {
        amount_cents,
        fee_cents,
        total_cents,
        net_cents: total_cents - fee_cents,
        cover_fee,
    })
}
