// Exact decimal helpers for monetary amounts and odds.
//
// Balances, stakes, payouts and odds are base-10 `Decimal` values end to
// end; binary floats would drift on stake * odds and balance accumulation.
// Money carries two fractional digits, matching the original storage
// columns, and comparisons are exact decimal comparisons.

use rust_decimal::Decimal;

use crate::error::ApiError;

pub const MONEY_SCALE: u32 = 2;

/// Round a monetary value to its storage scale.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_SCALE)
}

/// stake * odds, computed once at placement and frozen on the bet.
pub fn potential_payout(stake: Decimal, odds: Decimal) -> Decimal {
    round_money(stake * odds)
}

/// Stakes and balances must be strictly positive / non-negative.
pub fn ensure_positive_amount(amount: Decimal) -> Result<Decimal, ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation("amount must be greater than 0".into()));
    }
    Ok(round_money(amount))
}

pub fn ensure_non_negative(label: &str, value: Decimal) -> Result<Decimal, ApiError> {
    if value < Decimal::ZERO {
        return Err(ApiError::Validation(format!("{label} must not be negative")));
    }
    Ok(round_money(value))
}

/// Odds are quoted in decimal (European) format and must exceed 1.00.
pub fn ensure_valid_odds(odds: Decimal) -> Result<Decimal, ApiError> {
    if odds <= Decimal::ONE {
        return Err(ApiError::Validation("odds must be greater than 1.00".into()));
    }
    Ok(odds.round_dp(MONEY_SCALE))
}
