//! # Aggregator
//!
//! Exact decimal totals and valid-recipient counts.

use super::validator::{self, AmountState};
use crate::domain::{BatchSummary, DecimalAmount, Recipient, U256};

/// Exact sum of every independently valid amount.
///
/// Empty and invalid amounts are skipped. Returns `None` only if the sum
/// does not fit the 256-bit representation.
#[must_use]
pub fn total_amount(recipients: &[Recipient]) -> Option<DecimalAmount> {
    recipients
        .iter()
        .filter_map(|r| match validator::classify_amount(r.amount()) {
            AmountState::Valid(value) => Some(value),
            AmountState::Unspecified | AmountState::Invalid => None,
        })
        .try_fold(DecimalAmount::ZERO, |acc, value| acc.checked_add(&value))
}

/// Recipients with a valid address AND a valid non-empty amount.
#[must_use]
pub fn count_valid_recipients(recipients: &[Recipient]) -> usize {
    recipients.iter().filter(|r| r.is_executable()).count()
}

/// Checked sum of base-unit amounts.
#[must_use]
pub fn sum_base_units(amounts: &[U256]) -> Option<U256> {
    amounts
        .iter()
        .try_fold(U256::zero(), |acc, amount| acc.checked_add(*amount))
}

/// Totals and counts for a summary panel.
#[must_use]
pub fn summarize(recipients: &[Recipient]) -> BatchSummary {
    let valid_count = count_valid_recipients(recipients);
    BatchSummary {
        total: total_amount(recipients),
        valid_count,
        invalid_count: recipients.len() - valid_count,
        duplicates: validator::find_duplicate_addresses(recipients),
        entries: recipients.len(),
    }
}
