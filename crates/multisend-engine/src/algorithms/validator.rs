//! # Validator
//!
//! Address and amount predicates plus duplicate detection.
//!
//! Recipient validity is two-tier: an entry with a valid address and an
//! empty amount is valid for editing but not yet executable.

use crate::domain::{
    DecimalAmount, ImportPreview, Recipient, RecipientCandidate, ADDRESS_HEX_LEN, ADDRESS_PREFIX,
};
use std::collections::HashMap;

/// State of an amount field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountState {
    /// Empty; to be filled in later.
    Unspecified,
    /// Strictly positive plain decimal.
    Valid(DecimalAmount),
    /// Anything else.
    Invalid,
}

/// `0x` followed by exactly 40 hexadecimal characters, any letter case.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    address.strip_prefix(ADDRESS_PREFIX).is_some_and(|hex| {
        hex.len() == ADDRESS_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

/// Classifies an amount field.
#[must_use]
pub fn classify_amount(amount: &str) -> AmountState {
    if amount.is_empty() {
        return AmountState::Unspecified;
    }
    match amount.parse::<DecimalAmount>() {
        Ok(value) if value.is_positive() => AmountState::Valid(value),
        _ => AmountState::Invalid,
    }
}

/// Strictly positive plain decimal after trimming.
#[must_use]
pub fn is_valid_amount(amount: &str) -> bool {
    matches!(classify_amount(amount), AmountState::Valid(_))
}

/// Address valid AND amount empty-or-valid.
#[must_use]
pub fn is_valid_recipient(address: &str, amount: &str) -> bool {
    is_valid_address(address) && !matches!(classify_amount(amount), AmountState::Invalid)
}

/// Lower-cased addresses occurring more than once, in order of first
/// occurrence.
#[must_use]
pub fn find_duplicate_addresses(recipients: &[Recipient]) -> Vec<String> {
    duplicates_in(recipients.iter().map(Recipient::address))
}

pub(crate) fn duplicates_in<'a>(addresses: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen = Vec::new();

    for address in addresses {
        let canonical = address.to_ascii_lowercase();
        let count = counts.entry(canonical.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push(canonical);
        }
        *count += 1;
    }

    first_seen
        .into_iter()
        .filter(|addr| counts.get(addr).is_some_and(|&count| count > 1))
        .collect()
}

/// Counts for a bulk paste preview.
pub fn preview_candidates<I>(candidates: I) -> ImportPreview
where
    I: IntoIterator<Item = RecipientCandidate>,
{
    candidates
        .into_iter()
        .fold(ImportPreview::default(), |mut preview, candidate| {
            preview.total += 1;
            if is_valid_recipient(&candidate.address, &candidate.amount) {
                preview.valid += 1;
            } else {
                preview.invalid += 1;
            }
            preview
        })
}
