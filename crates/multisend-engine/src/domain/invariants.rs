//! # Domain Invariants
//!
//! Rules that must hold for a prepared batch before it is dispatched to the
//! settlement boundary. A violation aborts the attempt with no effect.

use super::value_objects::{Address, U256};
use std::collections::HashSet;

/// Value conservation: the declared total equals the sum of all amounts,
/// so nothing is left stranded and nothing is over-committed.
#[must_use]
pub fn invariant_value_conserved(amounts: &[U256], total: U256) -> bool {
    amounts
        .iter()
        .try_fold(U256::zero(), |acc, amount| acc.checked_add(*amount))
        .is_some_and(|sum| sum == total)
}

/// No recipient is paid twice.
#[must_use]
pub fn invariant_unique_recipients(recipients: &[Address]) -> bool {
    let mut seen = HashSet::with_capacity(recipients.len());
    recipients.iter().all(|addr| seen.insert(addr))
}

/// Batch is non-empty and within the configured bound.
#[must_use]
pub fn invariant_batch_bounded(len: usize, max: usize) -> bool {
    len > 0 && len <= max
}

/// Every recipient has exactly one amount.
#[must_use]
pub fn invariant_lengths_match(recipients: &[Address], amounts: &[U256]) -> bool {
    recipients.len() == amounts.len()
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(
    recipients: &[Address],
    amounts: &[U256],
    total: U256,
    max_recipients: usize,
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !invariant_lengths_match(recipients, amounts) {
        violations.push(InvariantViolation::LengthMismatch {
            recipients: recipients.len(),
            amounts: amounts.len(),
        });
    }

    if !invariant_batch_bounded(recipients.len(), max_recipients) {
        violations.push(InvariantViolation::Unbounded {
            len: recipients.len(),
            max: max_recipients,
        });
    }

    if !invariant_unique_recipients(recipients) {
        violations.push(InvariantViolation::DuplicateRecipient);
    }

    if !invariant_value_conserved(amounts, total) {
        violations.push(InvariantViolation::ValueNotConserved);
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Recipient and amount lists differ in length.
    LengthMismatch {
        /// Recipient count.
        recipients: usize,
        /// Amount count.
        amounts: usize,
    },
    /// Batch empty or above the bound.
    Unbounded {
        /// Batch size.
        len: usize,
        /// Configured bound.
        max: usize,
    },
    /// Same recipient appears twice.
    DuplicateRecipient,
    /// Declared total differs from the sum of amounts.
    ValueNotConserved,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch {
                recipients,
                amounts,
            } => write!(f, "length mismatch: {recipients} recipients, {amounts} amounts"),
            Self::Unbounded { len, max } => write!(f, "batch size {len} outside 1..={max}"),
            Self::DuplicateRecipient => write!(f, "duplicate recipient"),
            Self::ValueNotConserved => write!(f, "total does not equal sum of amounts"),
        }
    }
}
