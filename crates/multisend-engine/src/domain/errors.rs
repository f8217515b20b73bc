//! # Domain Errors
//!
//! Error types for batch validation, settlement and lifecycle tracking.
//!
//! Every failed execution attempt reports exactly one `BatchError`.

use super::value_objects::{Address, DecimalAmount, LifecycleState, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// BATCH ERRORS
// =============================================================================

/// Classified failure of one execution attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// No token descriptor was selected for the batch.
    #[error("no token selected")]
    NoTokenSelected,

    /// The batch has no recipients.
    #[error("no recipients")]
    NoRecipients,

    /// The batch exceeds the configured maximum size.
    #[error("too many recipients: {count} > {max}")]
    TooManyRecipients {
        /// Recipients in the batch.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// An entry is missing a valid address or a valid non-empty amount.
    #[error("invalid recipient #{index} ({address}): {reason}")]
    InvalidRecipient {
        /// Zero-based position in the batch.
        index: usize,
        /// Address as entered.
        address: String,
        /// What is wrong with the entry.
        reason: String,
    },

    /// Two or more entries share an address (case-insensitive).
    #[error("duplicate addresses found: {}", .0.join(", "))]
    DuplicateAddress(Vec<String>),

    /// The aggregate total is zero.
    #[error("total amount is zero")]
    ZeroTotalAmount,

    /// The supplied native value does not cover the aggregate.
    #[error("insufficient value: supplied {supplied}, required {required}")]
    InsufficientValue {
        /// Value supplied by the caller, as entered.
        supplied: String,
        /// Aggregate total of the batch.
        required: DecimalAmount,
    },

    /// The available token balance does not cover the aggregate.
    #[error("insufficient balance: available {available}, needed {needed} (short {shortfall})")]
    InsufficientBalance {
        /// Balance available to the actor.
        available: DecimalAmount,
        /// Aggregate total of the batch.
        needed: DecimalAmount,
        /// `needed - available`.
        shortfall: DecimalAmount,
    },

    /// Returning the excess native value failed; the whole attempt failed.
    #[error("refund of excess value failed")]
    RefundFailed,

    /// An attempt for this actor is already in flight.
    #[error("reentrant call: an attempt for {actor} is already in flight")]
    ReentrantCall {
        /// Actor whose attempt is in flight.
        actor: Address,
    },

    /// An amount has more fractional digits than the token supports.
    #[error("precision overflow: {amount} exceeds {decimals} decimals{}", entry_suffix(.index))]
    PrecisionOverflow {
        /// Offending entry, `None` for the supplied native value.
        index: Option<usize>,
        /// Amount as entered.
        amount: String,
        /// Token precision.
        decimals: u8,
    },

    /// The settlement boundary timed out.
    #[error("settlement timeout: {cause}")]
    SettlementTimeout {
        /// Underlying cause reported by the boundary.
        cause: String,
    },

    /// The settlement boundary reported a failure not otherwise classified.
    #[error("settlement rejected: {cause}")]
    SettlementRejected {
        /// Underlying cause reported by the boundary.
        cause: String,
    },
}

fn entry_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" (recipient #{i})")).unwrap_or_default()
}

impl BatchError {
    /// Returns the fieldless classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoTokenSelected => ErrorKind::NoTokenSelected,
            Self::NoRecipients => ErrorKind::NoRecipients,
            Self::TooManyRecipients { .. } => ErrorKind::TooManyRecipients,
            Self::InvalidRecipient { .. } => ErrorKind::InvalidRecipient,
            Self::DuplicateAddress(_) => ErrorKind::DuplicateAddress,
            Self::ZeroTotalAmount => ErrorKind::ZeroTotalAmount,
            Self::InsufficientValue { .. } => ErrorKind::InsufficientValue,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::RefundFailed => ErrorKind::RefundFailed,
            Self::ReentrantCall { .. } => ErrorKind::ReentrantCall,
            Self::PrecisionOverflow { .. } => ErrorKind::PrecisionOverflow,
            Self::SettlementTimeout { .. } => ErrorKind::SettlementTimeout,
            Self::SettlementRejected { .. } => ErrorKind::SettlementRejected,
        }
    }

    /// Returns true if the failure came from the settlement boundary.
    #[must_use]
    pub fn is_settlement_failure(&self) -> bool {
        matches!(
            self,
            Self::SettlementTimeout { .. } | Self::SettlementRejected { .. } | Self::RefundFailed
        )
    }

    /// Never true: a retry is a new, explicit attempt by the user.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Classifies a failure reported by the settlement boundary.
    ///
    /// `decimals` renders base-unit payloads back into display amounts.
    #[must_use]
    pub fn from_settlement(err: SettlementError, actor: Address, decimals: u8) -> Self {
        match err {
            SettlementError::Timeout(cause) => Self::SettlementTimeout { cause },
            SettlementError::RefundFailed => Self::RefundFailed,
            SettlementError::ReentrantCall => Self::ReentrantCall { actor },
            SettlementError::InsufficientBalance { balance, needed } => {
                let available = DecimalAmount::from_base_units(balance, decimals);
                let needed = DecimalAmount::from_base_units(needed, decimals);
                Self::InsufficientBalance {
                    available,
                    needed,
                    shortfall: needed.checked_sub(&available).unwrap_or_default(),
                }
            }
            other => Self::SettlementRejected {
                cause: other.to_string(),
            },
        }
    }
}

/// Fieldless error classification, as shown to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`BatchError::NoTokenSelected`].
    NoTokenSelected,
    /// See [`BatchError::NoRecipients`].
    NoRecipients,
    /// See [`BatchError::TooManyRecipients`].
    TooManyRecipients,
    /// See [`BatchError::InvalidRecipient`].
    InvalidRecipient,
    /// See [`BatchError::DuplicateAddress`].
    DuplicateAddress,
    /// See [`BatchError::ZeroTotalAmount`].
    ZeroTotalAmount,
    /// See [`BatchError::InsufficientValue`].
    InsufficientValue,
    /// See [`BatchError::InsufficientBalance`].
    InsufficientBalance,
    /// See [`BatchError::RefundFailed`].
    RefundFailed,
    /// See [`BatchError::ReentrantCall`].
    ReentrantCall,
    /// See [`BatchError::PrecisionOverflow`].
    PrecisionOverflow,
    /// See [`BatchError::SettlementTimeout`].
    SettlementTimeout,
    /// See [`BatchError::SettlementRejected`].
    SettlementRejected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// =============================================================================
// SETTLEMENT ERRORS
// =============================================================================

/// Failures reported by the settlement boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The boundary gave up waiting for settlement.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Refunding excess native value failed.
    #[error("refund failed")]
    RefundFailed,

    /// The actor's balance is below the batch total.
    #[error("insufficient balance: balance {balance}, needed {needed}")]
    InsufficientBalance {
        /// Balance in base units.
        balance: U256,
        /// Batch total in base units.
        needed: U256,
    },

    /// Attached native value below the batch total.
    #[error("insufficient value")]
    InsufficientValue,

    /// Declared total does not match the sum of amounts.
    #[error("total amount mismatch")]
    TotalAmountMismatch,

    /// Recipient and amount lists differ in length.
    #[error("length mismatch")]
    LengthMismatch,

    /// A token transfer call failed.
    #[error("token operation failed for {0}")]
    TokenTransferFailed(Address),

    /// The boundary detected a reentrant call.
    #[error("reentrant call")]
    ReentrantCall,

    /// The boundary refused the batch for another reason.
    #[error("{0}")]
    Rejected(String),
}

// =============================================================================
// AMOUNT ERRORS
// =============================================================================

/// Errors parsing or converting a decimal amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Empty or whitespace-only input.
    #[error("amount is empty")]
    Empty,

    /// Not a plain unsigned decimal.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// Value does not fit the 256-bit representation.
    #[error("amount overflow")]
    Overflow,

    /// More fractional digits than the token's precision.
    #[error("precision overflow: {scale} fractional digits > {decimals} decimals")]
    PrecisionOverflow {
        /// Fractional digits of the amount.
        scale: u32,
        /// Token precision.
        decimals: u32,
    },
}

// =============================================================================
// LIFECYCLE ERRORS
// =============================================================================

/// Illegal lifecycle transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The requested transition is not part of the lifecycle graph.
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: LifecycleState,
        /// Attempted state.
        to: LifecycleState,
    },
}

// =============================================================================
// IMPORT ERRORS
// =============================================================================

/// Errors importing a recipient list.
#[derive(Debug, Error)]
pub enum ImportError {
    /// CSV could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON document is not an array.
    #[error("JSON must be an array")]
    NotAnArray,
}
