//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the engine depends on. The settlement boundary is the only
//! component that moves value; the engine never touches keys or signatures.

use crate::domain::{Address, BatchCompleted, SettlementError, U256};
use async_trait::async_trait;

/// Reference returned by a successful settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Opaque reference usable in explorer links (e.g. transaction hash).
    pub reference: String,
}

impl SettlementReceipt {
    /// Creates a receipt.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// The external system that settles a whole batch atomically.
///
/// ## Contract
///
/// Each `settle_*` call either pays every recipient and returns a receipt, or
/// pays nobody and returns an error. Timeouts are the boundary's concern and
/// surface as `SettlementError::Timeout`.
#[async_trait]
pub trait SettlementBoundary: Send + Sync {
    /// Distribute the native asset.
    ///
    /// `value` may exceed the sum of `amounts`; the boundary refunds the
    /// difference or fails the whole batch with `RefundFailed`.
    async fn settle_native(
        &self,
        actor: Address,
        recipients: &[Address],
        amounts: &[U256],
        value: U256,
    ) -> Result<SettlementReceipt, SettlementError>;

    /// Distribute a token. `total` must equal the sum of `amounts`.
    async fn settle_token(
        &self,
        actor: Address,
        token: Address,
        recipients: &[Address],
        amounts: &[U256],
        total: U256,
    ) -> Result<SettlementReceipt, SettlementError>;

    /// Token balance of `actor` in base units. Read-only.
    async fn token_balance(&self, actor: Address, token: Address) -> Result<U256, SettlementError>;
}

/// Receives the single completion record of each successful batch.
pub trait CompletionPublisher: Send + Sync {
    /// Publish a completion record. Failures are logged, never propagated:
    /// the batch has already settled.
    fn publish(&self, record: &BatchCompleted);
}
