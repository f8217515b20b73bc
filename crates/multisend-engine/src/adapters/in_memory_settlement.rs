//! # In-Memory Settlement Boundary
//!
//! A ledger that settles batches the way the distribution contract does:
//! every transfer in a batch is applied under one write lock, or none is.
//!
//! Used by the CLI's `simulate` command and by tests. Failures can be
//! injected with [`InMemorySettlement::fail_next`].

use crate::domain::{Address, SettlementError, U256};
use crate::ports::{SettlementBoundary, SettlementReceipt};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Ledger key: `(holder, token)`, `None` for the native asset.
type LedgerKey = (Address, Option<Address>);

/// Ledger-backed [`SettlementBoundary`].
#[derive(Debug, Default)]
pub struct InMemorySettlement {
    ledger: RwLock<HashMap<LedgerKey, U256>>,
    next_failure: Mutex<Option<SettlementError>>,
    delay: Option<Duration>,
    settled: AtomicU64,
}

impl InMemorySettlement {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every settlement for `delay` before applying it.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets a holder's balance. `token = None` is the native asset.
    pub fn set_balance(&self, holder: Address, token: Option<Address>, amount: U256) {
        self.ledger.write().insert((holder, token), amount);
    }

    /// Current balance, zero when never credited.
    #[must_use]
    pub fn balance_of(&self, holder: Address, token: Option<Address>) -> U256 {
        self.ledger
            .read()
            .get(&(holder, token))
            .copied()
            .unwrap_or_default()
    }

    /// The next settlement call fails with `error` without touching the ledger.
    pub fn fail_next(&self, error: SettlementError) {
        *self.next_failure.lock() = Some(error);
    }

    /// Batches settled so far.
    #[must_use]
    pub fn settled_count(&self) -> u64 {
        self.settled.load(Ordering::SeqCst)
    }

    async fn prepare(&self) -> Result<(), SettlementError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn receipt(&self) -> SettlementReceipt {
        let n = self.settled.fetch_add(1, Ordering::SeqCst) + 1;
        SettlementReceipt::new(format!("0x{n:064x}"))
    }

    /// Debits `debit` from `actor` and credits each recipient, atomically.
    fn apply(
        &self,
        actor: Address,
        token: Option<Address>,
        recipients: &[Address],
        amounts: &[U256],
        debit: U256,
    ) -> Result<(), SettlementError> {
        let mut ledger = self.ledger.write();

        let balance = ledger.get(&(actor, token)).copied().unwrap_or_default();
        if balance < debit {
            return Err(SettlementError::InsufficientBalance {
                balance,
                needed: debit,
            });
        }

        // Stage every balance first so a failed credit leaves the ledger untouched.
        let mut staged: HashMap<LedgerKey, U256> = HashMap::new();
        staged.insert((actor, token), balance - debit);
        for (recipient, amount) in recipients.iter().zip(amounts) {
            let key = (*recipient, token);
            let current = staged
                .get(&key)
                .copied()
                .or_else(|| ledger.get(&key).copied())
                .unwrap_or_default();
            let credited = current.checked_add(*amount).ok_or_else(|| {
                SettlementError::Rejected(format!("balance overflow for {recipient}"))
            })?;
            staged.insert(key, credited);
        }

        ledger.extend(staged);
        Ok(())
    }
}

fn checked_sum(amounts: &[U256]) -> Result<U256, SettlementError> {
    amounts
        .iter()
        .try_fold(U256::zero(), |acc, a| acc.checked_add(*a))
        .ok_or_else(|| SettlementError::Rejected("amount sum overflow".to_string()))
}

#[async_trait]
impl SettlementBoundary for InMemorySettlement {
    async fn settle_native(
        &self,
        actor: Address,
        recipients: &[Address],
        amounts: &[U256],
        value: U256,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.prepare().await?;
        if recipients.len() != amounts.len() {
            return Err(SettlementError::LengthMismatch);
        }
        let sum = checked_sum(amounts)?;
        if value < sum {
            return Err(SettlementError::InsufficientValue);
        }

        // The actor supplies `value`; the excess comes straight back.
        let available = self.balance_of(actor, None);
        if available < value {
            return Err(SettlementError::InsufficientBalance {
                balance: available,
                needed: value,
            });
        }
        self.apply(actor, None, recipients, amounts, sum)?;

        let receipt = self.receipt();
        info!(
            actor = %actor,
            recipients = recipients.len(),
            refunded = %(value - sum),
            reference = %receipt.reference,
            "Native batch settled"
        );
        Ok(receipt)
    }

    async fn settle_token(
        &self,
        actor: Address,
        token: Address,
        recipients: &[Address],
        amounts: &[U256],
        total: U256,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.prepare().await?;
        if recipients.len() != amounts.len() {
            return Err(SettlementError::LengthMismatch);
        }
        if checked_sum(amounts)? != total {
            return Err(SettlementError::TotalAmountMismatch);
        }
        self.apply(actor, Some(token), recipients, amounts, total)?;

        let receipt = self.receipt();
        info!(
            actor = %actor,
            token = %token,
            recipients = recipients.len(),
            reference = %receipt.reference,
            "Token batch settled"
        );
        Ok(receipt)
    }

    async fn token_balance(&self, actor: Address, token: Address) -> Result<U256, SettlementError> {
        let balance = self.balance_of(actor, Some(token));
        debug!(actor = %actor, token = %token, balance = %balance, "Token balance read");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[tokio::test]
    async fn test_native_settlement_refunds_excess() {
        let ledger = InMemorySettlement::new();
        ledger.set_balance(addr(1), None, U256::from(100u64));

        let receipt = ledger
            .settle_native(
                addr(1),
                &[addr(2), addr(3)],
                &[U256::from(10u64), U256::from(20u64)],
                U256::from(50u64),
            )
            .await
            .unwrap();

        assert!(receipt.reference.starts_with("0x"));
        assert_eq!(ledger.balance_of(addr(1), None), U256::from(70u64));
        assert_eq!(ledger.balance_of(addr(2), None), U256::from(10u64));
        assert_eq!(ledger.balance_of(addr(3), None), U256::from(20u64));
        assert_eq!(ledger.settled_count(), 1);
    }

    #[tokio::test]
    async fn test_native_value_below_sum_rejected() {
        let ledger = InMemorySettlement::new();
        ledger.set_balance(addr(1), None, U256::from(100u64));

        let err = ledger
            .settle_native(addr(1), &[addr(2)], &[U256::from(10u64)], U256::from(9u64))
            .await
            .unwrap_err();
        assert_eq!(err, SettlementError::InsufficientValue);
        assert_eq!(ledger.balance_of(addr(2), None), U256::zero());
    }

    #[tokio::test]
    async fn test_token_total_mismatch_rejected() {
        let ledger = InMemorySettlement::new();
        let token = addr(9);
        ledger.set_balance(addr(1), Some(token), U256::from(100u64));

        let err = ledger
            .settle_token(
                addr(1),
                token,
                &[addr(2), addr(3)],
                &[U256::from(10u64), U256::from(20u64)],
                U256::from(31u64),
            )
            .await
            .unwrap_err();
        assert_eq!(err, SettlementError::TotalAmountMismatch);
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_ledger_untouched() {
        let ledger = InMemorySettlement::new();
        let token = addr(9);
        ledger.set_balance(addr(1), Some(token), U256::from(5u64));

        let err = ledger
            .settle_token(addr(1), token, &[addr(2)], &[U256::from(10u64)], U256::from(10u64))
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(addr(1), Some(token)), U256::from(5u64));
        assert_eq!(ledger.balance_of(addr(2), Some(token)), U256::zero());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let ledger = InMemorySettlement::new();
        ledger.set_balance(addr(1), None, U256::from(100u64));
        ledger.fail_next(SettlementError::RefundFailed);

        let first = ledger
            .settle_native(addr(1), &[addr(2)], &[U256::from(1u64)], U256::from(2u64))
            .await;
        assert_eq!(first.unwrap_err(), SettlementError::RefundFailed);
        assert_eq!(ledger.balance_of(addr(1), None), U256::from(100u64));

        let second = ledger
            .settle_native(addr(1), &[addr(2)], &[U256::from(1u64)], U256::from(2u64))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_length_mismatch_rejected() {
        let ledger = InMemorySettlement::new();
        let err = ledger
            .settle_native(addr(1), &[addr(2), addr(3)], &[U256::one()], U256::one())
            .await
            .unwrap_err();
        assert_eq!(err, SettlementError::LengthMismatch);
    }
}
