//! # Batch Executor Service
//!
//! The one effectful operation of the engine: turns a validated batch into a
//! single all-or-nothing settlement.
//!
//! ## Attempt Flow
//!
//! 1. Per-actor reentrancy guard (rejected attempts leave the tracker alone)
//! 2. `tracker.begin()` → `preparing`
//! 3. Preconditions, fail-fast, in order:
//!    token → non-empty → bound → entries → duplicates → precision →
//!    zero total → native value / token balance
//! 4. Domain invariants on the prepared batch
//! 5. `tracker.dispatched()` → `pending`, then one settlement call
//! 6. One `BatchCompleted` record, then `success`; or `error` with the cause
//!
//! Nothing before step 5 has an externally observable effect. Failures are
//! never retried here: a retry is a new attempt. Dropping the future of an
//! attempt moves its tracker to `error` and frees the actor.

use crate::adapters::NoOpPublisher;
use crate::algorithms::{
    classify_amount, find_duplicate_addresses, is_valid_address, sum_base_units, AmountState,
};
use crate::config::EngineConfig;
use crate::domain::{
    check_all_invariants, Address, AmountError, Batch, BatchCompleted, BatchError, BatchId,
    DecimalAmount, ExecutionResult, InvariantCheckResult, Recipient, TokenDescriptor, U256,
};
use crate::lifecycle::LifecycleTracker;
use crate::ports::{BatchExecutionApi, CompletionPublisher, ExecutionRequest, SettlementBoundary};
use crate::reentrancy::ReentrancyGuard;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Counters for executed attempts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Attempts that passed the reentrancy guard.
    pub attempts: u64,
    /// Attempts that settled.
    pub succeeded: u64,
    /// Attempts rejected before dispatch.
    pub rejected: u64,
    /// Attempts the settlement boundary failed.
    pub settlement_failures: u64,
    /// Attempts refused by the reentrancy guard.
    pub reentrant_rejections: u64,
}

/// Which settlement call a prepared batch goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Asset {
    /// Native value attached to the call.
    Native { value: U256 },
    /// Token pulled from the actor.
    Token { address: Address },
}

/// A batch that passed every precondition, in base units.
#[derive(Debug)]
struct PreparedBatch {
    asset: Asset,
    decimals: u8,
    recipients: Vec<Address>,
    amounts: Vec<U256>,
    total: U256,
}

/// Executes batches against a settlement boundary.
///
/// Holds no batch state between attempts: the batch and token are borrowed
/// per call and results go back in the [`ExecutionResult`].
pub struct BatchExecutor<S: SettlementBoundary, P: CompletionPublisher = NoOpPublisher> {
    config: EngineConfig,
    settlement: Arc<S>,
    publisher: Arc<P>,
    guard: ReentrancyGuard,
    stats: Arc<RwLock<ExecutorStats>>,
}

impl<S: SettlementBoundary> BatchExecutor<S, NoOpPublisher> {
    /// Executor that publishes completions nowhere.
    pub fn without_publisher(settlement: S, config: EngineConfig) -> Self {
        Self::new(settlement, NoOpPublisher, config)
    }
}

impl<S: SettlementBoundary, P: CompletionPublisher> BatchExecutor<S, P> {
    /// Create a new executor.
    pub fn new(settlement: S, publisher: P, config: EngineConfig) -> Self {
        Self {
            config,
            settlement: Arc::new(settlement),
            publisher: Arc::new(publisher),
            guard: ReentrancyGuard::new(),
            stats: Arc::new(RwLock::new(ExecutorStats::default())),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The settlement boundary.
    #[must_use]
    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    /// The completion publisher.
    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Snapshot of the attempt counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.stats.read().clone()
    }

    /// Run one attempt.
    #[instrument(
        skip(self, request, tracker),
        fields(actor = %request.actor, recipients = request.batch.len())
    )]
    pub async fn execute(
        &self,
        request: ExecutionRequest<'_>,
        tracker: &LifecycleTracker,
    ) -> ExecutionResult {
        let actor = request.actor;

        let Some(_in_flight) = self.guard.try_enter(actor) else {
            warn!("Attempt already in flight for actor, rejecting");
            self.stats.write().reentrant_rejections += 1;
            return ExecutionResult::failure(BatchError::ReentrantCall { actor });
        };

        if let Err(err) = tracker.begin() {
            warn!(error = %err, "Tracker busy with another attempt, rejecting");
            self.stats.write().reentrant_rejections += 1;
            return ExecutionResult::failure(BatchError::ReentrantCall { actor });
        }
        // Declared after `_in_flight` so the tracker settles before the actor
        // is released if this future is dropped.
        let _attempt = tracker.attempt();
        self.stats.write().attempts += 1;

        match self.run(request, tracker).await {
            Ok(completion) => {
                self.stats.write().succeeded += 1;
                info!(
                    batch_id = %completion.batch_id,
                    total = %completion.total,
                    reference = %completion.reference,
                    "Batch settled"
                );
                self.publisher.publish(&completion);
                if let Err(err) = tracker.complete(Some(completion.reference.clone())) {
                    error!(error = %err, "Failed to record success");
                }
                ExecutionResult::success(completion)
            }
            Err(failure) => {
                {
                    let mut stats = self.stats.write();
                    if failure.is_settlement_failure() {
                        stats.settlement_failures += 1;
                    } else {
                        stats.rejected += 1;
                    }
                }
                warn!(kind = %failure.kind(), error = %failure, "Batch attempt failed");
                if let Err(err) = tracker.fail(failure.to_string()) {
                    error!(error = %err, "Failed to record failure");
                }
                ExecutionResult::failure(failure)
            }
        }
    }

    async fn run(
        &self,
        request: ExecutionRequest<'_>,
        tracker: &LifecycleTracker,
    ) -> Result<BatchCompleted, BatchError> {
        let prepared = self.prepare(&request).await?;

        if let InvariantCheckResult::Invalid(violations) = check_all_invariants(
            &prepared.recipients,
            &prepared.amounts,
            prepared.total,
            self.config.max_recipients,
        ) {
            let cause = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(%cause, "Prepared batch violates invariants");
            return Err(BatchError::SettlementRejected { cause });
        }

        tracker
            .dispatched()
            .map_err(|err| BatchError::SettlementRejected {
                cause: err.to_string(),
            })?;
        debug!(total = %prepared.total, "Dispatching batch");

        let actor = request.actor;
        let receipt = match prepared.asset {
            Asset::Native { value } => {
                self.settlement
                    .settle_native(actor, &prepared.recipients, &prepared.amounts, value)
                    .await
            }
            Asset::Token { address } => {
                self.settlement
                    .settle_token(
                        actor,
                        address,
                        &prepared.recipients,
                        &prepared.amounts,
                        prepared.total,
                    )
                    .await
            }
        }
        .map_err(|err| BatchError::from_settlement(err, actor, prepared.decimals))?;

        Ok(BatchCompleted {
            batch_id: BatchId::generate(),
            actor,
            token: match prepared.asset {
                Asset::Native { .. } => None,
                Asset::Token { address } => Some(address),
            },
            total_base_units: prepared.total,
            total: DecimalAmount::from_base_units(prepared.total, prepared.decimals),
            recipient_count: prepared.recipients.len(),
            reference: receipt.reference,
        })
    }

    /// Precondition checks, in reporting order. Effect-free apart from a
    /// read-only balance query.
    async fn prepare(&self, request: &ExecutionRequest<'_>) -> Result<PreparedBatch, BatchError> {
        let token = selected_token(request.token)?;
        let batch = request.batch;

        if batch.is_empty() {
            return Err(BatchError::NoRecipients);
        }
        if batch.len() > self.config.max_recipients {
            return Err(BatchError::TooManyRecipients {
                count: batch.len(),
                max: self.config.max_recipients,
            });
        }

        let entries = executable_entries(batch)?;

        let duplicates = find_duplicate_addresses(batch.recipients());
        if !duplicates.is_empty() {
            return Err(BatchError::DuplicateAddress(duplicates));
        }

        let decimals = token.decimals;
        let mut recipients = Vec::with_capacity(entries.len());
        let mut amounts = Vec::with_capacity(entries.len());
        for (index, (address, amount)) in entries.into_iter().enumerate() {
            let raw = batch.recipients()[index].amount();
            amounts.push(base_units(amount, decimals, Some(index), raw)?);
            recipients.push(address);
        }

        let total = sum_base_units(&amounts).ok_or_else(|| BatchError::SettlementRejected {
            cause: "aggregate total exceeds 256 bits".to_string(),
        })?;
        if total.is_zero() {
            return Err(BatchError::ZeroTotalAmount);
        }

        let asset = match token.address {
            None => Asset::Native {
                value: self.native_value(request.supplied_value, total, decimals)?,
            },
            Some(address) => {
                self.ensure_token_balance(request.actor, token, address, total)
                    .await?;
                Asset::Token { address }
            }
        };

        Ok(PreparedBatch {
            asset,
            decimals,
            recipients,
            amounts,
            total,
        })
    }

    /// Native value to attach; must cover `total`.
    fn native_value(
        &self,
        supplied: Option<&str>,
        total: U256,
        decimals: u8,
    ) -> Result<U256, BatchError> {
        let Some(raw) = supplied else {
            return Ok(total);
        };
        let insufficient = || BatchError::InsufficientValue {
            supplied: raw.trim().to_string(),
            required: DecimalAmount::from_base_units(total, decimals),
        };

        let value = match raw.parse::<DecimalAmount>() {
            Ok(value) => base_units(value, decimals, None, raw)?,
            Err(_) => return Err(insufficient()),
        };
        if value < total {
            return Err(insufficient());
        }
        if value > total {
            debug!(excess = %(value - total), "Supplied value exceeds total, excess refunded");
        }
        Ok(value)
    }

    async fn ensure_token_balance(
        &self,
        actor: Address,
        token: &TokenDescriptor,
        address: Address,
        total: U256,
    ) -> Result<(), BatchError> {
        let decimals = token.decimals;
        let declared = token.balance.as_deref().and_then(|raw| {
            let units = raw
                .parse::<DecimalAmount>()
                .ok()
                .and_then(|balance| balance.to_base_units(decimals).ok());
            if units.is_none() {
                warn!(balance = %raw, "Unusable declared balance, querying settlement boundary");
            }
            units
        });

        let available = match declared {
            Some(units) => units,
            None => self
                .settlement
                .token_balance(actor, address)
                .await
                .map_err(|err| BatchError::from_settlement(err, actor, decimals))?,
        };

        if available < total {
            let available = DecimalAmount::from_base_units(available, decimals);
            let needed = DecimalAmount::from_base_units(total, decimals);
            return Err(BatchError::InsufficientBalance {
                available,
                needed,
                shortfall: needed.checked_sub(&available).unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<S: SettlementBoundary, P: CompletionPublisher> BatchExecutionApi for BatchExecutor<S, P> {
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
        tracker: &LifecycleTracker,
    ) -> ExecutionResult {
        BatchExecutor::execute(self, request, tracker).await
    }

    fn in_flight(&self, actor: &Address) -> bool {
        self.guard.is_in_flight(actor)
    }
}

fn selected_token(token: Option<&TokenDescriptor>) -> Result<&TokenDescriptor, BatchError> {
    match token {
        Some(token) if token.is_native || token.address.is_some() => Ok(token),
        _ => Err(BatchError::NoTokenSelected),
    }
}

/// Every entry parsed, or the first offending entry.
fn executable_entries(batch: &Batch) -> Result<Vec<(Address, DecimalAmount)>, BatchError> {
    batch
        .iter()
        .enumerate()
        .map(|(index, recipient)| executable_entry(index, recipient))
        .collect()
}

fn executable_entry(
    index: usize,
    recipient: &Recipient,
) -> Result<(Address, DecimalAmount), BatchError> {
    let invalid = |reason: &str| BatchError::InvalidRecipient {
        index,
        address: recipient.address().to_string(),
        reason: reason.to_string(),
    };

    let address = is_valid_address(recipient.address())
        .then(|| Address::parse(recipient.address()))
        .flatten()
        .ok_or_else(|| invalid("invalid address"))?;

    match classify_amount(recipient.amount()) {
        AmountState::Valid(amount) => Ok((address, amount)),
        AmountState::Unspecified => Err(invalid("amount is required")),
        AmountState::Invalid => Err(invalid("invalid amount")),
    }
}

fn base_units(
    amount: DecimalAmount,
    decimals: u8,
    index: Option<usize>,
    raw: &str,
) -> Result<U256, BatchError> {
    amount.to_base_units(decimals).map_err(|err| match err {
        AmountError::PrecisionOverflow { .. } => BatchError::PrecisionOverflow {
            index,
            amount: raw.trim().to_string(),
            decimals,
        },
        other => BatchError::SettlementRejected {
            cause: other.to_string(),
        },
    })
}
