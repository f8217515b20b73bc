//! # End-to-End Batch Flow
//!
//! Paste → summary → execute → lifecycle → completion record, against the
//! in-memory settlement ledger.
//!
//! ## Test Categories
//!
//! 1. **Happy paths** - native and token batches
//! 2. **Rejections** - nothing moves, one error per attempt
//! 3. **Concurrency** - per-actor reentrancy, independent actors in parallel

use multisend_engine::{
    export_csv, import_csv, tx_url, Address, Batch, BatchExecutionApi, BatchExecutor,
    BroadcastPublisher, EngineConfig, ErrorKind, ExecutionRequest, InMemorySettlement,
    LifecycleState, LifecycleTracker, TokenDescriptor, ATTEMPT_DROPPED, U256,
};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// TEST HELPERS
// =============================================================================

const PASTE: &str = "0x1234567890123456789012345678901234567890,1.5\n\
                     0xabcdefABCDEFabcdefABCDEFabcdefABCDEFabcd 2.0";

const TOKEN: &str = "0x00000000000000000000000000000000000000aa";

fn actor(byte: u8) -> Address {
    Address::new([byte; 20])
}

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

fn eth() -> TokenDescriptor {
    TokenDescriptor::native("ETH", "Ether", 18)
}

fn executor_with(
    ledger: InMemorySettlement,
) -> BatchExecutor<InMemorySettlement, BroadcastPublisher> {
    BatchExecutor::new(
        ledger,
        BroadcastPublisher::default(),
        EngineConfig::default().with_explorer("https://etherscan.io"),
    )
}

// =============================================================================
// HAPPY PATHS
// =============================================================================

#[tokio::test]
async fn test_paste_summarize_execute() {
    let batch = Batch::from_text(PASTE);
    let summary = batch.summary();
    assert_eq!(summary.entries, 2);
    assert_eq!(summary.valid_count, 2);
    assert_eq!(summary.total.unwrap().to_string(), "3.5");
    assert!(summary.duplicates.is_empty());

    let ledger = InMemorySettlement::new();
    ledger.set_balance(actor(1), None, ether(10));
    let executor = executor_with(ledger);
    let mut completions = executor.publisher().subscribe();
    let tracker = LifecycleTracker::new();
    let mut states = tracker.subscribe();
    let token = eth();

    let result = executor
        .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
        .await;
    assert!(result.is_success());
    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().state, LifecycleState::Success);

    let record = completions.recv().await.unwrap();
    assert_eq!(record.actor, actor(1));
    assert_eq!(record.recipient_count, 2);
    assert_eq!(record.total.to_string(), "3.5");
    assert!(completions.try_recv().is_err(), "one record per batch");

    let link = tx_url(
        result.transaction_reference().unwrap(),
        executor.config().explorer_base_url.as_deref(),
    );
    assert!(link.starts_with("https://etherscan.io/tx/0x"));

    let paid = Address::parse("0x1234567890123456789012345678901234567890").unwrap();
    assert_eq!(
        executor.settlement().balance_of(paid, None),
        U256::from(15u64) * U256::exp10(17)
    );
}

#[tokio::test]
async fn test_token_batch_from_csv_import() {
    let token_address = Address::parse(TOKEN).unwrap();
    let token = TokenDescriptor::token(token_address, "DAI", "Dai", 18).with_balance("100");

    let original = Batch::from_text(PASTE);
    let csv = export_csv(original.recipients()).unwrap();
    let batch: Batch = import_csv(&csv).unwrap().into_iter().collect();
    assert_eq!(batch.len(), 2);

    let ledger = InMemorySettlement::new();
    ledger.set_balance(actor(1), Some(token_address), ether(100));
    let executor = executor_with(ledger);
    let tracker = LifecycleTracker::new();

    let result = executor
        .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
        .await;
    let completion = result.into_result().unwrap();
    assert_eq!(completion.token, Some(token_address));
    assert_eq!(
        executor.settlement().balance_of(actor(1), Some(token_address)),
        U256::from(965u64) * U256::exp10(17)
    );
}

// =============================================================================
// REJECTIONS
// =============================================================================

#[tokio::test]
async fn test_rejections_move_nothing() {
    let ledger = InMemorySettlement::new();
    ledger.set_balance(actor(1), None, ether(10));
    let executor = executor_with(ledger);
    let tracker = LifecycleTracker::new();
    let token = eth();

    let cases = [
        ("0x1234567890123456789012345678901234567890", ErrorKind::InvalidRecipient),
        (
            "0x1234567890123456789012345678901234567890,1\n0X1234567890123456789012345678901234567890,1",
            ErrorKind::InvalidRecipient,
        ),
        (
            "0xabcdefABCDEFabcdefABCDEFabcdefABCDEFabcd,1\n0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD,1",
            ErrorKind::DuplicateAddress,
        ),
        (
            "0x1234567890123456789012345678901234567890,0.0000000000000000001",
            ErrorKind::PrecisionOverflow,
        ),
    ];

    for (text, expected) in cases {
        let batch = Batch::from_text(text);
        let result = executor
            .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
            .await;
        assert_eq!(result.error_kind(), Some(expected), "input: {text}");
        let status = tracker.status();
        assert_eq!(status.state, LifecycleState::Error);
        assert!(status.error.is_some());
    }

    assert_eq!(executor.settlement().settled_count(), 0);
    assert_eq!(executor.settlement().balance_of(actor(1), None), ether(10));
}

#[tokio::test]
async fn test_oversized_batch_rejected_before_settlement() {
    let ledger = InMemorySettlement::new();
    let executor = BatchExecutor::new(
        ledger,
        BroadcastPublisher::default(),
        EngineConfig::default().with_max_recipients(3),
    );
    let text: String = (1..=4u8)
        .map(|i| format!("{},1\n", Address::new([i; 20])))
        .collect();
    let batch = Batch::from_text(&text);
    let tracker = LifecycleTracker::new();
    let token = eth();

    let result = executor
        .execute(ExecutionRequest::new(actor(9), &batch, Some(&token)), &tracker)
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::TooManyRecipients));
    assert_eq!(executor.settlement().settled_count(), 0);
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test]
async fn test_independent_actors_run_concurrently() {
    let ledger = InMemorySettlement::new().with_delay(Duration::from_millis(100));
    ledger.set_balance(actor(1), None, ether(10));
    ledger.set_balance(actor(2), None, ether(10));
    let executor = Arc::new(executor_with(ledger));
    let batch = Batch::from_text(PASTE);
    let token = eth();
    let (first_tracker, second_tracker) = (LifecycleTracker::new(), LifecycleTracker::new());

    let (first, second) = tokio::join!(
        executor.execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &first_tracker),
        executor.execute(ExecutionRequest::new(actor(2), &batch, Some(&token)), &second_tracker),
    );
    assert!(first.is_success());
    assert!(second.is_success());
    assert_ne!(first.transaction_reference(), second.transaction_reference());
}

#[tokio::test]
async fn test_same_actor_rejected_until_resolved() {
    let ledger = InMemorySettlement::new().with_delay(Duration::from_millis(150));
    ledger.set_balance(actor(1), None, ether(10));
    let executor = Arc::new(executor_with(ledger));
    let batch = Batch::from_text(PASTE);
    let token = eth();
    let tracker = LifecycleTracker::new();

    let background = {
        let executor = Arc::clone(&executor);
        let batch = batch.clone();
        let token = token.clone();
        tokio::spawn(async move {
            let tracker = LifecycleTracker::new();
            executor
                .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(executor.in_flight(&actor(1)));
    let rejected = executor
        .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
        .await;
    assert_eq!(rejected.error_kind(), Some(ErrorKind::ReentrantCall));
    assert_eq!(tracker.state(), LifecycleState::Idle);

    assert!(background.await.unwrap().is_success());
    assert!(!executor.in_flight(&actor(1)));

    let retry = executor
        .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
        .await;
    assert!(retry.is_success());
}

#[tokio::test]
async fn test_timed_out_attempt_frees_tracker_and_actor() {
    let ledger = InMemorySettlement::new().with_delay(Duration::from_millis(300));
    ledger.set_balance(actor(1), None, ether(10));
    let executor = executor_with(ledger);
    let batch = Batch::from_text(PASTE);
    let token = eth();
    let tracker = LifecycleTracker::new();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        executor.execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker),
    )
    .await;
    assert!(timed_out.is_err());

    let status = tracker.status();
    assert_eq!(status.state, LifecycleState::Error);
    assert_eq!(status.error.as_deref(), Some(ATTEMPT_DROPPED));
    assert!(!executor.in_flight(&actor(1)));
    assert_eq!(executor.settlement().settled_count(), 0);

    let retry = executor
        .execute(ExecutionRequest::new(actor(1), &batch, Some(&token)), &tracker)
        .await;
    assert!(retry.is_success());
    assert_eq!(tracker.state(), LifecycleState::Success);
    assert_eq!(executor.settlement().settled_count(), 1);
}
