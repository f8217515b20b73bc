//! # MultiSend Engine
//!
//! Validation and atomic execution of batch transfers.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turns a human-entered list of `(address, amount)` pairs into a provably
//! consistent batch and settles it all-or-nothing:
//! - Tolerant multi-format parsing of pasted text
//! - Address/amount validation with case-insensitive duplicate detection
//! - Exact decimal aggregation (256-bit, no floating point)
//! - Ordered fail-fast preconditions and a per-actor reentrancy guard
//! - One completion record per batch, never one per recipient
//!
//! ## Pipeline
//!
//! | Stage | Module | Effects |
//! |-------|--------|---------|
//! | Parse | `algorithms::parser` | none |
//! | Validate | `algorithms::validator` | none |
//! | Aggregate | `algorithms::aggregator` | none |
//! | Execute | `service` | one settlement call |
//! | Track | `lifecycle` | watch channel |
//!
//! ## Module Structure
//!
//! ```text
//! multisend-engine/
//! ├── domain/          # Recipient, Batch, DecimalAmount, errors, invariants
//! ├── algorithms/      # Parser, validator, aggregator
//! ├── ports/           # BatchExecutionApi + SettlementBoundary, CompletionPublisher
//! ├── adapters/        # InMemorySettlement, BroadcastPublisher
//! ├── service.rs       # BatchExecutor
//! └── lifecycle.rs     # LifecycleTracker
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod display;
pub mod domain;
pub mod explorer;
pub mod import_export;
pub mod lifecycle;
pub mod ports;
pub mod reentrancy;
pub mod service;

// Re-exports
pub use adapters::{BroadcastPublisher, InMemorySettlement, NoOpPublisher};
pub use algorithms::{
    count_valid_recipients, find_duplicate_addresses, is_valid_address, is_valid_amount,
    parse_recipients, preview_candidates, summarize, total_amount, RecipientParser,
};
pub use config::{ConfigError, EngineConfig};
pub use display::{format_address, format_amount, format_balance, format_number};
pub use domain::{
    Address, AmountError, Batch, BatchCompleted, BatchError, BatchId, BatchSummary,
    DecimalAmount, ErrorKind, ExecutionResult, ExecutionStatus, ImportError, ImportPreview,
    LifecycleError, LifecycleState, Recipient, RecipientCandidate, RecipientId, SettlementError,
    TokenDescriptor, U256,
};
pub use explorer::{address_url, tx_url};
pub use import_export::{export_csv, export_json, import_csv, import_json};
pub use lifecycle::{ActiveAttempt, LifecycleTracker, TransactionStatus, ATTEMPT_DROPPED};
pub use ports::{
    BatchExecutionApi, CompletionPublisher, ExecutionRequest, SettlementBoundary,
    SettlementReceipt,
};
pub use service::{BatchExecutor, ExecutorStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
