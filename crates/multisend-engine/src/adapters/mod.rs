//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the driven ports.
//!
//! - `InMemorySettlement`: ledger-backed settlement boundary for simulation and tests
//! - `BroadcastPublisher` / `NoOpPublisher`: completion record sinks

pub mod in_memory_settlement;
pub mod publisher;

pub use in_memory_settlement::InMemorySettlement;
pub use publisher::{BroadcastPublisher, NoOpPublisher};
