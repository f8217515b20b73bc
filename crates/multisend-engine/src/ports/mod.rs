//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the engine and the outside world.
//!
//! - **Driving Ports (Inbound)**: `BatchExecutionApi`
//! - **Driven Ports (Outbound)**: `SettlementBoundary`, `CompletionPublisher`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
