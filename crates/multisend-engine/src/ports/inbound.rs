//! # Driving Ports (API - Inbound)
//!
//! The interface the presentation layer uses to trigger a batch.

use crate::domain::{Address, Batch, ExecutionResult, TokenDescriptor};
use crate::lifecycle::LifecycleTracker;
use async_trait::async_trait;

/// One explicit "execute" trigger from the presentation layer.
///
/// The batch and token are borrowed for the attempt only.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionRequest<'a> {
    /// Account initiating the batch.
    pub actor: Address,
    /// Recipients to pay.
    pub batch: &'a Batch,
    /// Selected asset.
    pub token: Option<&'a TokenDescriptor>,
    /// Native value attached by the caller. `None` attaches exactly the
    /// aggregate total. Ignored for token batches.
    pub supplied_value: Option<&'a str>,
}

impl<'a> ExecutionRequest<'a> {
    /// Creates a request with no explicit native value.
    #[must_use]
    pub fn new(actor: Address, batch: &'a Batch, token: Option<&'a TokenDescriptor>) -> Self {
        Self {
            actor,
            batch,
            token,
            supplied_value: None,
        }
    }

    /// Attaches an explicit native value.
    #[must_use]
    pub fn with_value(mut self, value: &'a str) -> Self {
        self.supplied_value = Some(value);
        self
    }
}

/// Primary API for batch execution.
///
/// ## Usage
///
/// ```ignore
/// let result = api.execute(ExecutionRequest::new(actor, &batch, Some(&token)), &tracker).await;
/// ```
#[async_trait]
pub trait BatchExecutionApi: Send + Sync {
    /// Run one all-or-nothing attempt, reporting progress on `tracker`.
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
        tracker: &LifecycleTracker,
    ) -> ExecutionResult;

    /// Whether an attempt for `actor` is currently in flight.
    fn in_flight(&self, actor: &Address) -> bool;
}
