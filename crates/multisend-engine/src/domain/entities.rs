//! # Core Domain Entities
//!
//! Recipients, batches, token descriptors and execution outcomes.

use super::errors::{BatchError, ErrorKind};
use super::value_objects::{Address, BatchId, DecimalAmount, RecipientId, U256};
use crate::algorithms::{aggregator, parser, validator};
use serde::{Deserialize, Serialize};

// =============================================================================
// RECIPIENTS
// =============================================================================

/// Raw `(address, amount)` pair produced by the parser. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientCandidate {
    /// Address as entered.
    pub address: String,
    /// Amount as entered; empty when the line carried no amount.
    pub amount: String,
}

impl RecipientCandidate {
    /// Creates a candidate from raw parts.
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            amount: amount.into(),
        }
    }
}

/// A validated unit of work.
///
/// `address`, `amount` and `is_valid` always change together; the fields are
/// private so validity cannot drift from the data it describes. Deserializing
/// goes through [`RecipientCandidate`], so a stored `is_valid` is recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecipientCandidate")]
pub struct Recipient {
    id: RecipientId,
    address: String,
    amount: String,
    is_valid: bool,
}

impl Recipient {
    /// Creates a recipient with a fresh id and computed validity.
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        let address = address.into();
        let amount = amount.into();
        let is_valid = validator::is_valid_recipient(&address, &amount);
        Self {
            id: RecipientId::generate(),
            address,
            amount,
            is_valid,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> RecipientId {
        self.id
    }

    /// Address as entered.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Amount as entered.
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Address valid AND amount empty-or-valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Address valid AND amount valid and non-empty.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        validator::is_valid_address(&self.address) && validator::is_valid_amount(&self.amount)
    }

    /// Replaces the address and recomputes validity.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
        self.revalidate();
    }

    /// Replaces the amount and recomputes validity.
    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.is_valid = validator::is_valid_recipient(&self.address, &self.amount);
    }
}

impl From<RecipientCandidate> for Recipient {
    fn from(candidate: RecipientCandidate) -> Self {
        Self::new(candidate.address, candidate.amount)
    }
}

// =============================================================================
// TOKEN DESCRIPTOR
// =============================================================================

/// The asset a batch distributes. Immutable once selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    /// Contract address; `None` for the native asset.
    pub address: Option<Address>,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Base-unit precision.
    pub decimals: u8,
    /// Known balance of the actor, as a decimal string.
    pub balance: Option<String>,
    /// True for the chain's native asset.
    pub is_native: bool,
}

impl TokenDescriptor {
    /// Descriptor for the chain's native asset.
    pub fn native(symbol: impl Into<String>, name: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: None,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            balance: None,
            is_native: true,
        }
    }

    /// Descriptor for a token contract.
    pub fn token(
        address: Address,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            address: Some(address),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            balance: None,
            is_native: false,
        }
    }

    /// Attaches a known balance.
    #[must_use]
    pub fn with_balance(mut self, balance: impl Into<String>) -> Self {
        self.balance = Some(balance.into());
        self
    }
}

// =============================================================================
// BATCH
// =============================================================================

/// Ordered recipients under consideration, exclusively owned by one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    recipients: Vec<Recipient>,
}

impl Batch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from pasted text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut batch = Self::new();
        batch.extend_from_text(text);
        batch
    }

    /// Appends every candidate parsed from `text`. Returns how many were added.
    pub fn extend_from_text(&mut self, text: &str) -> usize {
        let before = self.recipients.len();
        self.recipients
            .extend(parser::parse_recipients(text).map(Recipient::from));
        self.recipients.len() - before
    }

    /// Appends a recipient and returns its id.
    pub fn push(&mut self, recipient: Recipient) -> RecipientId {
        let id = recipient.id();
        self.recipients.push(recipient);
        id
    }

    /// Appends an empty row, as an editor does for "add recipient".
    pub fn push_empty(&mut self) -> RecipientId {
        self.push(Recipient::new("", ""))
    }

    /// Removes a recipient. Returns it if it existed.
    pub fn remove(&mut self, id: RecipientId) -> Option<Recipient> {
        let index = self.recipients.iter().position(|r| r.id() == id)?;
        Some(self.recipients.remove(index))
    }

    /// Replaces the address of a recipient. Returns false if `id` is unknown.
    pub fn update_address(&mut self, id: RecipientId, address: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(recipient) => {
                recipient.set_address(address);
                true
            }
            None => false,
        }
    }

    /// Replaces the amount of a recipient. Returns false if `id` is unknown.
    pub fn update_amount(&mut self, id: RecipientId, amount: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(recipient) => {
                recipient.set_amount(amount);
                true
            }
            None => false,
        }
    }

    /// Looks a recipient up by id.
    #[must_use]
    pub fn get(&self, id: RecipientId) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id() == id)
    }

    fn get_mut(&mut self, id: RecipientId) -> Option<&mut Recipient> {
        self.recipients.iter_mut().find(|r| r.id() == id)
    }

    /// Removes every recipient.
    pub fn clear(&mut self) {
        self.recipients.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// True when the batch has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.recipients.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Totals and counts for a summary panel.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        aggregator::summarize(&self.recipients)
    }
}

impl FromIterator<Recipient> for Batch {
    fn from_iter<I: IntoIterator<Item = Recipient>>(iter: I) -> Self {
        Self {
            recipients: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.iter()
    }
}

/// Live preview data for a summary panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Exact sum of valid amounts; `None` if the sum overflowed.
    pub total: Option<DecimalAmount>,
    /// Entries ready for execution.
    pub valid_count: usize,
    /// Entries not ready for execution.
    pub invalid_count: usize,
    /// Lower-cased addresses occurring more than once.
    pub duplicates: Vec<String>,
    /// All entries.
    pub entries: usize,
}

/// Counts shown before a bulk paste is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPreview {
    /// Candidates with a valid address and an empty-or-valid amount.
    pub valid: usize,
    /// Remaining candidates.
    pub invalid: usize,
    /// All parsed candidates.
    pub total: usize,
}

// =============================================================================
// EXECUTION OUTCOME
// =============================================================================

/// The single record emitted per successful batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCompleted {
    /// Attempt identity.
    pub batch_id: BatchId,
    /// Initiating actor.
    pub actor: Address,
    /// Token contract; `None` for native transfers.
    pub token: Option<Address>,
    /// Aggregate total in base units.
    pub total_base_units: U256,
    /// Aggregate total as a display amount.
    pub total: DecimalAmount,
    /// Recipients paid.
    pub recipient_count: usize,
    /// Settlement reference (e.g. transaction hash).
    pub reference: String,
}

/// Outcome status of one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Every recipient was paid.
    Success,
    /// Nobody was paid.
    Error,
}

/// Result of one execution attempt. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    status: ExecutionStatus,
    transaction_reference: Option<String>,
    error: Option<BatchError>,
    completion: Option<BatchCompleted>,
}

impl ExecutionResult {
    /// Successful attempt.
    #[must_use]
    pub fn success(completion: BatchCompleted) -> Self {
        Self {
            status: ExecutionStatus::Success,
            transaction_reference: Some(completion.reference.clone()),
            error: None,
            completion: Some(completion),
        }
    }

    /// Failed attempt.
    #[must_use]
    pub fn failure(error: BatchError) -> Self {
        Self {
            status: ExecutionStatus::Error,
            transaction_reference: None,
            error: Some(error),
            completion: None,
        }
    }

    /// Outcome status.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// True on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Settlement reference on success.
    #[must_use]
    pub fn transaction_reference(&self) -> Option<&str> {
        self.transaction_reference.as_deref()
    }

    /// Classified error on failure.
    #[must_use]
    pub fn error(&self) -> Option<&BatchError> {
        self.error.as_ref()
    }

    /// Error classification on failure.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(BatchError::kind)
    }

    /// Completion record on success.
    #[must_use]
    pub fn completion(&self) -> Option<&BatchCompleted> {
        self.completion.as_ref()
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<BatchCompleted, BatchError> {
        match (self.completion, self.error) {
            (Some(completion), _) => Ok(completion),
            (None, Some(error)) => Err(error),
            (None, None) => Err(BatchError::SettlementRejected {
                cause: "empty execution result".to_string(),
            }),
        }
    }
}
