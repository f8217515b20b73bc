//! # Algorithms Module
//!
//! Pure, deterministic stages of the pipeline:
//! parse → validate → aggregate.

pub mod aggregator;
pub mod parser;
pub mod validator;

pub use aggregator::{count_valid_recipients, summarize, sum_base_units, total_amount};
pub use parser::{parse_line, parse_recipients, RecipientParser};
pub use validator::{
    classify_amount, find_duplicate_addresses, is_valid_address, is_valid_amount,
    is_valid_recipient, preview_candidates, AmountState,
};
