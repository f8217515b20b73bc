//! # Recipient Parser
//!
//! Turns free-form pasted text into `(address, amount)` candidates.
//!
//! Parsing is total: every non-blank line yields exactly one candidate and
//! malformed lines simply fail validation downstream.

use crate::domain::RecipientCandidate;

/// Separators tried in order. The first one that splits a line into exactly
/// two non-empty tokens wins.
#[derive(Clone, Copy, Debug)]
enum Separator {
    Comma,
    Whitespace,
    Semicolon,
    Equals,
}

const SEPARATORS: [Separator; 4] = [
    Separator::Comma,
    Separator::Whitespace,
    Separator::Semicolon,
    Separator::Equals,
];

impl Separator {
    fn split_pair(self, line: &str) -> Option<(&str, &str)> {
        let tokens: Vec<&str> = match self {
            Self::Comma => line.split(',').map(str::trim).collect(),
            Self::Whitespace => line.split_whitespace().collect(),
            Self::Semicolon => line.split(';').map(str::trim).collect(),
            Self::Equals => line.split('=').map(str::trim).collect(),
        };
        match tokens.as_slice() {
            [address, amount] if !address.is_empty() && !amount.is_empty() => {
                Some((*address, *amount))
            }
            _ => None,
        }
    }
}

/// Lazy iterator over the candidates in a block of text.
///
/// Cloning restarts from the clone point; `parse_recipients` on the same
/// text restarts from the beginning.
#[derive(Clone, Debug)]
pub struct RecipientParser<'a> {
    lines: std::str::Lines<'a>,
}

impl Iterator for RecipientParser<'_> {
    type Item = RecipientCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .by_ref()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(parse_line)
    }
}

impl std::iter::FusedIterator for RecipientParser<'_> {}

/// Parses multi-line text into candidates, skipping blank lines.
#[must_use]
pub fn parse_recipients(text: &str) -> RecipientParser<'_> {
    RecipientParser {
        lines: text.lines(),
    }
}

/// Parses a single line. A line no separator splits into two tokens is an
/// address-only candidate with an empty amount.
#[must_use]
pub fn parse_line(line: &str) -> RecipientCandidate {
    let line = line.trim();
    SEPARATORS
        .iter()
        .find_map(|sep| sep.split_pair(line))
        .map_or_else(
            || RecipientCandidate::new(line, ""),
            |(address, amount)| RecipientCandidate::new(address, amount),
        )
}
