//! Parse errors

use crate::synkit::range::TextRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An error reported by grammar code.
///
/// Errors are recorded next to the markers, not inside them; the tree builder later attaches
/// each one to the innermost node containing its token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError {
    /// Index of the token the cursor was on when the error was reported
    pub token_index: usize,
    pub message: String,
    /// Source range of that token
    pub range: TextRange,
}

impl ParseError {
    pub fn new(token_index: usize, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            token_index,
            message: message.into(),
            range,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.range)
    }
}
