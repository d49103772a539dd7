//! Resolved text range for on-screen highlighting.
use serde::{Deserialize, Serialize};

/// Half-open character range `[start, end)` inside the document's
/// rendered text, as resolved by the document component for a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl TextRange {
    /// Create a new range.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
