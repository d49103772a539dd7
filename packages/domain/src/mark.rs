//! A named, offset-addressed run of plain text within a markup unit.
use serde::{Deserialize, Serialize};

/// The atomic unit of playback and highlighting.
///
/// Marks are produced in document order while parsing a markup unit.
/// Within one unit they are strictly increasing by [`offset`](Self::offset)
/// and the set is immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Character offset of `text` inside the unit's flattened plain text.
    pub offset: usize,
    /// Unique sequential name within the unit (e.g. `"3"`).
    pub name: String,
    /// The contiguous run of plain text this mark covers.
    pub text: String,
    /// Language in effect at this point of the unit.
    pub language: String,
}

impl Mark {
    /// Create a new mark.
    pub fn new(
        offset: usize,
        name: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            offset,
            name: name.into(),
            text: text.into(),
            language: language.into(),
        }
    }
}
