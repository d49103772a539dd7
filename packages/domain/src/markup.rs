//! Opaque markup string for one speakable chunk.
use serde::{Deserialize, Serialize};

/// One speakable chunk of text-with-directives handed to the engine
/// by the document component. Consumed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupUnit(pub String);

impl MarkupUnit {
    /// Create a new markup unit.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// Get the underlying markup string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MarkupUnit {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl From<&str> for MarkupUnit {
    fn from(markup: &str) -> Self {
        Self(markup.to_owned())
    }
}

impl std::fmt::Display for MarkupUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
