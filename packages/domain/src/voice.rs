//! Synthesizer voice catalog entries and display groups.
use serde::{Deserialize, Serialize};

/// Immutable catalog entry describing one synthesizer voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Provider voice identifier (e.g. `"en-US-AriaNeural"`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// BCP-47-like locale (e.g. `"en-US"`).
    pub lang: String,
    /// Whether this voice is currently unavailable.
    pub disabled: bool,
}

impl Voice {
    /// Create a new enabled voice.
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
            disabled: false,
        }
    }

    /// Primary language subtag of the locale (`"en-US"` -> `"en"`).
    pub fn primary_lang(&self) -> &str {
        self.lang.split(['-', '_']).next().unwrap_or(&self.lang)
    }

    /// Region subtag of the locale (`"en-US"` -> `Some("US")`).
    pub fn region(&self) -> Option<&str> {
        self.lang.split(['-', '_']).nth(1)
    }
}

/// A named, filtered/sorted slice of the catalog.
///
/// Regenerated on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceGroup {
    /// Group identifier (typically the requested language).
    pub id: String,
    /// Display name for the group.
    pub name: String,
    /// Voices in display order.
    pub voices: Vec<Voice>,
    /// True when the group should not be selectable.
    pub disabled: bool,
}
