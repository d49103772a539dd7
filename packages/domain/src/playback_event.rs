//! Events emitted while playing one markup unit.
use serde::{Deserialize, Serialize};

/// Progress event for a single markup unit's playback.
///
/// Events are emitted strictly in mark order and the last event for a
/// unit is terminal: either an [`End`](Self::End) with no further marks
/// pending, or an [`Error`](Self::Error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback of a specific mark's audio has begun.
    Boundary {
        /// Name of the mark that started playing.
        mark: String,
    },
    /// Playback of a mark (or of the whole unit, in preload mode) finished.
    End {
        /// Name of the mark that finished, if any.
        mark: Option<String>,
    },
    /// Playback failed or was interrupted.
    Error {
        /// Human-readable reason (e.g. `"Aborted"`, `"No marks found"`).
        message: String,
    },
}

impl PlaybackEvent {
    /// The event's wire code: `"boundary"`, `"end"` or `"error"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Boundary { .. } => "boundary",
            Self::End { .. } => "end",
            Self::Error { .. } => "error",
        }
    }

    /// Mark name carried by this event, if any.
    pub fn mark(&self) -> Option<&str> {
        match self {
            Self::Boundary { mark } => Some(mark),
            Self::End { mark } => mark.as_deref(),
            Self::Error { .. } => None,
        }
    }
}
