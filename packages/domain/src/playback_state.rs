//! Controller playback states, including paused-reason sub-states.
use serde::{Deserialize, Serialize};

/// Why playback is currently paused.
///
/// The reason is recorded purely for UI feedback: it distinguishes an
/// explicit pause from a seek, a rate change or a voice change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Explicit `pause()` call.
    User,
    /// `stop()` is in flight.
    Stop,
    /// Seek backward to the previous unit.
    Backward,
    /// Seek forward to the next unit.
    Forward,
    /// A rate change was applied.
    SetRate,
    /// A voice change was applied.
    SetVoice,
}

/// State of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No narration in progress. Initial and terminal state.
    Stopped,
    /// A unit is being narrated.
    Playing,
    /// Narration is suspended for the given reason.
    Paused(PauseReason),
}

impl PlaybackState {
    /// True for any paused sub-state.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused(_))
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused(PauseReason::User) => "paused",
            Self::Paused(PauseReason::Stop) => "stop-paused",
            Self::Paused(PauseReason::Backward) => "backward-paused",
            Self::Paused(PauseReason::Forward) => "forward-paused",
            Self::Paused(PauseReason::SetRate) => "setrate-paused",
            Self::Paused(PauseReason::SetVoice) => "setvoice-paused",
        };
        f.write_str(s)
    }
}
