//! Unified error for the speech-playback engine.
use thiserror::Error;

/// Error taxonomy for synthesis and playback.
///
/// Per-mark errors are caught at the speech-client boundary and turned
/// into `error`-coded playback events; the display strings of
/// [`NoMarks`](Self::NoMarks) and [`Aborted`](Self::Aborted) are part
/// of that event contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    /// The unit had no speakable marks. Non-fatal; triggers skip-forward.
    #[error("No marks found")]
    NoMarks,
    /// The provider returned zero bytes for one mark. Non-fatal; the
    /// mark is skipped.
    #[error("empty audio")]
    EmptyAudio,
    /// Cancellation fired. Non-fatal from the engine's perspective.
    #[error("Aborted")]
    Aborted,
    /// Network or synthesis failure; the unit's iteration halts.
    #[error("provider: {0}")]
    Provider(String),
    /// The stop safety valve expired; the in-flight task is abandoned.
    #[error("timed out")]
    Timeout,
    /// Invalid engine or client configuration.
    #[error("configuration: {0}")]
    Configuration(String),
    /// Audio output failure.
    #[error("playback: {0}")]
    Playback(String),
}
