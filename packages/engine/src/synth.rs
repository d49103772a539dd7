//! Synthesis provider boundary.

use async_trait::async_trait;
use bytes::Bytes;
use read_aloud_domain::SpeechError;

/// External synthesis provider consuming a `(text, voice, rate, pitch)`
/// tuple and returning raw audio bytes.
///
/// Zero-length audio is a legal response: some inputs (pure punctuation,
/// stray whitespace) have no audible content. Provider failures surface
/// as [`SpeechError::Provider`]; the speech client normalizes them into
/// `error`-coded playback events.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize one run of plain text into audio bytes.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        rate: f32,
        pitch: f32,
    ) -> Result<Bytes, SpeechError>;

    /// Engine name, used to scope persisted voice preferences.
    fn name(&self) -> &str;
}
