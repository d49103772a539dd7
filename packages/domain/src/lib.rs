//! # Read-Aloud Domain
//!
//! Shared domain objects and types for the read-aloud engine.
//!
//! This crate contains the core domain types shared between the
//! speech client, the playback controller, and the UI layer, keeping
//! the engine crate free of cyclic dependencies.

pub mod mark;
pub mod markup;
pub mod playback_event;
pub mod playback_state;
pub mod range;
pub mod speech_error;
pub mod voice;

pub use mark::Mark;
pub use markup::MarkupUnit;
pub use playback_event::PlaybackEvent;
pub use playback_state::{PauseReason, PlaybackState};
pub use range::TextRange;
pub use speech_error::SpeechError;
pub use voice::{Voice, VoiceGroup};

/// Prelude module containing commonly used types.
pub mod prelude {
    pub use crate::{
        Mark, MarkupUnit, PauseReason, PlaybackEvent, PlaybackState, SpeechError, TextRange,
        Voice, VoiceGroup,
    };
}
