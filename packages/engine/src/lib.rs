//! # Read-Aloud Engine
//!
//! Speech-playback engine for read-aloud book narration: converts
//! marked-up text units into discrete speakable marks, synthesizes and
//! plays them as a cancellable event stream, and sequences units across
//! a whole document with look-ahead caching and highlight events.
//!
//! Components, leaves first:
//!
//! - [`ssml`] — pure markup processor (generate, language detection,
//!   mark extraction).
//! - [`catalog`] — static voice table plus filter/sort/group helpers.
//! - [`prefs`] — persisted engine and per-language voice preferences.
//! - [`cache`] — bounded content-addressed audio cache.
//! - [`client`] — per-unit synthesis and playback over a
//!   [`Synthesizer`] and an [`AudioOutput`].
//! - [`controller`] — whole-document narration, the play/pause/seek
//!   state machine, and UI notifications.
//!
//! The document/viewer and the UI layer stay behind the
//! [`controller::Document`] and [`controller::NarrationObserver`]
//! traits; voice synthesis stays behind [`Synthesizer`].

pub mod cache;
pub mod catalog;
pub mod client;
pub mod controller;
pub mod output;
pub mod prefs;
pub mod ssml;
pub mod synth;

pub use cache::AudioCache;
pub use client::SpeechClient;
pub use controller::{Document, NarrationObserver, PlaybackController};
#[cfg(feature = "playback")]
pub use output::RodioOutput;
pub use output::{AudioOutput, NullOutput};
pub use prefs::PreferenceStore;
pub use synth::Synthesizer;

pub use read_aloud_domain as domain;
