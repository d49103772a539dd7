//! Playback controller: whole-document narration orchestration.
//!
//! The only component the UI talks to. Pulls successive markup units
//! from the document, feeds them to the speech client, owns the
//! play/pause/seek state machine, drives look-ahead preloading, and
//! republishes "now speaking" / "highlight this range" events.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, pin_mut};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use read_aloud_domain::{
    Mark, MarkupUnit, PauseReason, PlaybackEvent, PlaybackState, TextRange, VoiceGroup,
};

use crate::client::SpeechClient;
use crate::prefs::PreferenceStore;
use crate::ssml;

/// Units peeked ahead and handed to the client in preload mode.
const PRELOAD_UNITS: usize = 2;
/// Ceiling on consecutive auto-advances past empty units.
const MAX_EMPTY_UNITS: u32 = 10;
/// Safety valve on awaiting an in-flight narration during stop/seek.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// The document/viewer collaborator.
///
/// Cursor contract: the controller peeks ahead during preloading by
/// calling `next()` and restores the position with one `prev()` per
/// peeked unit. The document must keep those two calls perfectly
/// symmetric; the controller cannot enforce this itself.
pub trait Document: Send + Sync {
    /// Whether the book's primary language is CJK. Selects the default
    /// segmentation granularity; this engine always narrates
    /// sentence-level marks.
    fn is_cjk(&self) -> bool;
    /// Markup for the first unit, resetting the reading cursor.
    fn start(&self) -> Option<MarkupUnit>;
    /// Markup for the next unit, advancing the cursor.
    fn next(&self) -> Option<MarkupUnit>;
    /// Markup for the previous unit, rewinding the cursor.
    fn prev(&self) -> Option<MarkupUnit>;
    /// Markup resuming exactly where playback left off.
    fn resume(&self) -> Option<MarkupUnit>;
    /// Resolve a mark name to an on-screen text range.
    fn resolve_mark(&self, mark_name: &str) -> Option<TextRange>;
}

/// Controller-to-UI notifications.
pub trait NarrationObserver: Send + Sync {
    /// A mark's audio started playing.
    fn on_speak_mark(&self, mark: &Mark);
    /// Show (and scroll into view) the range for the current mark.
    fn on_highlight_mark(&self, range: TextRange);
    /// Remove any active highlight.
    fn on_highlight_cleared(&self);
}

struct Shared {
    doc: Arc<dyn Document>,
    client: Arc<SpeechClient>,
    observer: Arc<dyn NarrationObserver>,
    state: Mutex<PlaybackState>,
}

struct Narration {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Whole-document narration with a strict play/pause/seek state machine.
pub struct PlaybackController {
    shared: Arc<Shared>,
    prefs: Arc<PreferenceStore>,
    narration: tokio::sync::Mutex<Option<Narration>>,
}

impl PlaybackController {
    /// Build a controller over a document, a speech client and a UI
    /// observer. Created in the `Stopped` state.
    pub fn new(
        doc: Arc<dyn Document>,
        client: Arc<SpeechClient>,
        observer: Arc<dyn NarrationObserver>,
        prefs: Arc<PreferenceStore>,
    ) -> Self {
        debug!(cjk = doc.is_cjk(), "narration granularity: sentence");
        Self {
            shared: Arc::new(Shared {
                doc,
                client,
                observer,
                state: Mutex::new(PlaybackState::Stopped),
            }),
            prefs,
            narration: tokio::sync::Mutex::new(None),
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        *self.shared.state.lock()
    }

    /// Begin narration: from `Stopped`, the first unit; from any paused
    /// state, the unit resuming where playback left off. No-op while
    /// already playing.
    pub async fn start(&self) {
        let resuming = match self.state() {
            PlaybackState::Playing => return,
            PlaybackState::Paused(_) => true,
            PlaybackState::Stopped => false,
        };
        let unit = if resuming {
            self.shared.doc.resume()
        } else {
            self.shared.doc.start()
        };
        let Some(unit) = unit else {
            *self.shared.state.lock() = PlaybackState::Stopped;
            return;
        };
        self.begin(unit).await;
    }

    /// Suspend the in-flight mark, preserving its elapsed offset.
    /// Valid from `Playing`.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock();
        if *state == PlaybackState::Playing {
            *state = PlaybackState::Paused(PauseReason::User);
            drop(state);
            self.shared.client.pause();
        }
    }

    /// Continue narration. Resumes the paused mark in place when the
    /// client is mid-unit-paused; otherwise routes to [`start`](Self::start)
    /// (including from `Stopped`).
    pub async fn resume(&self) {
        let in_place = {
            let mut state = self.shared.state.lock();
            match *state {
                PlaybackState::Playing => return,
                PlaybackState::Paused(_) if self.shared.client.is_paused() => {
                    *state = PlaybackState::Playing;
                    true
                }
                _ => false,
            }
        };
        if in_place {
            self.shared.client.resume();
        } else {
            self.start().await;
        }
    }

    /// Seek to the next unit and restart a fresh playback there.
    pub async fn forward(&self) {
        self.seek(PauseReason::Forward).await;
    }

    /// Seek to the previous unit and restart a fresh playback there.
    pub async fn backward(&self) {
        self.seek(PauseReason::Backward).await;
    }

    async fn seek(&self, reason: PauseReason) {
        *self.shared.state.lock() = PlaybackState::Paused(reason);
        self.cancel_current().await;
        let unit = match reason {
            PauseReason::Backward => self.shared.doc.prev(),
            _ => self.shared.doc.next(),
        };
        let Some(unit) = unit else {
            // End of content in that direction; stay in the seek-paused
            // state for UI feedback.
            return;
        };
        self.begin(unit).await;
    }

    /// Apply a new rate to subsequent synthesis. Does not stop or
    /// resume audio.
    pub fn set_rate(&self, rate: f32) {
        *self.shared.state.lock() = PlaybackState::Paused(PauseReason::SetRate);
        self.shared.client.set_rate(rate);
    }

    /// Apply a new voice and speaking language, persisting both the
    /// voice preference and the engine choice. Does not stop or resume
    /// audio.
    pub fn set_voice(&self, voice_id: &str, lang: &str) {
        *self.shared.state.lock() = PlaybackState::Paused(PauseReason::SetVoice);
        self.shared.client.set_voice(voice_id, lang);
        let engine = self.shared.client.engine_name();
        self.prefs.set_voice(engine, lang, voice_id);
        self.prefs.set_engine(engine);
    }

    /// Cancel the in-flight narration, clear the highlight and return
    /// to `Stopped`. Never hangs: the pending narration task is
    /// abandoned after a 3-second safety timeout.
    pub async fn stop(&self) {
        *self.shared.state.lock() = PlaybackState::Paused(PauseReason::Stop);
        self.cancel_current().await;
        self.shared.client.stop();
        self.shared.observer.on_highlight_cleared();
        *self.shared.state.lock() = PlaybackState::Stopped;
    }

    /// Catalog voices for `lang`, grouped for display.
    pub fn get_voices(&self, lang: &str) -> Vec<VoiceGroup> {
        self.shared.client.get_voices(lang)
    }

    /// Current voice id of the underlying client.
    pub fn voice_id(&self) -> String {
        self.shared.client.voice_id()
    }

    /// Current speaking language of the underlying client.
    pub fn speaking_lang(&self) -> String {
        self.shared.client.speaking_lang()
    }

    /// Replace any in-flight narration with a fresh one for `unit`.
    async fn begin(&self, unit: MarkupUnit) {
        self.cancel_current().await;
        *self.shared.state.lock() = PlaybackState::Playing;
        let token = CancellationToken::new();
        preload_ahead(&self.shared, &token);
        let task = tokio::spawn(narrate(Arc::clone(&self.shared), unit, token.clone()));
        *self.narration.lock().await = Some(Narration { token, task });
    }

    async fn cancel_current(&self) {
        let Some(narration) = self.narration.lock().await.take() else {
            return;
        };
        narration.token.cancel();
        if tokio::time::timeout(STOP_TIMEOUT, narration.task)
            .await
            .is_err()
        {
            warn!("in-flight narration did not settle within 3s; abandoning it");
        }
    }
}

/// One narration run: speak `first`, then chain through following units
/// while the state stays `Playing`, skipping forward past empty units
/// up to the ceiling.
async fn narrate(shared: Arc<Shared>, first: MarkupUnit, token: CancellationToken) {
    let mut unit = first;
    let mut empty_units = 0u32;
    loop {
        let hint = shared.client.speaking_lang();
        let parsed = ssml::parse_marks(&unit, Some(&hint));
        let stream = Arc::clone(&shared.client).speak(&unit, token.clone(), false);
        pin_mut!(stream);
        let mut last = None;
        while let Some(event) = stream.next().await {
            if let PlaybackEvent::Boundary { mark } = &event {
                // The unit yielded marks: the empty-unit counter resets.
                empty_units = 0;
                if let Some(m) = parsed.marks.iter().find(|m| &m.name == mark) {
                    shared.observer.on_speak_mark(m);
                }
                if let Some(range) = shared.doc.resolve_mark(mark) {
                    shared.observer.on_highlight_mark(range);
                }
            }
            last = Some(event);
        }

        let playing = *shared.state.lock() == PlaybackState::Playing;
        match last {
            // End-of-unit chaining: continuous narration across units.
            Some(PlaybackEvent::End { .. }) if playing => {
                match shared.doc.next() {
                    Some(next) => {
                        unit = next;
                        preload_ahead(&shared, &token);
                    }
                    None => break,
                }
            }
            Some(PlaybackEvent::Error { ref message })
                if message == "No marks found" =>
            {
                // Skip-forward policy: auto-advance past boilerplate,
                // bounded so the true end of the book terminates.
                if playing && empty_units < MAX_EMPTY_UNITS {
                    empty_units += 1;
                    match shared.doc.next() {
                        Some(next) => unit = next,
                        None => break,
                    }
                } else {
                    break;
                }
            }
            Some(PlaybackEvent::Error { ref message })
                if message == "Aborted" =>
            {
                // Whoever cancelled owns the state transition.
                return;
            }
            Some(PlaybackEvent::Error { ref message }) => {
                warn!(error = %message, "narration halted on unit failure");
                break;
            }
            _ => break,
        }
    }
    let mut state = shared.state.lock();
    if *state == PlaybackState::Playing {
        *state = PlaybackState::Stopped;
        drop(state);
        shared.observer.on_highlight_cleared();
    }
}

/// Peek up to two units ahead, restore the cursor, and warm the audio
/// cache for the peeked units concurrently with playback.
fn preload_ahead(shared: &Arc<Shared>, token: &CancellationToken) {
    let mut units = Vec::new();
    for _ in 0..PRELOAD_UNITS {
        match shared.doc.next() {
            Some(unit) => units.push(unit),
            None => break,
        }
    }
    for _ in 0..units.len() {
        shared.doc.prev();
    }
    if units.is_empty() {
        return;
    }
    let client = Arc::clone(&shared.client);
    let token = token.clone();
    tokio::spawn(async move {
        for unit in units {
            if token.is_cancelled() {
                break;
            }
            let stream = Arc::clone(&client).speak(&unit, token.clone(), true);
            pin_mut!(stream);
            while stream.next().await.is_some() {}
        }
    });
}
