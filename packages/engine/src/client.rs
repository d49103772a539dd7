//! Speech client: one markup unit in, a cancellable event stream out.
//!
//! Synthesizes and plays exactly one unit, mark by mark. Playback mode
//! drives the audio output and yields boundary/end pairs per mark;
//! preload mode only warms the audio cache. The caller's cancellation
//! token is the sole interruption mechanism: it is polled before and
//! after each synthesis call and raced against the in-flight clip.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_stream::stream;
use bytes::Bytes;
use futures_util::Stream;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use read_aloud_domain::{Mark, MarkupUnit, PlaybackEvent, SpeechError, VoiceGroup};

use crate::cache::{self, AudioCache};
use crate::catalog;
use crate::output::AudioOutput;
use crate::prefs::PreferenceStore;
use crate::ssml;
use crate::synth::Synthesizer;

/// Marks synthesized up-front and awaited, in order, during preload.
const PRELOAD_IMMEDIATE: usize = 2;
/// Yield between background preload synthesis calls so the warm-up
/// never starves the runtime.
const PRELOAD_PAUSE: Duration = Duration::from_millis(100);

/// Current synthesis parameters, owned behind one lock rather than
/// scattered over private fields.
#[derive(Debug, Clone)]
struct SpeakParams {
    voice_id: String,
    lang: String,
    rate: f32,
    pitch: f32,
}

/// Synthesis and playback for single markup units.
pub struct SpeechClient {
    synth: Arc<dyn Synthesizer>,
    output: Arc<dyn AudioOutput>,
    cache: AudioCache,
    prefs: Arc<PreferenceStore>,
    params: Mutex<SpeakParams>,
    paused: AtomicBool,
}

impl SpeechClient {
    /// Build a client speaking `lang`, resolving the initial voice from
    /// the preference store, then the catalog, then the hard-coded
    /// default.
    pub fn new(
        synth: Arc<dyn Synthesizer>,
        output: Arc<dyn AudioOutput>,
        prefs: Arc<PreferenceStore>,
        lang: &str,
    ) -> Self {
        let voice_id = prefs
            .voice_for(synth.name(), lang)
            .or_else(|| catalog::first_enabled_for(lang))
            .unwrap_or_else(|| catalog::DEFAULT_VOICE_ID.to_owned());
        Self {
            synth,
            output,
            cache: AudioCache::new(),
            prefs,
            params: Mutex::new(SpeakParams {
                voice_id,
                lang: lang.to_owned(),
                rate: 1.0,
                pitch: 1.0,
            }),
            paused: AtomicBool::new(false),
        }
    }

    /// Speak (or, with `preload`, only synthesize-and-cache) one unit.
    ///
    /// Events are yielded strictly in mark order; the last event is
    /// terminal. A unit with no marks yields a single
    /// `Error { "No marks found" }`. A fired token halts iteration
    /// immediately with a terminal `Error { "Aborted" }`.
    pub fn speak(
        self: Arc<Self>,
        unit: &MarkupUnit,
        token: CancellationToken,
        preload: bool,
    ) -> impl Stream<Item = PlaybackEvent> + Send + 'static {
        let client = self;
        let unit = unit.clone();
        stream! {
            let hint = client.params.lock().lang.clone();
            let parsed = ssml::parse_marks(&unit, Some(&hint));
            if parsed.marks.is_empty() {
                yield PlaybackEvent::Error {
                    message: SpeechError::NoMarks.to_string(),
                };
                return;
            }

            if preload {
                for mark in parsed.marks.iter().take(PRELOAD_IMMEDIATE) {
                    if token.is_cancelled() {
                        yield PlaybackEvent::Error {
                            message: SpeechError::Aborted.to_string(),
                        };
                        return;
                    }
                    if let Err(e) = client.fetch(&mark.text, &mark.language).await {
                        warn!(mark = %mark.name, error = %e, "preload synthesis failed");
                    }
                }
                if parsed.marks.len() > PRELOAD_IMMEDIATE {
                    let rest: Vec<Mark> = parsed.marks[PRELOAD_IMMEDIATE..].to_vec();
                    let client = Arc::clone(&client);
                    let token = token.clone();
                    tokio::spawn(async move {
                        for mark in rest {
                            tokio::time::sleep(PRELOAD_PAUSE).await;
                            if token.is_cancelled() {
                                break;
                            }
                            if let Err(e) = client.fetch(&mark.text, &mark.language).await {
                                warn!(mark = %mark.name, error = %e, "background preload failed");
                            }
                        }
                    });
                }
                yield PlaybackEvent::End { mark: None };
                return;
            }

            // Playback: at most one audio handle at a time, so any
            // previous clip is released before the first mark.
            client.output.stop();
            client.paused.store(false, Ordering::SeqCst);
            for mark in &parsed.marks {
                if token.is_cancelled() {
                    yield PlaybackEvent::Error {
                        message: SpeechError::Aborted.to_string(),
                    };
                    return;
                }
                let audio = match client.fetch(&mark.text, &mark.language).await {
                    Ok(audio) => audio,
                    Err(e) => {
                        warn!(mark = %mark.name, error = %e, "synthesis failed; halting unit");
                        yield PlaybackEvent::Error { message: e.to_string() };
                        return;
                    }
                };
                if token.is_cancelled() {
                    yield PlaybackEvent::Error {
                        message: SpeechError::Aborted.to_string(),
                    };
                    return;
                }
                if audio.is_empty() {
                    // Pure punctuation and the like synthesize to
                    // nothing audible; skip the mark, not the unit.
                    yield PlaybackEvent::End { mark: Some(mark.name.clone()) };
                    continue;
                }
                yield PlaybackEvent::Boundary { mark: mark.name.clone() };
                match client.output.play(audio, &token).await {
                    Ok(()) => yield PlaybackEvent::End { mark: Some(mark.name.clone()) },
                    Err(SpeechError::Aborted) => {
                        yield PlaybackEvent::Error {
                            message: SpeechError::Aborted.to_string(),
                        };
                        return;
                    }
                    Err(e) => {
                        warn!(mark = %mark.name, error = %e, "playback failed; halting unit");
                        yield PlaybackEvent::Error { message: e.to_string() };
                        return;
                    }
                }
            }
        }
    }

    /// Cache-first synthesis for one run of text in `lang`.
    async fn fetch(&self, text: &str, lang: &str) -> Result<Bytes, SpeechError> {
        let (voice_id, rate, pitch) = {
            let params = self.params.lock();
            (
                self.resolve_voice(lang, &params.voice_id),
                params.rate,
                params.pitch,
            )
        };
        let key = cache::cache_key(text, &voice_id, rate, pitch);
        if let Some(audio) = self.cache.get(key) {
            debug!(voice = %voice_id, "audio cache hit");
            return Ok(audio);
        }
        let audio = self.synth.synthesize(text, &voice_id, rate, pitch).await?;
        self.cache.insert(key, audio.clone());
        Ok(audio)
    }

    /// Effective voice for a mark's language: remembered preference,
    /// else first enabled catalog voice, else the current voice, else
    /// the hard-coded default.
    fn resolve_voice(&self, lang: &str, current: &str) -> String {
        self.prefs
            .voice_for(self.synth.name(), lang)
            .or_else(|| catalog::first_enabled_for(lang))
            .unwrap_or_else(|| {
                if current.is_empty() {
                    catalog::DEFAULT_VOICE_ID.to_owned()
                } else {
                    current.to_owned()
                }
            })
    }

    /// Suspend the in-flight clip, preserving its elapsed offset.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.output.pause();
    }

    /// Continue a suspended clip in place.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.output.resume();
    }

    /// Halt playback and release the audio handle. Idempotent.
    pub fn stop(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.output.stop();
    }

    /// True while paused mid-unit.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Apply a rate to subsequent synthesis calls only; cached entries
    /// keep the parameters they were synthesized under.
    pub fn set_rate(&self, rate: f32) {
        self.params.lock().rate = rate;
    }

    /// Apply a pitch to subsequent synthesis calls only.
    pub fn set_pitch(&self, pitch: f32) {
        self.params.lock().pitch = pitch;
    }

    /// Record the current voice and speaking language.
    pub fn set_voice(&self, voice_id: &str, lang: &str) {
        let mut params = self.params.lock();
        params.voice_id = voice_id.to_owned();
        params.lang = lang.to_owned();
    }

    /// Record the speaking language without changing the voice.
    pub fn set_lang(&self, lang: &str) {
        self.params.lock().lang = lang.to_owned();
    }

    /// Current voice id.
    pub fn voice_id(&self) -> String {
        self.params.lock().voice_id.clone()
    }

    /// Current speaking language.
    pub fn speaking_lang(&self) -> String {
        self.params.lock().lang.clone()
    }

    /// Engine name of the underlying synthesizer.
    pub fn engine_name(&self) -> &str {
        self.synth.name()
    }

    /// Catalog voices for `lang` as a single display group, flagged
    /// disabled when nothing matches.
    pub fn get_voices(&self, lang: &str) -> Vec<VoiceGroup> {
        let mut voices = catalog::voices_for_lang(lang);
        catalog::sort_voices(&mut voices);
        let disabled = voices.is_empty();
        vec![VoiceGroup {
            id: lang.to_owned(),
            name: self.synth.name().to_owned(),
            voices,
            disabled,
        }]
    }
}
