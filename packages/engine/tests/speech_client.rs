//! Speech client behavior over a scripted synthesizer and a null
//! audio output: event ordering, cache discipline, cancellation and
//! per-mark failure handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use read_aloud::domain::{MarkupUnit, PlaybackEvent, SpeechError};
use read_aloud::{NullOutput, PreferenceStore, SpeechClient, Synthesizer};

/// Synthesizer that counts calls and scripts failures off the input
/// text: `"silent"` yields zero bytes, `"boom"` fails.
#[derive(Default)]
struct CountingSynth {
    calls: AtomicUsize,
    voices_used: Mutex<Vec<String>>,
}

#[async_trait]
impl Synthesizer for CountingSynth {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        _rate: f32,
        _pitch: f32,
    ) -> Result<Bytes, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices_used.lock().push(voice_id.to_owned());
        if text.contains("silent") {
            return Ok(Bytes::new());
        }
        if text.contains("boom") {
            return Err(SpeechError::Provider("synthesis backend down".into()));
        }
        Ok(Bytes::from_static(b"audio-bytes"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn marked_unit(texts: &[&str]) -> MarkupUnit {
    let mut body = String::new();
    for (i, text) in texts.iter().enumerate() {
        body.push_str(&format!("<mark name=\"{i}\"/>{text}"));
    }
    MarkupUnit::new(format!("<speak xml:lang=\"en\">{body}</speak>"))
}

fn client_with(synth: Arc<CountingSynth>, output: NullOutput) -> Arc<SpeechClient> {
    Arc::new(SpeechClient::new(
        synth,
        Arc::new(output),
        Arc::new(PreferenceStore::in_memory()),
        "en",
    ))
}

async fn collect(
    client: &Arc<SpeechClient>,
    unit: &MarkupUnit,
    token: CancellationToken,
    preload: bool,
) -> Vec<PlaybackEvent> {
    Arc::clone(client).speak(unit, token, preload).collect().await
}

#[tokio::test]
async fn three_marks_yield_boundary_end_pairs_in_order() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["First.", "Second.", "Third."]);

    let events = collect(&client, &unit, CancellationToken::new(), false).await;

    let expected: Vec<PlaybackEvent> = (0..3)
        .flat_map(|i| {
            [
                PlaybackEvent::Boundary {
                    mark: i.to_string(),
                },
                PlaybackEvent::End {
                    mark: Some(i.to_string()),
                },
            ]
        })
        .collect();
    assert_eq!(events, expected);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unit_without_marks_yields_a_single_error() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = MarkupUnit::new("<speak xml:lang=\"en\">boilerplate only</speak>");

    let events = collect(&client, &unit, CancellationToken::new(), false).await;

    assert_eq!(
        events,
        vec![PlaybackEvent::Error {
            message: "No marks found".into()
        }]
    );
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_audio_skips_the_mark_not_the_unit() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["Before.", "silent", "After."]);

    let events = collect(&client, &unit, CancellationToken::new(), false).await;

    // The silent mark ends without a boundary; playback continues.
    assert_eq!(
        events,
        vec![
            PlaybackEvent::Boundary { mark: "0".into() },
            PlaybackEvent::End {
                mark: Some("0".into())
            },
            PlaybackEvent::End {
                mark: Some("1".into())
            },
            PlaybackEvent::Boundary { mark: "2".into() },
            PlaybackEvent::End {
                mark: Some("2".into())
            },
        ]
    );
}

#[tokio::test]
async fn provider_failure_halts_the_unit() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["boom", "Never spoken."]);

    let events = collect(&client, &unit, CancellationToken::new(), false).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].code(), "error");
    // The second mark is never attempted.
    assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn identical_tuples_synthesize_exactly_once() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["First.", "Second.", "Third."]);

    collect(&client, &unit, CancellationToken::new(), false).await;
    collect(&client, &unit, CancellationToken::new(), false).await;

    assert_eq!(synth.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rate_change_misses_the_cache() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["First."]);

    collect(&client, &unit, CancellationToken::new(), false).await;
    client.set_rate(1.5);
    collect(&client, &unit, CancellationToken::new(), false).await;

    assert_eq!(synth.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pre_cancelled_token_aborts_before_any_synthesis() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["First."]);
    let token = CancellationToken::new();
    token.cancel();

    let events = collect(&client, &unit, token, false).await;

    assert_eq!(
        events,
        vec![PlaybackEvent::Error {
            message: "Aborted".into()
        }]
    );
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_mid_playback_terminates_with_aborted() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(
        Arc::clone(&synth),
        NullOutput::with_clip_duration(Duration::from_secs(30)),
    );
    let unit = marked_unit(&["First.", "Second."]);
    let token = CancellationToken::new();

    let stream = Arc::clone(&client).speak(&unit, token.clone(), false);
    futures_util::pin_mut!(stream);

    let first = stream.next().await;
    assert_eq!(first, Some(PlaybackEvent::Boundary { mark: "0".into() }));
    token.cancel();
    let second = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("abort must settle promptly");
    assert_eq!(
        second,
        Some(PlaybackEvent::Error {
            message: "Aborted".into()
        })
    );
    assert!(stream.next().await.is_none());
    // The second mark is never attempted.
    assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn preload_warms_the_cache_without_playing() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(Arc::clone(&synth), NullOutput::new());
    let unit = marked_unit(&["First.", "Second.", "Third."]);

    let events = collect(&client, &unit, CancellationToken::new(), true).await;
    assert_eq!(events, vec![PlaybackEvent::End { mark: None }]);
    // The first two marks are synthesized before the stream ends.
    assert!(synth.calls.load(Ordering::SeqCst) >= 2);

    // The rest lands in the background, paced by 100ms yields.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while synth.calls.load(Ordering::SeqCst) < 3 {
        assert!(tokio::time::Instant::now() < deadline, "background preload stalled");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Playback afterwards is all cache hits.
    collect(&client, &unit, CancellationToken::new(), false).await;
    assert_eq!(synth.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn voice_resolution_prefers_the_preference_store() {
    let synth = Arc::new(CountingSynth::default());
    let prefs = Arc::new(PreferenceStore::in_memory());
    prefs.set_voice("mock", "en", "en-GB-RyanNeural");
    let client = Arc::new(SpeechClient::new(
        Arc::clone(&synth) as Arc<dyn Synthesizer>,
        Arc::new(NullOutput::new()),
        prefs,
        "en",
    ));
    let unit = marked_unit(&["First."]);

    collect(&client, &unit, CancellationToken::new(), false).await;

    assert_eq!(synth.voices_used.lock().as_slice(), ["en-GB-RyanNeural"]);
}

#[tokio::test]
async fn get_voices_wraps_one_group_and_flags_empty_disabled() {
    let synth = Arc::new(CountingSynth::default());
    let client = client_with(synth, NullOutput::new());

    let groups = client.get_voices("en");
    assert_eq!(groups.len(), 1);
    assert!(!groups[0].disabled);
    assert!(groups[0].voices.iter().any(|v| v.lang == "en-US"));
    assert!(groups[0].voices.iter().any(|v| v.lang == "en-GB"));

    let none = client.get_voices("xx");
    assert_eq!(none.len(), 1);
    assert!(none[0].disabled);
    assert!(none[0].voices.is_empty());
}
