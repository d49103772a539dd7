//! Audio output devices.
//!
//! The speech client owns exactly one output; the output guarantees at
//! most one audio handle exists at a time, fully releasing the previous
//! handle before creating a new one.

use async_trait::async_trait;
use bytes::Bytes;
use read_aloud_domain::SpeechError;
use tokio_util::sync::CancellationToken;

/// Platform audio output for one clip at a time.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play one clip to completion.
    ///
    /// Resolves when the clip finishes or `token` fires, whichever comes
    /// first; a fired token releases the audio handle and resolves to
    /// [`SpeechError::Aborted`], so a cancel takes effect even while
    /// blocked on playback.
    async fn play(&self, audio: Bytes, token: &CancellationToken) -> Result<(), SpeechError>;

    /// Suspend the in-flight clip, preserving its elapsed offset.
    fn pause(&self);

    /// Continue a suspended clip in place.
    fn resume(&self);

    /// Halt playback and release the audio handle. Idempotent.
    fn stop(&self);
}

/// Output that plays nothing.
///
/// Backs preload-only use and tests. An optional clip duration stands in
/// for real playback time so cancellation mid-clip stays observable.
pub struct NullOutput {
    clip: std::time::Duration,
}

impl NullOutput {
    /// Output whose clips finish immediately.
    pub fn new() -> Self {
        Self {
            clip: std::time::Duration::ZERO,
        }
    }

    /// Output whose clips take `clip` of wall time to "play".
    pub fn with_clip_duration(clip: std::time::Duration) -> Self {
        Self { clip }
    }
}

impl Default for NullOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioOutput for NullOutput {
    async fn play(&self, _audio: Bytes, token: &CancellationToken) -> Result<(), SpeechError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SpeechError::Aborted),
            _ = tokio::time::sleep(self.clip) => Ok(()),
        }
    }

    fn pause(&self) {}
    fn resume(&self) {}
    fn stop(&self) {}
}

#[cfg(feature = "playback")]
pub use self::rodio_output::RodioOutput;

#[cfg(feature = "playback")]
mod rodio_output {
    use std::sync::mpsc;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use read_aloud_domain::SpeechError;
    use tokio::sync::oneshot;
    use tokio_util::sync::CancellationToken;
    use tracing::warn;

    use super::AudioOutput;

    const POLL: Duration = Duration::from_millis(50);

    enum Cmd {
        Play(Bytes, oneshot::Sender<Result<(), SpeechError>>),
        Pause,
        Resume,
        Stop,
    }

    /// System audio output backed by a dedicated rodio thread.
    ///
    /// cpal streams are not `Send`, so all rodio state lives on one
    /// thread and the async side talks to it over a channel. Completion
    /// is signalled back over a oneshot raced against the caller's
    /// cancellation token.
    pub struct RodioOutput {
        tx: mpsc::Sender<Cmd>,
    }

    impl RodioOutput {
        /// Spawn the audio thread. The output device itself is opened
        /// lazily on the first clip.
        pub fn new() -> Result<Self, SpeechError> {
            let (tx, rx) = mpsc::channel();
            std::thread::Builder::new()
                .name("read-aloud-audio".into())
                .spawn(move || audio_thread(rx))
                .map_err(|e| SpeechError::Playback(e.to_string()))?;
            Ok(Self { tx })
        }
    }

    #[async_trait]
    impl AudioOutput for RodioOutput {
        async fn play(&self, audio: Bytes, token: &CancellationToken) -> Result<(), SpeechError> {
            let (done_tx, done_rx) = oneshot::channel();
            self.tx
                .send(Cmd::Play(audio, done_tx))
                .map_err(|_| SpeechError::Playback("audio thread is gone".into()))?;
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    let _ = self.tx.send(Cmd::Stop);
                    Err(SpeechError::Aborted)
                }
                res = done_rx => res.unwrap_or(Err(SpeechError::Aborted)),
            }
        }

        fn pause(&self) {
            let _ = self.tx.send(Cmd::Pause);
        }

        fn resume(&self) {
            let _ = self.tx.send(Cmd::Resume);
        }

        fn stop(&self) {
            let _ = self.tx.send(Cmd::Stop);
        }
    }

    struct Active {
        sink: rodio::Sink,
        done: oneshot::Sender<Result<(), SpeechError>>,
    }

    fn audio_thread(rx: mpsc::Receiver<Cmd>) {
        let mut stream: Option<rodio::OutputStream> = None;
        let mut active: Option<Active> = None;
        loop {
            match rx.recv_timeout(POLL) {
                Ok(Cmd::Play(audio, done)) => {
                    // Fully release the previous handle first; dropping
                    // its sender resolves the old play() as aborted.
                    if let Some(prev) = active.take() {
                        prev.sink.stop();
                    }
                    if stream.is_none() {
                        match rodio::OutputStreamBuilder::open_default_stream() {
                            Ok(s) => stream = Some(s),
                            Err(e) => {
                                warn!(error = %e, "failed to open audio output stream");
                                let _ = done.send(Err(SpeechError::Playback(e.to_string())));
                                continue;
                            }
                        }
                    }
                    let Some(out) = stream.as_ref() else { continue };
                    match rodio::Decoder::new(std::io::Cursor::new(audio)) {
                        Ok(source) => {
                            let sink = rodio::Sink::connect_new(&out.mixer());
                            sink.append(source);
                            active = Some(Active { sink, done });
                        }
                        Err(e) => {
                            let _ = done.send(Err(SpeechError::Playback(e.to_string())));
                        }
                    }
                }
                Ok(Cmd::Pause) => {
                    if let Some(a) = &active {
                        a.sink.pause();
                    }
                }
                Ok(Cmd::Resume) => {
                    if let Some(a) = &active {
                        a.sink.play();
                    }
                }
                Ok(Cmd::Stop) => {
                    if let Some(a) = active.take() {
                        a.sink.stop();
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    // A paused sink keeps its queue, so it never reads
                    // as finished here.
                    if active.as_ref().is_some_and(|a| a.sink.empty()) {
                        if let Some(a) = active.take() {
                            let _ = a.done.send(Ok(()));
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    if let Some(a) = active.take() {
                        a.sink.stop();
                    }
                    break;
                }
            }
        }
    }
}
