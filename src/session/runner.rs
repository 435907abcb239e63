//! Capture session runner — drives the capture → downmix → encode loop.
//!
//! [`SessionRunner`] owns all mutable session state (the microphone handle,
//! the stop flag, the deadline) and responds to [`SessionCommand`]s received
//! over a `tokio::sync::mpsc` channel.
//!
//! # Session flow
//!
//! ```text
//! SessionCommand::Start
//!   └─▶ open device → spawn_blocking(record)      [Recording]
//!       (open failure → Failed event, stays Idle)
//!
//! SessionCommand::Stop  — or the duration deadline elapsing
//!   └─▶ raise stop flag → await record task       [Finalizing]
//!         └─▶ device released, clip returned
//!               ├─ downmix + encode → SampleReady event   [Idle]
//!               └─ DecodeError      → Failed event        [Failed]
//! ```
//!
//! The blocking record loop runs on `tokio::task::spawn_blocking` so the
//! async runtime never stalls.  The completion event (`SampleReady` or
//! `Failed`) fires exactly once per finalized capture, and always after the
//! record task has dropped the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::audio::{CaptureError, Clip, SampleSource};
use crate::config::CaptureConfig;
use crate::wav::{encode_wav_base64, EncodedSample};

use super::state::SessionState;

// ---------------------------------------------------------------------------
// SessionCommand / SessionEvent
// ---------------------------------------------------------------------------

/// Caller requests, sent to [`SessionRunner::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Begin a capture.  Ignored while one is already active.
    Start,
    /// Finish the capture early.  Ignored while no capture is active.
    /// The truncated clip is still finalized and encoded.
    Stop,
}

/// Session notifications, emitted by [`SessionRunner::run`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The microphone is held and samples are being accumulated.
    RecordingStarted,

    /// The recording finished; `duration_secs` reflects the samples actually
    /// captured, not the configured maximum.
    RecordingStopped { duration_secs: f32 },

    /// The encoded sample is ready for transmission.  Fires after the device
    /// has been released.
    SampleReady(EncodedSample),

    /// The capture could not start or could not be finalized.  The session is
    /// inactive again; the caller decides whether to retry.
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// ActiveCapture
// ---------------------------------------------------------------------------

/// Book-keeping for the capture currently in flight.
struct ActiveCapture {
    /// Raised to tell the record loop to finish and release the device.
    stop: Arc<AtomicBool>,
    /// The blocking record task; resolves once the device is released.
    record: JoinHandle<Result<Clip, CaptureError>>,
    /// When the capture-duration timer expires.
    deadline: Instant,
}

// ---------------------------------------------------------------------------
// SessionRunner
// ---------------------------------------------------------------------------

/// Drives a single capture session at a time.
///
/// Create with [`SessionRunner::new`], then call [`run`](Self::run) inside a
/// tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use voice_sample::audio::MicSource;
/// use voice_sample::config::CaptureConfig;
/// use voice_sample::session::{SessionCommand, SessionEvent, SessionRunner};
///
/// # async fn example() {
/// let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
/// let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(32);
///
/// let runner = SessionRunner::new(
///     Arc::new(MicSource::default_device()),
///     CaptureConfig::default(),
/// );
/// tokio::spawn(runner.run(command_rx, event_tx));
///
/// command_tx.send(SessionCommand::Start).await.unwrap();
/// while let Some(event) = event_rx.recv().await {
///     if let SessionEvent::SampleReady(sample) = event {
///         println!("{}", sample.base64);
///         break;
///     }
/// }
/// # }
/// ```
pub struct SessionRunner {
    source: Arc<dyn SampleSource>,
    config: CaptureConfig,
    state: SessionState,
    active: Option<ActiveCapture>,
}

impl SessionRunner {
    /// Create a new runner.
    ///
    /// * `source` — capture device factory (e.g. [`crate::audio::MicSource`]).
    /// * `config` — capture duration and device selection.
    pub fn new(source: Arc<dyn SampleSource>, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            state: SessionState::Idle,
            active: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the session until `command_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task.  If the
    /// channel closes while a capture is active, the capture is stopped and
    /// the device released before the loop returns.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SessionCommand>,
        event_tx: mpsc::Sender<SessionEvent>,
    ) {
        loop {
            let deadline = self.active.as_ref().map(|a| a.deadline);

            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(SessionCommand::Start) => self.handle_start(&event_tx).await,
                    Some(SessionCommand::Stop) => self.handle_stop(&event_tx).await,
                    None => break,
                },
                // Duration timer: only armed while a capture is active.
                _ = async { tokio::time::sleep_until(deadline.unwrap()).await },
                    if deadline.is_some() =>
                {
                    log::debug!("session: capture deadline reached");
                    self.handle_stop(&event_tx).await;
                }
            }
        }

        // Command channel closed — release the device if a capture is still
        // running, without emitting events nobody is listening for.
        if let Some(active) = self.active.take() {
            active.stop.store(true, Ordering::Release);
            let _ = active.record.await;
        }
        log::info!("session: command channel closed, runner shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// Handle a start request: acquire the device and begin recording.
    async fn handle_start(&mut self, event_tx: &mpsc::Sender<SessionEvent>) {
        if self.state.is_active() {
            log::debug!("session: start ignored, capture already active");
            return;
        }

        let active_source = match self.source.open() {
            Ok(source) => source,
            Err(e) => {
                // The device was never acquired; the session stays inactive.
                self.state = SessionState::Idle;
                log::warn!("session: microphone unavailable: {e}");
                let _ = event_tx
                    .send(SessionEvent::Failed {
                        message: format!("microphone unavailable: {e}"),
                    })
                    .await;
                return;
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let record =
            tokio::task::spawn_blocking(move || active_source.record(stop_clone));

        self.active = Some(ActiveCapture {
            stop,
            record,
            deadline: Instant::now() + Duration::from_millis(self.config.duration_ms),
        });
        self.state = SessionState::Recording;

        log::debug!(
            "session: recording started (max {} ms)",
            self.config.duration_ms
        );
        let _ = event_tx.send(SessionEvent::RecordingStarted).await;
    }

    /// Handle a stop request (explicit or deadline): finalize and encode.
    async fn handle_stop(&mut self, event_tx: &mpsc::Sender<SessionEvent>) {
        let Some(active) = self.active.take() else {
            log::debug!("session: stop ignored, no capture active");
            return;
        };

        self.state = SessionState::Finalizing;
        active.stop.store(true, Ordering::Release);

        // The record task drops the stream (releasing the device) before it
        // returns, so every path below runs with the microphone freed.
        let clip = match active.record.await {
            Ok(Ok(clip)) => clip,
            Ok(Err(e)) => {
                self.fail(event_tx, format!("capture failed: {e}")).await;
                return;
            }
            Err(e) => {
                self.fail(event_tx, format!("record task panicked: {e}")).await;
                return;
            }
        };

        let duration_secs = if clip.channels > 0 && clip.sample_rate > 0 {
            (clip.samples.len() / clip.channels as usize) as f32 / clip.sample_rate as f32
        } else {
            0.0
        };
        let _ = event_tx
            .send(SessionEvent::RecordingStopped { duration_secs })
            .await;

        let mono = match clip.into_mono() {
            Ok(mono) => mono,
            Err(e) => {
                self.fail(event_tx, format!("could not decode recording: {e}"))
                    .await;
                return;
            }
        };

        let sample = encode_wav_base64(&mono);
        log::info!(
            "session: sample ready ({} samples @ {} Hz, {:.2}s)",
            sample.sample_count,
            sample.sample_rate,
            sample.duration_secs()
        );

        self.state = SessionState::Idle;
        let _ = event_tx.send(SessionEvent::SampleReady(sample)).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn fail(&mut self, event_tx: &mpsc::Sender<SessionEvent>, message: String) {
        self.state = SessionState::Failed;
        log::error!("session: {message}");
        let _ = event_tx.send(SessionEvent::Failed { message }).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Clip, MockSource};
    use tokio::time::timeout;

    const EVENT_WAIT: Duration = Duration::from_secs(2);

    fn stereo_clip(frames: usize) -> Clip {
        let mut samples = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            samples.push(0.5_f32);
            samples.push(0.5_f32);
        }
        Clip {
            samples,
            sample_rate: 48_000,
            channels: 2,
        }
    }

    fn spawn_runner(
        source: MockSource,
        config: CaptureConfig,
    ) -> (
        mpsc::Sender<SessionCommand>,
        mpsc::Receiver<SessionEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(32);
        let runner = SessionRunner::new(Arc::new(source), config);
        tokio::spawn(runner.run(command_rx, event_tx));
        (command_tx, event_rx)
    }

    async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        timeout(EVENT_WAIT, rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    /// Start followed by an explicit stop must produce a mono sample with the
    /// source rate and one sample per frame.
    #[tokio::test]
    async fn start_then_stop_produces_sample() {
        let config = CaptureConfig {
            duration_ms: 60_000, // deadline must not fire in this test
            ..CaptureConfig::default()
        };
        let (tx, mut rx) = spawn_runner(MockSource::ok(stereo_clip(480)), config);

        tx.send(SessionCommand::Start).await.unwrap();
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStarted
        ));

        tx.send(SessionCommand::Stop).await.unwrap();
        match next_event(&mut rx).await {
            SessionEvent::RecordingStopped { duration_secs } => {
                // 480 frames @ 48 kHz = 10 ms
                assert!((duration_secs - 0.01).abs() < 1e-6);
            }
            other => panic!("expected RecordingStopped, got {other:?}"),
        }

        match next_event(&mut rx).await {
            SessionEvent::SampleReady(sample) => {
                assert_eq!(sample.sample_rate, 48_000);
                assert_eq!(sample.sample_count, 480);
                assert!(!sample.base64.is_empty());
            }
            other => panic!("expected SampleReady, got {other:?}"),
        }
    }

    /// The duration deadline must finalize the capture without an explicit stop.
    #[tokio::test]
    async fn deadline_finalizes_capture() {
        let config = CaptureConfig {
            duration_ms: 50,
            ..CaptureConfig::default()
        };
        let (tx, mut rx) = spawn_runner(MockSource::ok(stereo_clip(100)), config);

        tx.send(SessionCommand::Start).await.unwrap();
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStarted
        ));
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStopped { .. }
        ));
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::SampleReady(_)
        ));
    }

    /// Stop with no active capture is a no-op: no events, no state change.
    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let (tx, mut rx) = spawn_runner(
            MockSource::ok(stereo_clip(10)),
            CaptureConfig::default(),
        );

        tx.send(SessionCommand::Stop).await.unwrap();
        drop(tx); // close channel so run() returns and drops event_tx

        // The only observation must be the channel closing — no events.
        assert!(timeout(EVENT_WAIT, rx.recv()).await.unwrap().is_none());
    }

    /// A second start while a capture is active must be ignored.
    #[tokio::test]
    async fn start_while_active_is_noop() {
        let config = CaptureConfig {
            duration_ms: 60_000,
            ..CaptureConfig::default()
        };
        let (tx, mut rx) = spawn_runner(MockSource::ok(stereo_clip(10)), config);

        tx.send(SessionCommand::Start).await.unwrap();
        tx.send(SessionCommand::Start).await.unwrap();
        tx.send(SessionCommand::Stop).await.unwrap();
        drop(tx);

        let mut started = 0;
        let mut ready = 0;
        while let Some(event) = timeout(EVENT_WAIT, rx.recv()).await.unwrap() {
            match event {
                SessionEvent::RecordingStarted => started += 1,
                SessionEvent::SampleReady(_) => ready += 1,
                _ => {}
            }
        }
        assert_eq!(started, 1, "second Start must be a no-op");
        assert_eq!(ready, 1);
    }

    /// A missing microphone surfaces immediately; the capture never starts.
    #[tokio::test]
    async fn device_unavailable_fails_without_recording() {
        let (tx, mut rx) = spawn_runner(MockSource::unavailable(), CaptureConfig::default());

        tx.send(SessionCommand::Start).await.unwrap();
        match next_event(&mut rx).await {
            SessionEvent::Failed { message } => {
                assert!(message.contains("microphone unavailable"), "{message}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        // A stop after the failure must still be a no-op.
        tx.send(SessionCommand::Stop).await.unwrap();
        drop(tx);
        assert!(timeout(EVENT_WAIT, rx.recv()).await.unwrap().is_none());
    }

    /// An empty recording fails decoding but leaves the session retryable.
    #[tokio::test]
    async fn empty_clip_fails_then_allows_retry() {
        let empty = Clip {
            samples: Vec::new(),
            sample_rate: 48_000,
            channels: 2,
        };
        let config = CaptureConfig {
            duration_ms: 60_000,
            ..CaptureConfig::default()
        };
        let (tx, mut rx) = spawn_runner(MockSource::ok(empty), config);

        tx.send(SessionCommand::Start).await.unwrap();
        tx.send(SessionCommand::Stop).await.unwrap();

        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStarted
        ));
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStopped { .. }
        ));
        match next_event(&mut rx).await {
            SessionEvent::Failed { message } => {
                assert!(message.contains("could not decode"), "{message}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        // The caller may retry after a decode failure.
        tx.send(SessionCommand::Start).await.unwrap();
        assert!(matches!(
            next_event(&mut rx).await,
            SessionEvent::RecordingStarted
        ));
    }
}
