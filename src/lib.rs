//! voice-sample — bounded microphone capture encoded as a base64 WAV payload.
//!
//! Records a voice sample of at most a configured duration (4 s by default),
//! downmixes it to mono, quantizes it to 16-bit PCM, wraps it in a standard
//! 44-byte RIFF/WAVE container at the device's native sample rate, and hands
//! the caller a base64 string ready to embed in a JSON request to a
//! speaker-verification endpoint.  No network I/O happens here.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc) ──▶ SessionRunner ──▶ SessionEvent (mpsc)
//!                               │
//!                SampleSource::open / ActiveSource::record
//!                               │ (spawn_blocking, cpal)
//!                               ▼
//!                    Clip → MonoClip → EncodedSample
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_sample::audio::MicSource;
//! use voice_sample::config::CaptureConfig;
//! use voice_sample::session::{SessionCommand, SessionEvent, SessionRunner};
//!
//! # async fn example() {
//! let (command_tx, command_rx) = mpsc::channel(16);
//! let (event_tx, mut event_rx) = mpsc::channel(32);
//!
//! let runner = SessionRunner::new(
//!     Arc::new(MicSource::default_device()),
//!     CaptureConfig::default(),
//! );
//! tokio::spawn(runner.run(command_rx, event_tx));
//!
//! command_tx.send(SessionCommand::Start).await.unwrap();
//! while let Some(event) = event_rx.recv().await {
//!     if let SessionEvent::SampleReady(sample) = event {
//!         println!("{}", sample.base64);
//!         break;
//!     }
//! }
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod session;
pub mod wav;
