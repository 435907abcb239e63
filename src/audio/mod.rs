//! Audio pipeline — microphone capture → downmix → WAV encoding.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → Clip
//!           → downmix_to_mono → MonoClip → wav::encode_wav_base64
//! ```
//!
//! The capture side is abstracted behind [`SampleSource`] so the session
//! runner can be driven by a mock in tests; [`MicSource`] is the cpal-backed
//! implementation used in production.

pub mod capture;
pub mod clip;
pub mod downmix;

pub use capture::{ActiveSource, AudioChunk, CaptureError, MicSource, SampleSource};
pub use clip::{Clip, DecodeError, MonoClip};
pub use downmix::downmix_to_mono;

// test-only re-export so the session test module can import MockSource
// without `use voice_sample::audio::capture::MockSource`.
#[cfg(test)]
pub use capture::MockSource;
