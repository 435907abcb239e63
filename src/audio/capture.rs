//! Microphone capture via `cpal`.
//!
//! [`SampleSource`] is the seam between the capture session and the hardware:
//! [`SampleSource::open`] acquires the input device (failing fast when no
//! microphone is available) and returns an [`ActiveSource`] whose
//! [`record`](ActiveSource::record) call blocks until a stop flag is raised,
//! then releases the device and returns the accumulated [`Clip`].
//!
//! [`MicSource`] is the cpal implementation.  `cpal::Stream` is not `Send` on
//! every platform, so the stream is built, driven, and dropped entirely inside
//! `record()` on the calling (blocking) thread; only the `cpal::Device`
//! crosses the thread boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::clip::Clip;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device \"{0}\" not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// SampleSource / ActiveSource
// ---------------------------------------------------------------------------

/// Factory for capture streams.
///
/// The session runner holds an `Arc<dyn SampleSource>` so tests can substitute
/// [`MockSource`] for real hardware.
pub trait SampleSource: Send + Sync {
    /// Acquire the input device and its stream configuration.
    ///
    /// # Errors
    ///
    /// Fails when the microphone cannot be acquired (no device, unknown device
    /// name, or the device cannot report a stream configuration).  On failure
    /// the capture never becomes active.
    fn open(&self) -> Result<Box<dyn ActiveSource>, CaptureError>;
}

/// An acquired (but not yet streaming) capture device.
pub trait ActiveSource: Send {
    /// Native sample rate of the device in Hz.
    fn sample_rate(&self) -> u32;

    /// Number of interleaved channels the device delivers.
    fn channels(&self) -> u16;

    /// Stream samples from the device until `stop` is set.
    ///
    /// Blocks the calling thread; run it via `tokio::task::spawn_blocking`.
    /// The device is released before this method returns, on success and on
    /// error alike.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// when the platform rejects the stream configuration.
    fn record(self: Box<Self>, stop: Arc<AtomicBool>) -> Result<Clip, CaptureError>;
}

// ---------------------------------------------------------------------------
// MicSource
// ---------------------------------------------------------------------------

/// cpal-backed [`SampleSource`] using the default host.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::atomic::AtomicBool;
/// use std::sync::Arc;
/// use voice_sample::audio::{ActiveSource, MicSource, SampleSource};
///
/// let source = MicSource::default_device();
/// let active = source.open().unwrap();
/// let stop = Arc::new(AtomicBool::new(false));
/// // Raise `stop` from another thread (or a timer) to end the recording.
/// let clip = active.record(stop).unwrap();
/// println!("captured {} samples @ {} Hz", clip.samples.len(), clip.sample_rate);
/// ```
pub struct MicSource {
    /// Input device name — `None` means the system default.
    device_name: Option<String>,
}

impl MicSource {
    /// Use the system default input device.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// Use the input device with the given name, as reported by cpal.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn find_device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();

        match &self.device_name {
            None => host.default_input_device().ok_or(CaptureError::NoDevice),
            Some(name) => {
                for device in host.input_devices()? {
                    if device.name().map(|n| &n == name).unwrap_or(false) {
                        return Ok(device);
                    }
                }
                Err(CaptureError::DeviceNotFound(name.clone()))
            }
        }
    }
}

impl SampleSource for MicSource {
    fn open(&self) -> Result<Box<dyn ActiveSource>, CaptureError> {
        let device = self.find_device()?;
        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        log::debug!(
            "opened input device ({} Hz, {} ch): {}",
            sample_rate,
            channels,
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );

        Ok(Box::new(MicActive {
            device,
            config,
            sample_rate,
            channels,
        }))
    }
}

// ---------------------------------------------------------------------------
// MicActive
// ---------------------------------------------------------------------------

/// An acquired cpal input device, ready to stream.
struct MicActive {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl MicActive {
    /// Poll interval for the stop flag while the stream is running.
    const POLL_INTERVAL: Duration = Duration::from_millis(50);
}

impl ActiveSource for MicActive {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn record(self: Box<Self>, stop: Arc<AtomicBool>) -> Result<Clip, CaptureError> {
        let (tx, rx) = mpsc::channel::<AudioChunk>();

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            match rx.recv_timeout(Self::POLL_INTERVAL) {
                Ok(chunk) => samples.extend_from_slice(&chunk.samples),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            if stop.load(Ordering::Acquire) {
                break;
            }
        }

        // Release the hardware before draining the tail so the device handle
        // is never held past the stop request.
        drop(stream);
        while let Ok(chunk) = rx.try_recv() {
            samples.extend_from_slice(&chunk.samples);
        }

        Ok(Clip {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}

// ---------------------------------------------------------------------------
// MockSource  (test-only)
// ---------------------------------------------------------------------------

/// Canned-clip [`SampleSource`] for session tests — no hardware required.
///
/// `MockSource::ok(clip)` yields `clip` once the stop flag is raised;
/// `MockSource::unavailable()` fails at `open()` like a missing microphone.
#[cfg(test)]
pub struct MockSource {
    clip: Option<Clip>,
}

#[cfg(test)]
impl MockSource {
    pub fn ok(clip: Clip) -> Self {
        Self { clip: Some(clip) }
    }

    pub fn unavailable() -> Self {
        Self { clip: None }
    }
}

#[cfg(test)]
impl SampleSource for MockSource {
    fn open(&self) -> Result<Box<dyn ActiveSource>, CaptureError> {
        match &self.clip {
            Some(clip) => Ok(Box::new(MockActive { clip: clip.clone() })),
            None => Err(CaptureError::NoDevice),
        }
    }
}

#[cfg(test)]
struct MockActive {
    clip: Clip,
}

#[cfg(test)]
impl ActiveSource for MockActive {
    fn sample_rate(&self) -> u32 {
        self.clip.sample_rate
    }

    fn channels(&self) -> u16 {
        self.clip.channels
    }

    fn record(self: Box<Self>, stop: Arc<AtomicBool>) -> Result<Clip, CaptureError> {
        while !stop.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(self.clip)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
