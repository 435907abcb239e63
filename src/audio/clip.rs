//! Captured-clip data model.
//!
//! [`Clip`] is the raw result of a finished recording: interleaved `f32`
//! samples at the device's native rate and channel count.  [`Clip::into_mono`]
//! validates the clip and downmixes it into a [`MonoClip`], the buffer the
//! WAV encoder consumes.

use thiserror::Error;

use super::downmix::downmix_to_mono;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Reason a captured clip could not be turned into a mono buffer.
///
/// Not retried automatically — the caller decides whether to record again.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The recording produced no samples (device delivered nothing before the
    /// capture was stopped).
    #[error("captured clip is empty")]
    Empty,

    /// The clip reports zero channels, so no frames can be formed.
    #[error("captured clip has zero channels")]
    NoChannels,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A finished recording in the device's native format.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`, exactly as accumulated from
/// the capture callback.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 44100, 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

impl Clip {
    /// Validate and downmix this clip into a [`MonoClip`].
    ///
    /// # Errors
    ///
    /// [`DecodeError::Empty`] when no samples were captured,
    /// [`DecodeError::NoChannels`] when `channels == 0`.
    pub fn into_mono(self) -> Result<MonoClip, DecodeError> {
        if self.samples.is_empty() {
            return Err(DecodeError::Empty);
        }
        if self.channels == 0 {
            return Err(DecodeError::NoChannels);
        }

        let samples = downmix_to_mono(&self.samples, self.channels);

        Ok(MonoClip {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

// ---------------------------------------------------------------------------
// MonoClip
// ---------------------------------------------------------------------------

/// A mono `f32` buffer ready for quantization and WAV encoding.
#[derive(Debug, Clone)]
pub struct MonoClip {
    /// Mono PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz, unchanged from the capture device.
    pub sample_rate: u32,
}

impl MonoClip {
    /// Duration of the clip in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_clip_passes_through() {
        let clip = Clip {
            samples: vec![0.1_f32, 0.2, 0.3],
            sample_rate: 48_000,
            channels: 1,
        };
        let mono = clip.into_mono().unwrap();
        assert_eq!(mono.samples, vec![0.1, 0.2, 0.3]);
        assert_eq!(mono.sample_rate, 48_000);
    }

    #[test]
    fn stereo_clip_is_downmixed() {
        let clip = Clip {
            samples: vec![1.0_f32, 0.0, 0.0, 1.0],
            sample_rate: 44_100,
            channels: 2,
        };
        let mono = clip.into_mono().unwrap();
        assert_eq!(mono.samples.len(), 2);
        assert!((mono.samples[0] - 0.5).abs() < 1e-6);
        assert!((mono.samples[1] - 0.5).abs() < 1e-6);
        // Rate must be preserved, not resampled.
        assert_eq!(mono.sample_rate, 44_100);
    }

    #[test]
    fn empty_clip_is_rejected() {
        let clip = Clip {
            samples: Vec::new(),
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(clip.into_mono().unwrap_err(), DecodeError::Empty);
    }

    #[test]
    fn zero_channel_clip_is_rejected() {
        let clip = Clip {
            samples: vec![0.5_f32; 8],
            sample_rate: 48_000,
            channels: 0,
        };
        assert_eq!(clip.into_mono().unwrap_err(), DecodeError::NoChannels);
    }

    #[test]
    fn duration_secs_calculation() {
        let mono = MonoClip {
            samples: vec![0.0_f32; 24_000],
            sample_rate: 48_000,
        };
        assert!((mono.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn duration_secs_zero_rate_is_zero() {
        let mono = MonoClip {
            samples: vec![0.0_f32; 100],
            sample_rate: 0,
        };
        assert!((mono.duration_secs() - 0.0).abs() < f32::EPSILON);
    }
}
