//! Channel downmixing.
//!
//! The verification endpoint expects **mono** audio, while capture devices
//! commonly deliver 2 (or more) interleaved channels.  [`downmix_to_mono`]
//! averages each frame across all channels so a stereo pair of `+1.0` and
//! `-1.0` cancels to silence rather than clipping.

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec` with no
///   averaging (fast path — avoids the per-frame division when already mono).
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use voice_sample::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// // first frame: (0.5 + -0.5) / 2 = 0.0
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// // second frame: (0.2 + -0.2) / 2 = 0.0
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_mono_is_passthrough() {
        let input = vec![0.1_f32, 0.2, 0.3];
        let out = downmix_to_mono(&input, 1);
        assert_eq!(out, input);
    }

    #[test]
    fn two_channel_average() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = downmix_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6); // (1.0 + -1.0) / 2
        assert!((out[1] - 0.5).abs() < 1e-6); // (0.5 + 0.5) / 2
    }

    #[test]
    fn four_channel_average() {
        // 4 interleaved channels: frame [0.4, 0.4, 0.4, 0.4] → 0.4
        let input = vec![0.4_f32; 4];
        let out = downmix_to_mono(&input, 4);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn zero_channels_yields_empty() {
        let out = downmix_to_mono(&[1.0_f32, 2.0], 0);
        assert!(out.is_empty());
    }

    #[test]
    fn opposite_stereo_channels_cancel() {
        // channel A all +1, channel B all -1 → mono is all 0.0
        let mut input = Vec::new();
        for _ in 0..10 {
            input.push(1.0_f32);
            input.push(-1.0_f32);
        }
        let out = downmix_to_mono(&input, 2);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|&s| s.abs() < 1e-6));
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        // 5 samples at 2 channels → 2 full frames, last sample ignored
        let input = vec![0.2_f32, 0.4, 0.6, 0.8, 1.0];
        let out = downmix_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
    }
}
