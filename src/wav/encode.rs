//! Mono 16-bit PCM WAV container encoding.
//!
//! Produces the exact byte layout the verification endpoint expects: a 44-byte
//! RIFF/WAVE header followed by little-endian 16-bit signed samples, then
//! base64 for embedding in a JSON request body.
//!
//! | Offset | Field         | Value                    |
//! |--------|---------------|--------------------------|
//! | 0      | ChunkID       | `"RIFF"`                 |
//! | 4      | ChunkSize     | 36 + data bytes          |
//! | 8      | Format        | `"WAVE"`                 |
//! | 12     | Subchunk1ID   | `"fmt "`                 |
//! | 16     | Subchunk1Size | 16                       |
//! | 20     | AudioFormat   | 1 (PCM)                  |
//! | 22     | NumChannels   | 1                        |
//! | 24     | SampleRate    | source rate              |
//! | 28     | ByteRate      | rate × 2                 |
//! | 32     | BlockAlign    | 2                        |
//! | 34     | BitsPerSample | 16                       |
//! | 36     | Subchunk2ID   | `"data"`                 |
//! | 40     | Subchunk2Size | sample count × 2         |
//! | 44..   | sample data   | 16-bit signed, LE        |

use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::audio::MonoClip;

/// Size of the RIFF/WAVE header in bytes.
pub const WAV_HEADER_LEN: usize = 44;

// ---------------------------------------------------------------------------
// quantize
// ---------------------------------------------------------------------------

/// Quantize a float sample to a 16-bit signed integer.
///
/// The input is clamped to `[-1.0, 1.0]` first, so out-of-range values can
/// never wrap.  Scaling is asymmetric — ×32767 for non-negative samples and
/// ×32768 for negative ones — which is the standard 16-bit PCM mapping.
/// A symmetric scale would introduce a small DC/amplitude bias.
///
/// # Example
///
/// ```rust
/// use voice_sample::wav::quantize;
///
/// assert_eq!(quantize(1.0), 32767);
/// assert_eq!(quantize(-1.0), -32768);
/// assert_eq!(quantize(0.0), 0);
/// assert_eq!(quantize(2.0), 32767);   // clamped, not wrapped
/// assert_eq!(quantize(-2.0), -32768); // clamped, not wrapped
/// ```
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

// ---------------------------------------------------------------------------
// WAV assembly
// ---------------------------------------------------------------------------

/// Write `clip` as a complete mono 16-bit PCM WAV stream.
///
/// # Errors
///
/// Propagates I/O errors from `w`; writing to an in-memory buffer cannot fail.
pub fn write_wav<W: io::Write>(clip: &MonoClip, w: &mut W) -> io::Result<()> {
    let data_bytes = (clip.samples.len() * 2) as u32;

    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(36 + data_bytes)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_u32::<LittleEndian>(16)?; // PCM fmt chunk size
    w.write_u16::<LittleEndian>(1)?; // AudioFormat = PCM
    w.write_u16::<LittleEndian>(1)?; // NumChannels = mono
    w.write_u32::<LittleEndian>(clip.sample_rate)?;
    w.write_u32::<LittleEndian>(clip.sample_rate * 2)?; // ByteRate
    w.write_u16::<LittleEndian>(2)?; // BlockAlign
    w.write_u16::<LittleEndian>(16)?; // BitsPerSample

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_bytes)?;

    for &sample in &clip.samples {
        w.write_i16::<LittleEndian>(quantize(sample))?;
    }

    Ok(())
}

/// Encode `clip` as a mono 16-bit PCM WAV byte buffer.
///
/// The result is always exactly `44 + 2 × sample count` bytes.
pub fn encode_wav(clip: &MonoClip) -> Vec<u8> {
    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + clip.samples.len() * 2);
    write_wav(clip, &mut buf).expect("writing to a Vec<u8> cannot fail");
    buf
}

// ---------------------------------------------------------------------------
// EncodedSample
// ---------------------------------------------------------------------------

/// A finished voice sample, ready for transmission.
///
/// `base64` is the complete WAV file encoded with the standard alphabet; the
/// remaining fields describe the payload so callers can log or display it
/// without decoding.
#[derive(Debug, Clone)]
pub struct EncodedSample {
    /// Base64 (standard alphabet, padded) of the WAV bytes.
    pub base64: String,
    /// Sample rate of the encoded audio in Hz.
    pub sample_rate: u32,
    /// Number of mono samples in the data section.
    pub sample_count: usize,
}

impl EncodedSample {
    /// Duration of the encoded audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f32 / self.sample_rate as f32
    }
}

/// Encode `clip` as a WAV file and base64-encode the result.
pub fn encode_wav_base64(clip: &MonoClip) -> EncodedSample {
    let bytes = encode_wav(clip);
    EncodedSample {
        base64: BASE64.encode(&bytes),
        sample_rate: clip.sample_rate,
        sample_count: clip.samples.len(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
