//! WAV container encoding — mono, 16-bit PCM, base64 payload.

pub mod encode;

pub use encode::{encode_wav, encode_wav_base64, quantize, write_wav, EncodedSample, WAV_HEADER_LEN};
