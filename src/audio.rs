//! PCM16 encoding and millisecond/sample-index conversion for input audio.
//!
//! Mirrors `float_to_16bit_pcm`/`base64_to_array_buffer`/`array_buffer_to_base64`
//! from the original realtime assistant: float32 samples in `[-1, 1]` are
//! clipped and scaled to signed 16-bit PCM, little-endian, then base64-encoded
//! for the wire.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::RealtimeError;

/// Clips `samples` to `[-1.0, 1.0]` and scales to PCM16, matching
/// `float_to_16bit_pcm`'s `np.clip(..., -1, 1) * 32767` exactly.
pub fn float32_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

/// Encodes PCM16 samples as little-endian bytes, base64'd for the wire.
pub fn pcm16_to_base64(samples: &[i16]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Convenience composition of [`float32_to_pcm16`] and [`pcm16_to_base64`].
pub fn float32_to_base64(samples: &[f32]) -> String {
    pcm16_to_base64(&float32_to_pcm16(samples))
}

/// Decodes a base64 wire payload into little-endian PCM16 samples.
pub fn base64_to_pcm16(base64_str: &str) -> Result<Vec<i16>, RealtimeError> {
    let bytes = STANDARD
        .decode(base64_str)
        .map_err(|e| RealtimeError::Protocol(format!("invalid base64 audio: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(RealtimeError::Protocol(
            "audio byte buffer has odd length for pcm16".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// Decodes a base64 wire payload into its raw bytes, without interpreting it
/// as PCM16. Used when appending a server's `audio` delta straight onto an
/// item's `formatted.audio` byte buffer.
pub fn base64_to_bytes(base64_str: &str) -> Result<Vec<u8>, RealtimeError> {
    STANDARD
        .decode(base64_str)
        .map_err(|e| RealtimeError::Protocol(format!("invalid base64 audio: {e}")))
}

/// Converts a millisecond offset into an absolute sample index at `sample_rate`,
/// using integer floor division as the wire protocol's truncate semantics do.
pub fn ms_to_sample_index(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}

/// Converts a sample count at `sample_rate` back to milliseconds, floored.
pub fn sample_index_to_ms(sample_index: usize, sample_rate: u32) -> u32 {
    (sample_index as u64 * 1000 / sample_rate as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float32_round_trips_through_pcm16_and_base64() {
        let samples = [0.0_f32, 0.5, -0.5, 1.0, -1.0];
        let encoded = float32_to_base64(&samples);
        let decoded = base64_to_pcm16(&encoded).unwrap();
        let expected = float32_to_pcm16(&samples);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn clips_out_of_range_samples() {
        let samples = [2.0_f32, -2.0];
        let pcm = float32_to_pcm16(&samples);
        assert_eq!(pcm, vec![32767, -32767]);
    }

    #[test]
    fn ms_and_sample_index_are_inverse_at_round_boundaries() {
        let sample_rate = 24000;
        assert_eq!(ms_to_sample_index(0, sample_rate), 0);
        assert_eq!(ms_to_sample_index(1000, sample_rate), 24000);
        assert_eq!(sample_index_to_ms(24000, sample_rate), 1000);
    }

    #[test]
    fn rejects_odd_length_audio_buffers() {
        let encoded = STANDARD.encode([1u8, 2, 3]);
        assert!(base64_to_pcm16(&encoded).is_err());
    }
}
