//! Conversion between output-format bytes and normalized `f32` samples.

use super::SampleFormat;

/// Decode one sample from the start of `bytes`.
#[inline]
pub fn read_sample(format: SampleFormat, bytes: &[u8]) -> f32 {
    match format {
        SampleFormat::U8 => (bytes[0] as f32 - 128.0) / 128.0,
        SampleFormat::S16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32_768.0,
        SampleFormat::S32 => {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32 / 2f32.powi(31)
        }
        SampleFormat::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Encode `value` into the start of `bytes`, saturating at the format limits.
#[inline]
pub fn write_sample(format: SampleFormat, value: f32, bytes: &mut [u8]) {
    let value = if value.is_nan() { 0.0 } else { value };
    match format {
        SampleFormat::U8 => {
            bytes[0] = (value * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 => {
            let sample = (value * 32_768.0).round().clamp(-32_768.0, 32_767.0) as i16;
            bytes[..2].copy_from_slice(&sample.to_le_bytes());
        }
        SampleFormat::S32 => {
            let scaled = (value as f64 * 2f64.powi(31)).round();
            let sample = scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
            bytes[..4].copy_from_slice(&sample.to_le_bytes());
        }
        SampleFormat::F32 => {
            bytes[..4].copy_from_slice(&value.to_le_bytes());
        }
    }
}

/// Decode every whole sample in `bytes` into `out`, replacing its contents.
pub fn decode_samples_into(bytes: &[u8], format: SampleFormat, out: &mut Vec<f32>) {
    let width = format.bytes_per_sample();
    out.clear();
    out.extend(bytes.chunks_exact(width).map(|raw| read_sample(format, raw)));
}

/// Decode every whole sample in `bytes`.
pub fn decode_samples(bytes: &[u8], format: SampleFormat) -> Vec<f32> {
    let mut out = Vec::with_capacity(bytes.len() / format.bytes_per_sample());
    decode_samples_into(bytes, format, &mut out);
    out
}

/// Encode `samples` into `out`. Extra samples or trailing bytes are ignored.
pub fn encode_samples(samples: &[f32], format: SampleFormat, out: &mut [u8]) {
    let width = format.bytes_per_sample();
    for (raw, &sample) in out.chunks_exact_mut(width).zip(samples) {
        write_sample(format, sample, raw);
    }
}
