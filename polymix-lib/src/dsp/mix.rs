//! Blend primitive used to add one buffer into another at a gain.

use crate::audio::samples::{read_sample, write_sample};
use crate::audio::{AudioFormat, SampleFormat};

/// Add `src × gain` into `dst`, saturating at the limits of `format`.
///
/// Only the common prefix of whole samples is touched. A gain of zero leaves
/// `dst` unchanged.
pub fn mix_audio(dst: &mut [u8], src: &[u8], format: &AudioFormat, gain: f32) {
    if gain <= 0.0 {
        return;
    }
    let len = dst.len().min(src.len());
    let (dst, src) = (&mut dst[..len], &src[..len]);
    match format.sample_format {
        SampleFormat::U8 => {
            for (out, &input) in dst.iter_mut().zip(src) {
                let mixed = (*out as i32 - 128) + ((input as i32 - 128) as f32 * gain) as i32;
                *out = (mixed.clamp(-128, 127) + 128) as u8;
            }
        }
        SampleFormat::S16 => {
            for (out, input) in dst.chunks_exact_mut(2).zip(src.chunks_exact(2)) {
                let current = i16::from_le_bytes([out[0], out[1]]) as i32;
                let added = (i16::from_le_bytes([input[0], input[1]]) as f32 * gain) as i32;
                let mixed = (current + added).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
                out.copy_from_slice(&mixed.to_le_bytes());
            }
        }
        SampleFormat::S32 => {
            for (out, input) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let current = i32::from_le_bytes([out[0], out[1], out[2], out[3]]) as i64;
                let added =
                    (i32::from_le_bytes([input[0], input[1], input[2], input[3]]) as f64
                        * gain as f64) as i64;
                let mixed = (current + added).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                out.copy_from_slice(&mixed.to_le_bytes());
            }
        }
        SampleFormat::F32 => {
            for (out, input) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let mixed = read_sample(SampleFormat::F32, out)
                    + read_sample(SampleFormat::F32, input) * gain;
                write_sample(SampleFormat::F32, mixed.clamp(-1.0, 1.0), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s16_bytes(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn s16_values(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn s16_mix_adds_and_saturates() {
        let format = AudioFormat::new(48_000, 1, SampleFormat::S16);
        let mut dst = s16_bytes(&[100, 30_000, -30_000]);
        let src = s16_bytes(&[50, 10_000, -10_000]);
        mix_audio(&mut dst, &src, &format, 1.0);
        assert_eq!(s16_values(&dst), vec![150, i16::MAX, i16::MIN]);
    }

    #[test]
    fn s16_mix_applies_gain() {
        let format = AudioFormat::new(48_000, 1, SampleFormat::S16);
        let mut dst = s16_bytes(&[0, 0]);
        let src = s16_bytes(&[1000, -1000]);
        mix_audio(&mut dst, &src, &format, 0.5);
        assert_eq!(s16_values(&dst), vec![500, -500]);
    }

    #[test]
    fn zero_gain_is_noop() {
        let format = AudioFormat::new(48_000, 1, SampleFormat::S16);
        let mut dst = s16_bytes(&[7]);
        mix_audio(&mut dst, &s16_bytes(&[1000]), &format, 0.0);
        assert_eq!(s16_values(&dst), vec![7]);
    }

    #[test]
    fn s32_mix_adds_and_saturates() {
        let format = AudioFormat::new(48_000, 1, SampleFormat::S32);
        let values = [100, i32::MAX - 10, i32::MIN + 10];
        let mut dst: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let src: Vec<u8> = [50i32, 100, -100]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        mix_audio(&mut dst, &src, &format, 1.0);
        let mixed: Vec<i32> = dst
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(mixed, vec![150, i32::MAX, i32::MIN]);
    }

    #[test]
    fn f32_mix_adds_and_clamps() {
        let format = AudioFormat::new(48_000, 1, SampleFormat::F32);
        let mut dst: Vec<u8> = [0.25f32, 0.875, -0.875]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let src: Vec<u8> = [1.0f32, 0.5, -0.5]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        mix_audio(&mut dst, &src, &format, 0.5);
        let mixed: Vec<f32> = dst
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(mixed, vec![0.75, 1.0, -1.0]);
    }

    #[test]
    fn u8_mix_is_centered() {
        let format = AudioFormat::new(8_000, 1, SampleFormat::U8);
        let mut dst = vec![0x80, 0x80];
        mix_audio(&mut dst, &[0x90, 0x70], &format, 1.0);
        assert_eq!(dst, vec![0x90, 0x70]);
    }
}
