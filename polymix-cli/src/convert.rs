//! Conversion of decoded audio into the mixer's output layout.

use std::f32::consts::PI;

use anyhow::Result;
use polymix_lib::audio::AudioFormat;
use rubato::{FftFixedInOut, Resampler};

/// Input frames per resampler block.
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Up- or down-mix interleaved samples from `from` to `to` channels.
///
/// Mono is copied to every output channel; anything going down to mono is
/// averaged. Other layouts keep the shared channels and zero-fill or drop the
/// rest.
pub fn remix_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            out.extend((0..to).map(|channel| frame.get(channel).copied().unwrap_or(0.0)));
        }
    }
    out
}

/// Resample interleaved samples between rates with an FFT resampler.
///
/// The output is trimmed by the resampler delay and holds exactly
/// `frames × to_rate / from_rate` frames.
pub fn resample(
    samples: &[f32],
    channels: usize,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>> {
    if from_rate == to_rate || channels == 0 || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let in_frames = samples.len() / channels;
    let out_frames = (in_frames as u64 * to_rate as u64 / from_rate as u64) as usize;

    let mut resampler = FftFixedInOut::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK_FRAMES,
        channels,
    )?;
    let delay = resampler.output_delay();
    let chunk_frames = resampler.input_frames_next();

    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|channel| samples.iter().skip(channel).step_by(channels).copied().collect())
        .collect();
    let mut input_buf = vec![vec![0.0f32; chunk_frames]; channels];
    let mut output_buf = vec![vec![0.0f32; resampler.output_frames_max()]; channels];
    let mut resampled = vec![Vec::with_capacity(out_frames + delay); channels];

    let mut position = 0;
    while resampled[0].len() < out_frames + delay {
        let end = (position + chunk_frames).min(in_frames);
        for (input, source) in input_buf.iter_mut().zip(&planar) {
            input.fill(0.0);
            if position < end {
                input[..end - position].copy_from_slice(&source[position..end]);
            }
        }
        let (_, written) = resampler.process_into_buffer(&input_buf, &mut output_buf, None)?;
        for (out, produced) in resampled.iter_mut().zip(&output_buf) {
            out.extend_from_slice(&produced[..written]);
        }
        position += chunk_frames;
    }

    let mut out = Vec::with_capacity(out_frames * channels);
    for frame in delay..delay + out_frames {
        out.extend(resampled.iter().map(|channel| channel[frame]));
    }
    Ok(out)
}

/// Bring decoded samples to the channel count and rate of `format`.
pub fn to_output_layout(
    samples: &[f32],
    channels: usize,
    sample_rate: u32,
    format: &AudioFormat,
) -> Result<Vec<f32>> {
    let target_channels = format.channels as usize;
    let remixed = remix_channels(samples, channels, target_channels);
    resample(&remixed, target_channels, sample_rate, format.sample_rate)
}

/// A sine tone at half scale, `ms` long, in the layout of `format`.
pub fn tone(hz: f32, ms: u64, format: &AudioFormat) -> Vec<f32> {
    let channels = format.channels as usize;
    let frames = (format.sample_rate as u64 * ms / 1000) as usize;
    let mut out = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        let value = 0.5 * (2.0 * PI * hz * frame as f32 / format.sample_rate as f32).sin();
        out.extend(std::iter::repeat(value).take(channels));
    }
    out
}
