//! rodio source that renders the mixer one period at a time.

use std::time::Duration;

use rodio::source::SeekError;
use rodio::Source;

use crate::audio::samples::decode_samples_into;
use crate::mixer::Mixer;

/// Pulls `period_frames` frames from the mixer whenever its buffer runs dry.
///
/// The source ends once the mixer has been closed.
pub struct MixerSource {
    mixer: Mixer,
    period: Vec<u8>,
    samples: Vec<f32>,
    cursor: usize,
}

impl MixerSource {
    pub fn new(mixer: Mixer, period_frames: usize) -> Self {
        let period_bytes = period_frames.max(1) * mixer.format().frame_width();
        Self {
            mixer,
            period: vec![0; period_bytes],
            samples: Vec::with_capacity(period_bytes),
            cursor: 0,
        }
    }

    fn refill(&mut self) -> bool {
        if !self.mixer.is_open() {
            return false;
        }
        self.mixer.mix_period(&mut self.period);
        decode_samples_into(
            &self.period,
            self.mixer.format().sample_format,
            &mut self.samples,
        );
        self.cursor = 0;
        !self.samples.is_empty()
    }
}

impl Iterator for MixerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor >= self.samples.len() && !self.refill() {
            return None;
        }
        let sample = self.samples[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for MixerSource {
    fn current_span_len(&self) -> Option<usize> {
        Some(self.samples.len().saturating_sub(self.cursor).max(1))
    }

    fn channels(&self) -> u16 {
        self.mixer.format().channels
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.format().sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    fn try_seek(&mut self, _pos: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: "MixerSource",
        })
    }
}
