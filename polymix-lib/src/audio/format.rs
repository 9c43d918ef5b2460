//! Negotiated output format.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Layout of a single sample. All multi-byte formats are little endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    F32,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
        }
    }

    /// Byte value that encodes silence.
    pub fn silence_byte(self) -> u8 {
        match self {
            SampleFormat::U8 => 0x80,
            _ => 0,
        }
    }
}

/// Sample rate, channel count and sample layout of the mixer output.
///
/// Every byte length the engine deals with is a multiple of
/// [`AudioFormat::frame_width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
        }
    }

    /// Bytes in one frame (one sample for every output channel).
    pub fn frame_width(&self) -> usize {
        self.sample_format.bytes_per_sample() * self.channels.max(1) as usize
    }

    pub fn bytes_per_second(&self) -> usize {
        self.frame_width() * self.sample_rate as usize
    }

    /// Frame-aligned byte count for `duration` of audio.
    pub fn bytes_in_duration(&self, duration: Duration) -> usize {
        let frames = (duration.as_nanos() * self.sample_rate as u128 / 1_000_000_000) as usize;
        frames * self.frame_width()
    }

    /// Frame-aligned byte count for `ms` milliseconds of audio.
    pub fn bytes_in_ms(&self, ms: u64) -> usize {
        self.bytes_in_duration(Duration::from_millis(ms))
    }

    /// Playback duration of `bytes` bytes.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((bytes as u128 * 1_000_000_000 / rate as u128) as u64)
    }

    /// Truncate `len` down to a whole number of frames.
    pub fn align(&self, len: usize) -> usize {
        let width = self.frame_width();
        len - len % width
    }
}
