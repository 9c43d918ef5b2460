//! Fully loaded sample buffers that channels play from.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::constants::MAX_VOLUME;

use super::samples::encode_samples;
use super::AudioFormat;

/// Sample data already converted to the mixer output format.
///
/// Chunks are shared with [`std::sync::Arc`]: a channel holds a reference
/// while playing, the loader keeps its own and decides when to release it.
/// Use [`crate::mixer::Mixer::halt_chunk`] before dropping the last caller
/// reference if the chunk may still be playing.
#[derive(Debug)]
pub struct Chunk {
    data: Vec<u8>,
    volume: AtomicI32,
}

impl Chunk {
    /// Wrap raw bytes that are already in the output format.
    pub fn from_raw(data: Vec<u8>) -> Self {
        Self {
            data,
            volume: AtomicI32::new(MAX_VOLUME),
        }
    }

    /// Encode normalized interleaved samples into `format`.
    pub fn from_f32_samples(samples: &[f32], format: &AudioFormat) -> Self {
        let mut data = vec![0u8; samples.len() * format.sample_format.bytes_per_sample()];
        encode_samples(samples, format.sample_format, &mut data);
        Self::from_raw(data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Playable length once any trailing partial frame is dropped.
    pub fn aligned_len(&self, format: &AudioFormat) -> usize {
        format.align(self.data.len())
    }

    pub fn volume(&self) -> i32 {
        self.volume.load(Ordering::Relaxed)
    }

    /// Set the chunk volume, clamped to `[0, MAX_VOLUME]`, returning the old one.
    pub fn set_volume(&self, volume: i32) -> i32 {
        self.volume
            .swap(volume.clamp(0, MAX_VOLUME), Ordering::Relaxed)
    }
}
