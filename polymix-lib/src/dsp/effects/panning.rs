//! Stereo panning effect.

use serde::{Deserialize, Serialize};

/// Per-side attenuation for stereo output; 255 leaves a side untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanningEffect {
    pub enabled: bool,
    pub left: u8,
    pub right: u8,
}

impl Default for PanningEffect {
    fn default() -> Self {
        Self {
            enabled: false,
            left: 255,
            right: 255,
        }
    }
}

impl PanningEffect {
    pub fn new(left: u8, right: u8) -> Self {
        Self {
            enabled: true,
            left,
            right,
        }
    }

    /// Attenuate the left and right samples of each stereo frame.
    ///
    /// Mono and multichannel layouts other than stereo pass through.
    pub fn process(&self, samples: &mut [f32], channels: usize) {
        if !self.enabled || channels != 2 {
            return;
        }
        let left = self.left as f32 / 255.0;
        let right = self.right as f32 / 255.0;
        for frame in samples.chunks_exact_mut(2) {
            frame[0] *= left;
            frame[1] *= right;
        }
    }
}
