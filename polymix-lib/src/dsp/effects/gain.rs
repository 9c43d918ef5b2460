//! Simple gain effect.

use serde::{Deserialize, Serialize};

use super::level::deserialize_linear_gain;

const DEFAULT_GAIN: f32 = 1.0;

/// Serialized configuration for the gain effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GainEffect {
    pub enabled: bool,
    #[serde(deserialize_with = "deserialize_linear_gain")]
    pub gain: f32,
}

impl Default for GainEffect {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: DEFAULT_GAIN,
        }
    }
}

impl GainEffect {
    pub fn new(gain: f32) -> Self {
        Self {
            enabled: true,
            gain,
        }
    }

    /// Scale interleaved samples in place.
    pub fn process(&self, samples: &mut [f32], _channels: usize) {
        if !self.enabled {
            return;
        }
        let gain = sanitize_gain(self.gain);
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

fn sanitize_gain(gain: f32) -> f32 {
    if gain.is_finite() {
        gain.max(0.0)
    } else {
        DEFAULT_GAIN
    }
}
