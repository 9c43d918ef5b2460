//! Ready-made effects that can be attached to any channel or to the post-mix.
//!
//! Effects are described by the serializable [`AudioEffect`] enum and turned
//! into chain callbacks with [`AudioEffect::into_effect`].

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::audio::samples::{decode_samples_into, encode_samples};
use crate::audio::AudioFormat;
use crate::mixer::{EffectFn, EffectScope};

pub mod gain;
mod level;
pub mod panning;
pub mod reverse_stereo;

pub use gain::GainEffect;
pub use panning::PanningEffect;
pub use reverse_stereo::ReverseStereoEffect;

/// Configured effect that processes interleaved normalized samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AudioEffect {
    #[serde(rename = "GainSettings")]
    Gain(GainEffect),
    #[serde(rename = "PanningSettings")]
    Panning(PanningEffect),
    #[serde(rename = "ReverseStereoSettings")]
    ReverseStereo(ReverseStereoEffect),
}

impl AudioEffect {
    /// Process interleaved samples in place.
    pub fn process(&self, samples: &mut [f32], channels: usize) {
        match self {
            AudioEffect::Gain(effect) => effect.process(samples, channels),
            AudioEffect::Panning(effect) => effect.process(samples, channels),
            AudioEffect::ReverseStereo(effect) => effect.process(samples, channels),
        }
    }

    /// Build a chain callback that runs this effect on buffers in `format`.
    pub fn into_effect(self, format: AudioFormat) -> EffectFn {
        let scratch = Mutex::new(Vec::<f32>::new());
        let channels = format.channels as usize;
        Arc::new(move |_scope: EffectScope, buf: &mut [u8]| {
            let mut samples = scratch.lock().unwrap_or_else(PoisonError::into_inner);
            decode_samples_into(buf, format.sample_format, &mut samples);
            self.process(&mut samples, channels);
            encode_samples(&samples, format.sample_format, buf);
        })
    }

    /// One default instance of every effect, for emitting template payloads.
    pub fn defaults() -> Vec<AudioEffect> {
        vec![
            AudioEffect::Gain(GainEffect::default()),
            AudioEffect::Panning(PanningEffect::default()),
            AudioEffect::ReverseStereo(ReverseStereoEffect::default()),
        ]
    }
}

/// Parse a JSON `Vec<AudioEffect>` payload.
pub fn effects_from_json(json: &str) -> crate::Result<Vec<AudioEffect>> {
    serde_json::from_str(json).map_err(|err| crate::MixerError::Settings(err.to_string()))
}
