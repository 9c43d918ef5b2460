//! Sample-level DSP: the blend primitive and ready-made effects.

pub mod effects;
pub mod mix;
