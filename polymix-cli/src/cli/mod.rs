//! Subcommands and the setup they share.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{debug, info};
use polymix_lib::audio::Chunk;
use polymix_lib::dsp::effects::{effects_from_json, AudioEffect};
use polymix_lib::mixer::{EffectScope, Mixer, MixerSettings};
use polymix_lib::MixerError;

pub mod args;
pub mod create;
pub mod render;

/// Settings from `--settings`, or the defaults.
pub fn load_settings(args: &ArgMatches) -> Result<MixerSettings> {
    match args.get_one::<String>("settings") {
        Some(path) => MixerSettings::from_json_file(path)
            .with_context(|| format!("failed to load settings from {}", path)),
        None => Ok(MixerSettings::default()),
    }
}

/// Effects from `--effects-json`, or none.
pub fn load_effects(args: &ArgMatches) -> Result<Vec<AudioEffect>> {
    let Some(path) = args.get_one::<String>("effects-json") else {
        return Ok(Vec::new());
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let effects =
        effects_from_json(&json).with_context(|| format!("failed to parse {}", path))?;
    info!("loaded {} effect(s) from {}", effects.len(), path);
    Ok(effects)
}

/// Append `effects` to the post-mix chain in order.
pub fn register_post_effects(mixer: &Mixer, effects: Vec<AudioEffect>) -> Result<()> {
    let format = mixer.format();
    for effect in effects {
        mixer.register_effect(EffectScope::PostMix, effect.into_effect(format), None)?;
    }
    Ok(())
}

/// Start `chunk` on a free channel, growing the store by one when every
/// channel is busy.
pub fn start_chunk(
    mixer: &Mixer,
    chunk: &Arc<Chunk>,
    loops: i32,
    fade_in_ms: Option<u64>,
    limit_ms: Option<u64>,
) -> Result<usize> {
    let start = |mixer: &Mixer| match fade_in_ms {
        Some(ms) => mixer.fade_in_channel_timed(None, chunk, loops, ms, limit_ms),
        None => mixer.play_channel_timed(None, chunk, loops, limit_ms),
    };
    let which = match start(mixer) {
        Err(MixerError::NoFreeChannel) => {
            let count = mixer.num_channels() + 1;
            mixer.resize(count)?;
            debug!("grew mixer to {} channels", count);
            start(mixer)?
        }
        result => result?,
    };
    Ok(which)
}
