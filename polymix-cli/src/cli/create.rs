//! `polymix create` payload printers.

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use polymix_lib::dsp::effects::AudioEffect;
use polymix_lib::mixer::MixerSettings;

/// Print the requested default payload as pretty JSON.
pub fn run(args: &ArgMatches) -> Result<i32> {
    let json = match args.subcommand_name() {
        Some("settings-json") => serde_json::to_string_pretty(&MixerSettings::default())?,
        Some("effects-json") => serde_json::to_string_pretty(&AudioEffect::defaults())?,
        other => return Err(anyhow!("unknown payload {:?}", other)),
    };
    println!("{}", json);
    Ok(0)
}
