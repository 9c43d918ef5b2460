//! `polymix render`: mix offline against a manual clock.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::info;
use polymix_lib::audio::Chunk;
use polymix_lib::mixer::{ManualClock, Mixer};

use crate::{convert, loader};

const TONE_MS: u64 = 1000;

pub fn run(args: &ArgMatches) -> Result<i32> {
    let settings = super::load_settings(args)?;
    let format = settings.format();
    let clock = Arc::new(ManualClock::new());
    let mixer = Mixer::new(&settings, clock.clone())?;
    super::register_post_effects(&mixer, super::load_effects(args)?)?;

    let mut chunks = Vec::new();
    if let Some(tones) = args.get_many::<f32>("tone") {
        for hz in tones {
            let samples = convert::tone(*hz, TONE_MS, &format);
            chunks.push(Arc::new(Chunk::from_f32_samples(&samples, &format)));
        }
    }
    if let Some(files) = args.get_many::<String>("file") {
        for path in files {
            chunks.push(loader::load_chunk(Path::new(path), &format)?);
        }
    }
    if chunks.is_empty() {
        bail!("nothing to render, pass --tone or --file");
    }

    let loops = args.get_one::<i32>("loops").copied().unwrap_or(0);
    let fade_in = args.get_one::<u64>("fade-in").copied();
    for chunk in &chunks {
        super::start_chunk(&mixer, chunk, loops, fade_in, None)?;
    }

    let ms = args.get_one::<u64>("ms").copied().unwrap_or(TONE_MS);
    let total = format.bytes_in_ms(ms);
    let out_path = args
        .get_one::<String>("out")
        .context("missing --out")?;
    let file = File::create(out_path).with_context(|| format!("cannot create {}", out_path))?;
    let mut out = BufWriter::new(file);

    let mut period = vec![0u8; settings.period_bytes()];
    let frame_width = format.frame_width() as u64;
    let mut written = 0usize;
    while written < total {
        let frames = written as u64 / frame_width;
        clock.set(frames * 1000 / format.sample_rate as u64);
        mixer.mix_period(&mut period);
        let len = period.len().min(total - written);
        out.write_all(&period[..len])?;
        written += len;
    }
    out.flush()?;
    mixer.close();

    info!(
        "rendered {} ms ({} bytes) from {} source(s) to {}",
        ms,
        written,
        chunks.len(),
        out_path
    );
    Ok(0)
}
