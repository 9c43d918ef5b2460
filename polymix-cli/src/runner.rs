use std::{
    io,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
    thread::sleep,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use polymix_lib::mixer::{ChannelFinishedFn, Engine};
use polymix_lib::playback::{AudioDevice, OutputMeter};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::{cli, controls, loader, logging, ui};

const METER_PERIODS: usize = 8;
const FADE_OUT_MS: u64 = 1000;

pub fn run(args: &ArgMatches, log_buffer: logging::LogBuffer) -> Result<i32> {
    info!("starting polymix");
    match args.subcommand() {
        Some(("play", sub)) => play(sub, log_buffer),
        Some(("render", sub)) => cli::render::run(sub),
        Some(("create", sub)) => cli::create::run(sub),
        Some((name, _)) => Err(anyhow!("unknown command {}", name)),
        None => Ok(-1),
    }
}

fn play(args: &ArgMatches, log_buffer: logging::LogBuffer) -> Result<i32> {
    let mut settings = cli::load_settings(args)?;
    if let Some(volume) = args.get_one::<i32>("volume") {
        settings.master_volume = *volume;
    }
    let format = settings.format();
    let effects = cli::load_effects(args)?;

    let mut chunks = Vec::new();
    for path in args.get_many::<String>("INPUT").into_iter().flatten() {
        chunks.push(loader::load_chunk(Path::new(path), &format)?);
    }

    let loops = args.get_one::<i32>("loops").copied().unwrap_or(0);
    let fade_in = args.get_one::<u64>("fade-in").copied();
    let limit = args.get_one::<u64>("limit").copied();
    let fade_out_after = args
        .get_one::<u64>("fade-out-after")
        .map(|ms| Duration::from_millis(*ms));
    let quiet = args.get_flag("quiet");

    let device = AudioDevice::open(&settings)?;
    let mixer = device.mixer().clone();
    cli::register_post_effects(&mixer, effects)?;

    let meter = Arc::new(Mutex::new(OutputMeter::new(format, METER_PERIODS)));
    mixer.set_post_mix(Some(OutputMeter::hook(meter.clone())));
    let finished: ChannelFinishedFn = Arc::new(|_: &mut Engine, which: usize| {
        info!("channel {} finished", which);
    });
    mixer.set_channel_finished(Some(finished));

    for chunk in &chunks {
        let which = cli::start_chunk(&mixer, chunk, loops, fade_in, limit)?;
        info!("playing on channel {}", which);
    }

    let _raw_mode = if quiet {
        None
    } else {
        RawModeGuard::enable().ok()
    };
    let mut terminal = if !quiet {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    } else {
        None
    };

    let started = Instant::now();
    let mut faded = false;
    while mixer.playing_count() > 0 {
        if let Some(after) = fade_out_after {
            if !faded && started.elapsed() >= after {
                let fades = mixer.fade_out_all(FADE_OUT_MS);
                info!("fading out {} channel(s)", fades);
                faded = true;
            }
        }

        if let Some(term) = terminal.as_mut() {
            let levels = meter
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .levels();
            let status = controls::status_text(controls::StatusArgs {
                channels: controls::channel_rows(&mixer),
                master: mixer.master_volume(),
                levels,
            });
            let log_lines = logging::snapshot(&log_buffer);
            ui::draw_status(term, &status, &log_lines);

            if !controls::handle_key_event(&mixer) {
                break;
            }
        }

        sleep(Duration::from_millis(50));
    }

    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }

    device.close();
    info!("playback finished");
    Ok(0)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
