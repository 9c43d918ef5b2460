use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use polymix_lib::constants::MAX_VOLUME;
use polymix_lib::mixer::{Fading, Mixer};

const VOLUME_STEP: i32 = 8;
const FADE_OUT_MS: u64 = 1000;

pub struct StatusSnapshot {
    pub text: String,
    pub levels: Vec<f32>,
}

/// One row of the channel table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub index: usize,
    pub playing: bool,
    pub paused: bool,
    pub volume: i32,
    pub fading: Fading,
}

pub struct StatusArgs {
    pub channels: Vec<ChannelRow>,
    pub master: i32,
    pub levels: Vec<f32>,
}

/// Read every channel's state under a single engine lock.
pub fn channel_rows(mixer: &Mixer) -> Vec<ChannelRow> {
    let engine = mixer.lock();
    (0..engine.num_channels())
        .map(|index| ChannelRow {
            index,
            playing: engine.playing(index).unwrap_or(false),
            paused: engine.paused(index).unwrap_or(false),
            volume: engine.volume(index).unwrap_or(0),
            fading: engine.fading(index),
        })
        .collect()
}

pub fn status_text(args: StatusArgs) -> StatusSnapshot {
    let active = args.channels.iter().filter(|row| row.playing).count();
    let mut text = format!(
        "Master: {:>3}/{}   Active: {}/{}\n",
        args.master,
        MAX_VOLUME,
        active,
        args.channels.len()
    );
    for row in args.channels.iter().filter(|row| row.playing) {
        let state = if row.paused { "⏸ Paused" } else { "▶ Playing" };
        let fading = match row.fading {
            Fading::Idle => "",
            Fading::In => "  fading in",
            Fading::Out => "  fading out",
        };
        text.push_str(&format!(
            "#{:<2} {}  vol {:>3}{}\n",
            row.index, state, row.volume, fading
        ));
    }

    StatusSnapshot {
        text,
        levels: args.levels,
    }
}

/// Apply one pending key press. Returns `false` when the user quits.
pub fn handle_key_event(mixer: &Mixer) -> bool {
    if event::poll(Duration::from_millis(100)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return true;
            }
            match key.code {
                KeyCode::Char('q') => {
                    mixer.halt_all();
                    return false;
                }
                KeyCode::Char(' ') => {
                    if mixer.paused_count() > 0 {
                        mixer.resume_all();
                    } else {
                        mixer.pause_all();
                    }
                }
                KeyCode::Char('h') | KeyCode::Char('H') => mixer.halt_all(),
                KeyCode::Char('f') | KeyCode::Char('F') => {
                    mixer.fade_out_all(FADE_OUT_MS);
                }
                KeyCode::Char('-') => {
                    mixer.set_master_volume(mixer.master_volume() - VOLUME_STEP);
                }
                KeyCode::Char('=') | KeyCode::Char('+') => {
                    mixer.set_master_volume(mixer.master_volume() + VOLUME_STEP);
                }
                _ => {}
            }
        }
    }

    true
}
