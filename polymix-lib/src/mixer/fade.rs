//! Fade envelopes and expiry, evaluated once per period for each channel.

use log::debug;

use crate::error::Result;

use super::channel::{Channel, Fading};
use super::engine::Engine;

impl Channel {
    /// Start a fade from the current volume.
    ///
    /// The volume restored when the fade ends is only captured when no fade
    /// was already running.
    pub(crate) fn begin_fade(&mut self, fading: Fading, ms: u64, now: u64) {
        if self.fading == Fading::Idle {
            self.fade_volume_reset = self.volume;
        }
        self.fading = fading;
        self.fade_volume = self.volume;
        self.fade_length = ms;
        self.ticks_fade = now;
    }

    /// Volume on the linear ramp `elapsed` ms into an unfinished fade.
    fn envelope_volume(&self, elapsed: u64) -> i32 {
        let progress = match self.fading {
            Fading::Out => self.fade_length - elapsed,
            _ => elapsed,
        };
        (self.fade_volume as u64 * progress / self.fade_length) as i32
    }
}

impl Engine {
    /// Fade `which` out over `ms` and halt it once the fade ends.
    ///
    /// Returns `false` when nothing changed: the channel is idle, already
    /// silent or already fading out. A zero duration halts right away.
    pub fn fade_out_channel(&mut self, which: usize, ms: u64) -> Result<bool> {
        let channel = self.channel(which)?;
        if !channel.is_audible() || channel.volume <= 0 || channel.fading == Fading::Out {
            return Ok(false);
        }
        if ms == 0 {
            self.halt_locked(which);
            return Ok(true);
        }
        let now = self.clock.ticks();
        self.channel_mut(which)?.begin_fade(Fading::Out, ms, now);
        debug!("channel {} fading out over {}ms", which, ms);
        Ok(true)
    }

    /// Fade every channel out; returns how many fades started.
    pub fn fade_out_all(&mut self, ms: u64) -> usize {
        let mut started = 0;
        let mut which = 0;
        while which < self.channels.len() {
            if let Ok(true) = self.fade_out_channel(which, ms) {
                started += 1;
            }
            which += 1;
        }
        started
    }

    /// Apply expiry and the fade envelope to `which` at time `now`.
    pub(crate) fn update_envelope(&mut self, which: usize, now: u64) {
        let channel = &mut self.channels[which];
        if channel.expire.is_some_and(|expire| expire < now) {
            let audible = channel.is_audible();
            channel.stop();
            channel.fading = Fading::Idle;
            channel.expire = None;
            if audible {
                self.channel_done_playing(which);
            }
            return;
        }
        if channel.fading == Fading::Idle {
            return;
        }

        let elapsed = now.saturating_sub(channel.ticks_fade);
        if elapsed < channel.fade_length {
            channel.volume = channel.envelope_volume(elapsed);
            return;
        }

        channel.volume = channel.fade_volume_reset;
        let finished = channel.fading;
        channel.fading = Fading::Idle;
        if finished == Fading::Out {
            let audible = channel.is_audible();
            channel.stop();
            channel.expire = None;
            if audible {
                self.channel_done_playing(which);
            }
        }
    }
}
