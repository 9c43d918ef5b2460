//! Per-period rendering of every channel into one output buffer.

use std::sync::atomic::Ordering;

use log::warn;

use crate::audio::AudioFormat;
use crate::constants::MAX_VOLUME;
use crate::dsp::mix::mix_audio;

use super::channel::Fading;
use super::effects::{EffectChain, EffectScope};
use super::engine::Engine;

impl Engine {
    /// Render one period into `out`.
    ///
    /// Music is rendered first, then every unpaused channel in index order,
    /// then the post-mix chain and hook. Never fails: if the scratch buffer
    /// cannot grow or the mixer is closed, `out` is filled with silence.
    pub fn mix_into(&mut self, out: &mut [u8]) {
        let silence = self.format.sample_format.silence_byte();
        let len = out.len();
        if !self.open {
            out.fill(silence);
            return;
        }
        if self.mix_buf.len() < len {
            let additional = len - self.mix_buf.len();
            if self.mix_buf.try_reserve_exact(additional).is_err() {
                warn!("could not grow mix buffer to {} bytes", len);
                out.fill(silence);
                return;
            }
            self.mix_buf.resize(len, silence);
        }

        self.mix_buf[..len].fill(silence);
        if let Some(music) = self.music.as_mut() {
            music(&mut self.mix_buf[..len]);
        }

        let master = self.master.load(Ordering::Relaxed);
        let now = self.clock.ticks();
        let mut which = 0;
        while which < self.channels.len() && self.open {
            if !self.channels[which].is_paused() {
                self.update_envelope(which, now);
                if which < self.channels.len() && self.open {
                    self.render_channel(which, len, master);
                }
            }
            which += 1;
        }
        if !self.open {
            out.fill(silence);
            return;
        }

        self.post_effects
            .apply(EffectScope::PostMix, &mut self.mix_buf[..len]);
        if let Some(hook) = self.post_mix.as_mut() {
            hook(&mut self.mix_buf[..len]);
        }
        out.copy_from_slice(&self.mix_buf[..len]);
    }

    fn channel_gain(&self, which: usize, master: i32) -> f32 {
        let channel = &self.channels[which];
        let chunk_volume = channel.chunk.as_ref().map_or(0, |chunk| chunk.volume());
        let volume = master * channel.volume * chunk_volume / (MAX_VOLUME * MAX_VOLUME);
        volume as f32 / MAX_VOLUME as f32
    }

    /// Mix `which` into the first `len` bytes of the scratch buffer, wrapping
    /// through as many loop passes as the period needs.
    fn render_channel(&mut self, which: usize, len: usize, master: i32) {
        if !self.channels[which].is_audible() {
            return;
        }
        let mut gain = self.channel_gain(which, master);
        let mut index = 0;
        while index < len {
            let channel = &mut self.channels[which];
            if channel.playing == 0 {
                if channel.looping == 0 {
                    break;
                }
                if channel.looping > 0 {
                    channel.looping -= 1;
                }
                channel.pos = 0;
                channel.playing = channel.len;
            }
            let Some(chunk) = channel.chunk.as_deref() else {
                channel.stop();
                break;
            };

            let mixable = channel.playing.min(len - index);
            let src = &chunk.data()[channel.pos..channel.pos + mixable];
            mix_step(
                &self.format,
                EffectScope::Channel(which),
                &channel.effects,
                src,
                &mut self.effect_buf,
                &mut self.mix_buf[index..index + mixable],
                gain,
            );
            channel.pos += mixable;
            channel.playing -= mixable;
            index += mixable;

            if channel.playing == 0 && channel.looping == 0 {
                channel.fading = Fading::Idle;
                channel.expire = None;
                self.channel_done_playing(which);
                if !self.open || which >= self.channels.len() {
                    return;
                }
                gain = self.channel_gain(which, master);
            }
        }
    }
}

/// Run `src` through a channel chain on a private copy and blend the result
/// into `dst`.
fn mix_step(
    format: &AudioFormat,
    scope: EffectScope,
    effects: &EffectChain,
    src: &[u8],
    scratch: &mut Vec<u8>,
    dst: &mut [u8],
    gain: f32,
) {
    if effects.is_empty() {
        mix_audio(dst, src, format, gain);
        return;
    }
    scratch.clear();
    if scratch.try_reserve(src.len()).is_err() {
        warn!("no room to copy {} bytes for channel effects", src.len());
        mix_audio(dst, src, format, gain);
        return;
    }
    scratch.extend_from_slice(src);
    effects.apply(scope, scratch);
    mix_audio(dst, scratch, format, gain);
}
