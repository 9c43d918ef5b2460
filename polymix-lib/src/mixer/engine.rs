//! Locked engine state: the channel store, effect chains and hooks.
//!
//! Every method here runs with the mixer lock held. The [`super::Mixer`]
//! handle wraps each of them in a short critical section, and callbacks
//! invoked from inside the engine receive `&mut Engine` so they can keep
//! mutating state without taking the lock again.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use log::debug;

use crate::audio::{AudioFormat, Chunk};
use crate::constants::MAX_VOLUME;
use crate::error::{MixerError, Result};

use super::channel::{Channel, Fading};
use super::clock::Clock;
use super::effects::{EffectChain, EffectDoneFn, EffectFn, EffectScope};

/// Notified after a channel stops, with the channel number.
///
/// Runs with the lock held. Use the provided engine for any follow-up work;
/// calling back into the [`super::Mixer`] handle would deadlock.
pub type ChannelFinishedFn = Arc<dyn Fn(&mut Engine, usize) + Send + Sync>;

/// Buffer hook used for the music stream and the post-mix tap.
pub type MixHook = Box<dyn FnMut(&mut [u8]) + Send>;

/// All state guarded by the mixer lock.
pub struct Engine {
    pub(crate) format: AudioFormat,
    pub(crate) channels: Vec<Channel>,
    pub(crate) reserved: usize,
    pub(crate) post_effects: EffectChain,
    pub(crate) mix_buf: Vec<u8>,
    pub(crate) effect_buf: Vec<u8>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) master: Arc<AtomicI32>,
    pub(crate) channel_finished: Option<ChannelFinishedFn>,
    pub(crate) music: Option<MixHook>,
    pub(crate) post_mix: Option<MixHook>,
    pub(crate) open: bool,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("format", &self.format)
            .field("channels", &self.channels.len())
            .field("reserved", &self.reserved)
            .field("open", &self.open)
            .finish()
    }
}

impl Engine {
    pub(crate) fn new(format: AudioFormat, clock: Arc<dyn Clock>, master: Arc<AtomicI32>) -> Self {
        Self {
            format,
            channels: Vec::new(),
            reserved: 0,
            post_effects: EffectChain::new(),
            mix_buf: Vec::new(),
            effect_buf: Vec::new(),
            clock,
            master,
            channel_finished: None,
            music: None,
            post_mix: None,
            open: true,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn master_volume(&self) -> i32 {
        self.master.load(Ordering::Relaxed)
    }

    /// Set the master volume, clamped, returning the previous value.
    pub fn set_master_volume(&self, volume: i32) -> i32 {
        self.master
            .swap(volume.clamp(0, MAX_VOLUME), Ordering::Relaxed)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn reserved_channels(&self) -> usize {
        self.reserved
    }

    pub(crate) fn channel(&self, which: usize) -> Result<&Channel> {
        self.channels
            .get(which)
            .ok_or(MixerError::InvalidChannel(which))
    }

    pub(crate) fn channel_mut(&mut self, which: usize) -> Result<&mut Channel> {
        self.channels
            .get_mut(which)
            .ok_or(MixerError::InvalidChannel(which))
    }

    /// Grow or shrink the channel store.
    ///
    /// Channels removed by a shrink are stripped of their effects and halted
    /// first. If growing fails the store is left exactly as it was.
    pub fn resize(&mut self, count: usize) -> Result<usize> {
        let current = self.channels.len();
        if count > current {
            self.channels
                .try_reserve_exact(count - current)
                .map_err(|_| MixerError::AllocationFailed("channel store"))?;
            self.channels.resize_with(count, Channel::default);
        } else if count < current {
            let mut which = count;
            while which < self.channels.len() {
                self.channels[which]
                    .effects
                    .clear(EffectScope::Channel(which));
                self.halt_locked(which);
                which += 1;
            }
            self.channels.truncate(count);
        }
        self.reserved = self.reserved.min(self.channels.len());
        debug!("mixer channels resized from {} to {}", current, self.channels.len());
        Ok(self.channels.len())
    }

    /// Keep the first `count` channels out of automatic selection.
    pub fn reserve_channels(&mut self, count: usize) -> usize {
        self.reserved = count.min(self.channels.len());
        self.reserved
    }

    /// Pick the channel a play request lands on and make it ready for a new
    /// chunk.
    fn claim_channel(&mut self, which: Option<usize>) -> Result<usize> {
        match which {
            None => (self.reserved..self.channels.len())
                .find(|&index| !self.channels[index].is_audible())
                .ok_or(MixerError::NoFreeChannel),
            Some(which) => {
                if self.channel(which)?.is_audible() {
                    self.halt_locked(which);
                }
                // The finished callback may have shrunk the store.
                self.channel(which)?;
                Ok(which)
            }
        }
    }

    fn playable_len(&self, chunk: &Chunk) -> Result<usize> {
        match chunk.aligned_len(&self.format) {
            0 => Err(MixerError::BadFrame),
            len => Ok(len),
        }
    }

    /// Play `chunk` on `which`, or on the first free unreserved channel when
    /// `which` is `None`. `loops` extra passes follow the first one; `-1`
    /// loops forever.
    pub fn play_channel(
        &mut self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
    ) -> Result<usize> {
        self.play_channel_timed(which, chunk, loops, None)
    }

    /// Like [`Engine::play_channel`], stopping after at most `limit_ms`.
    pub fn play_channel_timed(
        &mut self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        limit_ms: Option<u64>,
    ) -> Result<usize> {
        let len = self.playable_len(chunk)?;
        let which = self.claim_channel(which)?;
        let now = self.clock.ticks();
        let channel = self.channel_mut(which)?;
        channel.load(chunk, len, loops, now);
        channel.fading = Fading::Idle;
        channel.expire = expiry(now, limit_ms);
        Ok(which)
    }

    /// Fade `chunk` in over `ms` on `which` or an automatically chosen
    /// channel.
    pub fn fade_in_channel(
        &mut self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        ms: u64,
    ) -> Result<usize> {
        self.fade_in_channel_timed(which, chunk, loops, ms, None)
    }

    pub fn fade_in_channel_timed(
        &mut self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        ms: u64,
        limit_ms: Option<u64>,
    ) -> Result<usize> {
        if ms == 0 {
            return self.play_channel_timed(which, chunk, loops, limit_ms);
        }
        let len = self.playable_len(chunk)?;
        let which = self.claim_channel(which)?;
        let now = self.clock.ticks();
        let channel = self.channel_mut(which)?;
        channel.load(chunk, len, loops, now);
        channel.begin_fade(Fading::In, ms, now);
        channel.volume = 0;
        channel.expire = expiry(now, limit_ms);
        Ok(which)
    }

    /// Stop `which` immediately.
    pub fn halt_channel(&mut self, which: usize) -> Result<()> {
        self.channel(which)?;
        self.halt_locked(which);
        Ok(())
    }

    pub fn halt_all(&mut self) {
        let mut which = 0;
        while which < self.channels.len() {
            self.halt_locked(which);
            which += 1;
        }
    }

    /// Halt every channel currently assigned `chunk`, so the caller can drop
    /// it. Returns how many channels were halted.
    pub fn halt_chunk(&mut self, chunk: &Arc<Chunk>) -> usize {
        let mut halted = 0;
        let mut which = 0;
        while which < self.channels.len() {
            let assigned = self.channels[which]
                .chunk
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, chunk));
            if assigned {
                self.halt_locked(which);
                halted += 1;
            }
            which += 1;
        }
        halted
    }

    pub(crate) fn halt_locked(&mut self, which: usize) {
        if self.channels[which].is_audible() {
            self.channels[which].stop();
            self.channel_done_playing(which);
        }
        if let Some(channel) = self.channels.get_mut(which) {
            channel.expire = None;
            if channel.fading != Fading::Idle {
                channel.volume = channel.fade_volume_reset;
            }
            channel.fading = Fading::Idle;
        }
    }

    /// Run the finished callback for `which`, then drop its effects.
    pub(crate) fn channel_done_playing(&mut self, which: usize) {
        if let Some(callback) = self.channel_finished.clone() {
            callback(self, which);
        }
        if let Some(channel) = self.channels.get_mut(which) {
            channel.effects.clear(EffectScope::Channel(which));
        }
    }

    /// Set or clear (`None` or zero) the time limit of `which`.
    pub fn expire_channel(&mut self, which: usize, ms: Option<u64>) -> Result<()> {
        let now = self.clock.ticks();
        self.channel_mut(which)?.expire = expiry(now, ms);
        Ok(())
    }

    pub fn expire_all(&mut self, ms: Option<u64>) -> usize {
        let expire = expiry(self.clock.ticks(), ms);
        for channel in &mut self.channels {
            channel.expire = expire;
        }
        self.channels.len()
    }

    pub fn volume(&self, which: usize) -> Result<i32> {
        Ok(self.channel(which)?.volume)
    }

    /// Set the volume of `which`, clamped, returning the previous value.
    pub fn set_volume(&mut self, which: usize, volume: i32) -> Result<i32> {
        let channel = self.channel_mut(which)?;
        let previous = channel.volume;
        channel.volume = volume.clamp(0, MAX_VOLUME);
        Ok(previous)
    }

    /// Set every channel volume, returning the average previous volume.
    pub fn set_volume_all(&mut self, volume: i32) -> i32 {
        if self.channels.is_empty() {
            return 0;
        }
        let volume = volume.clamp(0, MAX_VOLUME);
        let mut total = 0;
        for channel in &mut self.channels {
            total += channel.volume;
            channel.volume = volume;
        }
        total / self.channels.len() as i32
    }

    /// Pause `which` if it is audible. Pausing twice keeps the first pause
    /// time.
    pub fn pause(&mut self, which: usize) -> Result<()> {
        let now = self.clock.ticks();
        self.channel_mut(which)?.pause_at(now);
        Ok(())
    }

    pub fn pause_all(&mut self) {
        let now = self.clock.ticks();
        for channel in &mut self.channels {
            channel.pause_at(now);
        }
    }

    /// Resume `which`, pushing its expiry back by the time spent paused.
    pub fn resume(&mut self, which: usize) -> Result<()> {
        let now = self.clock.ticks();
        self.channel_mut(which)?.resume_at(now);
        Ok(())
    }

    pub fn resume_all(&mut self) {
        let now = self.clock.ticks();
        for channel in &mut self.channels {
            channel.resume_at(now);
        }
    }

    pub fn playing(&self, which: usize) -> Result<bool> {
        Ok(self.channel(which)?.is_audible())
    }

    pub fn playing_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|channel| channel.is_audible())
            .count()
    }

    pub fn paused(&self, which: usize) -> Result<bool> {
        let channel = self.channel(which)?;
        Ok(channel.is_audible() && channel.is_paused())
    }

    pub fn paused_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|channel| channel.is_audible() && channel.is_paused())
            .count()
    }

    /// Fade state of `which`; out-of-range channels report [`Fading::Idle`].
    pub fn fading(&self, which: usize) -> Fading {
        self.channels
            .get(which)
            .map_or(Fading::Idle, |channel| channel.fading)
    }

    /// Chunk most recently assigned to `which`, if any.
    pub fn chunk(&self, which: usize) -> Result<Option<Arc<Chunk>>> {
        Ok(self.channel(which)?.chunk.clone())
    }

    fn chain_mut(&mut self, scope: EffectScope) -> Result<&mut EffectChain> {
        match scope {
            EffectScope::PostMix => Ok(&mut self.post_effects),
            EffectScope::Channel(which) => Ok(&mut self.channel_mut(which)?.effects),
        }
    }

    /// Append `effect` to the chain of `scope`. `done` runs once when the
    /// effect is later removed.
    pub fn register_effect(
        &mut self,
        scope: EffectScope,
        effect: EffectFn,
        done: Option<EffectDoneFn>,
    ) -> Result<()> {
        self.chain_mut(scope)?.push(effect, done)
    }

    /// Remove the first registration of `effect` from `scope`.
    pub fn unregister_effect(&mut self, scope: EffectScope, effect: &EffectFn) -> Result<()> {
        self.chain_mut(scope)?.remove(scope, effect)
    }

    pub fn unregister_all_effects(&mut self, scope: EffectScope) -> Result<()> {
        self.chain_mut(scope)?.clear(scope);
        Ok(())
    }

    pub fn effect_count(&self, scope: EffectScope) -> Result<usize> {
        match scope {
            EffectScope::PostMix => Ok(self.post_effects.len()),
            EffectScope::Channel(which) => Ok(self.channel(which)?.effects.len()),
        }
    }

    pub fn set_channel_finished(&mut self, callback: Option<ChannelFinishedFn>) {
        self.channel_finished = callback;
    }

    /// Install the music renderer, invoked first in every period.
    pub fn hook_music(&mut self, hook: Option<MixHook>) {
        self.music = hook;
    }

    /// Install the hook that sees every finished period after post-mix
    /// effects.
    pub fn set_post_mix(&mut self, hook: Option<MixHook>) {
        self.post_mix = hook;
    }

    /// Tear down every effect and channel. Later periods render silence.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        for (which, channel) in self.channels.iter_mut().enumerate() {
            channel.effects.clear(EffectScope::Channel(which));
        }
        self.post_effects.clear(EffectScope::PostMix);
        self.music = None;
        self.halt_all();
        self.channels = Vec::new();
        self.reserved = 0;
        self.mix_buf = Vec::new();
        self.effect_buf = Vec::new();
        self.post_mix = None;
        self.open = false;
        debug!("mixer closed");
    }
}

fn expiry(now: u64, ms: Option<u64>) -> Option<u64> {
    ms.filter(|ms| *ms > 0).map(|ms| now.saturating_add(ms))
}

impl Channel {
    pub(crate) fn pause_at(&mut self, now: u64) {
        if self.is_audible() && self.paused.is_none() {
            self.paused = Some(now);
        }
    }

    pub(crate) fn resume_at(&mut self, now: u64) {
        if !self.is_audible() {
            return;
        }
        if let Some(paused_at) = self.paused.take() {
            if let Some(expire) = self.expire.as_mut() {
                *expire = (*expire).saturating_add(now.saturating_sub(paused_at));
            }
        }
    }
}
