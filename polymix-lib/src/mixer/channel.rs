//! Per-channel playback state.

use std::sync::Arc;

use crate::audio::Chunk;
use crate::constants::{MAX_VOLUME, UNGROUPED};

use super::effects::EffectChain;

/// Fade envelope currently applied to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fading {
    #[default]
    Idle,
    In,
    Out,
}

/// One playback slot. Its index in the store is the channel number.
#[derive(Debug)]
pub struct Channel {
    pub(crate) chunk: Option<Arc<Chunk>>,
    /// Frame-aligned playable length of `chunk`.
    pub(crate) len: usize,
    /// Read cursor within the current pass.
    pub(crate) pos: usize,
    /// Bytes left in the current pass.
    pub(crate) playing: usize,
    /// Passes left after this one; negative loops forever.
    pub(crate) looping: i32,
    pub(crate) volume: i32,
    pub(crate) fading: Fading,
    pub(crate) fade_volume: i32,
    pub(crate) fade_volume_reset: i32,
    pub(crate) fade_length: u64,
    pub(crate) ticks_fade: u64,
    pub(crate) expire: Option<u64>,
    pub(crate) start_time: u64,
    pub(crate) paused: Option<u64>,
    pub(crate) tag: i32,
    pub(crate) effects: EffectChain,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            chunk: None,
            len: 0,
            pos: 0,
            playing: 0,
            looping: 0,
            volume: MAX_VOLUME,
            fading: Fading::Idle,
            fade_volume: MAX_VOLUME,
            fade_volume_reset: MAX_VOLUME,
            fade_length: 0,
            ticks_fade: 0,
            expire: None,
            start_time: 0,
            paused: None,
            tag: UNGROUPED,
            effects: EffectChain::new(),
        }
    }
}

impl Channel {
    /// A channel is audible while bytes remain in the pass or passes remain.
    pub fn is_audible(&self) -> bool {
        self.playing > 0 || self.looping != 0
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    /// Point the channel at the start of `chunk` for a fresh playback.
    pub(crate) fn load(&mut self, chunk: &Arc<Chunk>, len: usize, loops: i32, now: u64) {
        self.chunk = Some(Arc::clone(chunk));
        self.len = len;
        self.pos = 0;
        self.playing = len;
        self.looping = loops;
        self.paused = None;
        self.start_time = now;
    }

    /// Clear audibility without touching the assigned chunk.
    pub(crate) fn stop(&mut self) {
        self.playing = 0;
        self.looping = 0;
    }
}
