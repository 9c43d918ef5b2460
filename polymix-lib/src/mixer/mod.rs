//! The channel mixer: a shareable handle around one locked [`Engine`].
//!
//! [`Mixer`] is cheap to clone and safe to use from any thread. Every
//! operation takes the engine lock for a short critical section; the audio
//! thread takes the same lock for one full period in [`Mixer::mix_period`].
//! Master volume lives outside the lock so it can be read every period
//! without contention.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::audio::{AudioFormat, Chunk};
use crate::constants::MAX_VOLUME;
use crate::error::Result;

pub mod channel;
pub mod clock;
pub mod effects;
pub mod engine;
mod fade;
mod group;
mod period;
pub mod settings;

pub use channel::Fading;
pub use clock::{Clock, ManualClock, SystemClock};
pub use effects::{EffectDoneFn, EffectFn, EffectScope};
pub use engine::{ChannelFinishedFn, Engine, MixHook};
pub use settings::MixerSettings;

/// Thread-safe handle to a running mixer.
#[derive(Clone)]
pub struct Mixer {
    inner: Arc<Mutex<Engine>>,
    master: Arc<AtomicI32>,
    format: AudioFormat,
}

impl std::fmt::Debug for Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("format", &self.format)
            .field("master", &self.master.load(Ordering::Relaxed))
            .finish()
    }
}

impl Mixer {
    /// Build a mixer for `settings`, allocating its channel store.
    pub fn new(settings: &MixerSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        settings.validate()?;
        let format = settings.format();
        let master = Arc::new(AtomicI32::new(settings.master_volume.clamp(0, MAX_VOLUME)));
        let mut engine = Engine::new(format, clock, master.clone());
        engine.resize(settings.mix_channels)?;
        engine.reserve_channels(settings.reserved_channels);
        debug!(
            "mixer opened: {} Hz, {} channel(s), {:?}, {} mix channels",
            format.sample_rate,
            format.channels,
            format.sample_format,
            settings.mix_channels
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(engine)),
            master,
            format,
        })
    }

    /// Hold the engine lock to group several operations atomically.
    ///
    /// Calls on this handle while the guard is alive deadlock; use the guard.
    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render one period into `out`. Called by the audio output.
    pub fn mix_period(&self, out: &mut [u8]) {
        self.lock().mix_into(out);
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    /// Tear down every channel and effect. Later periods are silent.
    pub fn close(&self) {
        self.lock().close();
    }

    pub fn master_volume(&self) -> i32 {
        self.master.load(Ordering::Relaxed)
    }

    /// Set the master volume without taking the engine lock.
    pub fn set_master_volume(&self, volume: i32) -> i32 {
        self.master
            .swap(volume.clamp(0, MAX_VOLUME), Ordering::Relaxed)
    }

    pub fn num_channels(&self) -> usize {
        self.lock().num_channels()
    }

    pub fn resize(&self, count: usize) -> Result<usize> {
        self.lock().resize(count)
    }

    pub fn reserve_channels(&self, count: usize) -> usize {
        self.lock().reserve_channels(count)
    }

    pub fn play_channel(
        &self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
    ) -> Result<usize> {
        self.lock().play_channel(which, chunk, loops)
    }

    pub fn play_channel_timed(
        &self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        limit_ms: Option<u64>,
    ) -> Result<usize> {
        self.lock().play_channel_timed(which, chunk, loops, limit_ms)
    }

    pub fn fade_in_channel(
        &self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        ms: u64,
    ) -> Result<usize> {
        self.lock().fade_in_channel(which, chunk, loops, ms)
    }

    pub fn fade_in_channel_timed(
        &self,
        which: Option<usize>,
        chunk: &Arc<Chunk>,
        loops: i32,
        ms: u64,
        limit_ms: Option<u64>,
    ) -> Result<usize> {
        self.lock()
            .fade_in_channel_timed(which, chunk, loops, ms, limit_ms)
    }

    pub fn fade_out_channel(&self, which: usize, ms: u64) -> Result<bool> {
        self.lock().fade_out_channel(which, ms)
    }

    pub fn fade_out_all(&self, ms: u64) -> usize {
        self.lock().fade_out_all(ms)
    }

    pub fn fading(&self, which: usize) -> Fading {
        self.lock().fading(which)
    }

    pub fn halt_channel(&self, which: usize) -> Result<()> {
        self.lock().halt_channel(which)
    }

    pub fn halt_all(&self) {
        self.lock().halt_all();
    }

    pub fn halt_chunk(&self, chunk: &Arc<Chunk>) -> usize {
        self.lock().halt_chunk(chunk)
    }

    pub fn expire_channel(&self, which: usize, ms: Option<u64>) -> Result<()> {
        self.lock().expire_channel(which, ms)
    }

    pub fn expire_all(&self, ms: Option<u64>) -> usize {
        self.lock().expire_all(ms)
    }

    pub fn volume(&self, which: usize) -> Result<i32> {
        self.lock().volume(which)
    }

    pub fn set_volume(&self, which: usize, volume: i32) -> Result<i32> {
        self.lock().set_volume(which, volume)
    }

    pub fn set_volume_all(&self, volume: i32) -> i32 {
        self.lock().set_volume_all(volume)
    }

    pub fn pause(&self, which: usize) -> Result<()> {
        self.lock().pause(which)
    }

    pub fn pause_all(&self) {
        self.lock().pause_all();
    }

    pub fn resume(&self, which: usize) -> Result<()> {
        self.lock().resume(which)
    }

    pub fn resume_all(&self) {
        self.lock().resume_all();
    }

    pub fn playing(&self, which: usize) -> Result<bool> {
        self.lock().playing(which)
    }

    pub fn playing_count(&self) -> usize {
        self.lock().playing_count()
    }

    pub fn paused(&self, which: usize) -> Result<bool> {
        self.lock().paused(which)
    }

    pub fn paused_count(&self) -> usize {
        self.lock().paused_count()
    }

    pub fn chunk(&self, which: usize) -> Result<Option<Arc<Chunk>>> {
        self.lock().chunk(which)
    }

    pub fn set_tag(&self, which: usize, tag: i32) -> Result<()> {
        self.lock().set_tag(which, tag)
    }

    pub fn group_channels(&self, from: usize, to: usize, tag: i32) -> Result<()> {
        self.lock().group_channels(from, to, tag)
    }

    pub fn channel_tag(&self, which: usize) -> Result<i32> {
        self.lock().channel_tag(which)
    }

    pub fn group_count(&self, tag: i32) -> usize {
        self.lock().group_count(tag)
    }

    pub fn group_available(&self, tag: i32) -> Option<usize> {
        self.lock().group_available(tag)
    }

    pub fn group_oldest(&self, tag: i32) -> Option<usize> {
        self.lock().group_oldest(tag)
    }

    pub fn group_newest(&self, tag: i32) -> Option<usize> {
        self.lock().group_newest(tag)
    }

    pub fn halt_group(&self, tag: i32) -> usize {
        self.lock().halt_group(tag)
    }

    pub fn pause_group(&self, tag: i32) -> usize {
        self.lock().pause_group(tag)
    }

    pub fn resume_group(&self, tag: i32) -> usize {
        self.lock().resume_group(tag)
    }

    pub fn fade_out_group(&self, tag: i32, ms: u64) -> usize {
        self.lock().fade_out_group(tag, ms)
    }

    pub fn register_effect(
        &self,
        scope: EffectScope,
        effect: EffectFn,
        done: Option<EffectDoneFn>,
    ) -> Result<()> {
        self.lock().register_effect(scope, effect, done)
    }

    pub fn unregister_effect(&self, scope: EffectScope, effect: &EffectFn) -> Result<()> {
        self.lock().unregister_effect(scope, effect)
    }

    pub fn unregister_all_effects(&self, scope: EffectScope) -> Result<()> {
        self.lock().unregister_all_effects(scope)
    }

    pub fn set_channel_finished(&self, callback: Option<ChannelFinishedFn>) {
        self.lock().set_channel_finished(callback);
    }

    pub fn hook_music(&self, hook: Option<MixHook>) {
        self.lock().hook_music(hook);
    }

    pub fn set_post_mix(&self, hook: Option<MixHook>) {
        self.lock().set_post_mix(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleFormat;
    use crate::constants::LOOP_FOREVER;
    use crate::error::MixerError;
    use std::sync::atomic::AtomicUsize;

    fn mixer_with(channels: usize) -> (Mixer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let settings = MixerSettings {
            mix_channels: channels,
            ..MixerSettings::default()
        };
        (Mixer::new(&settings, clock.clone()).unwrap(), clock)
    }

    fn chunk(bytes: usize) -> Arc<Chunk> {
        Arc::new(Chunk::from_raw(vec![0x10; bytes]))
    }

    fn finished_counter(mixer: &Mixer) -> Arc<AtomicUsize> {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        mixer.set_channel_finished(Some(Arc::new(move |_: &mut Engine, _: usize| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        finished
    }

    #[test]
    fn auto_play_picks_first_free_unreserved_channel() {
        let (mixer, _clock) = mixer_with(4);
        let sound = chunk(64);
        assert_eq!(mixer.reserve_channels(2), 2);
        assert_eq!(mixer.play_channel(None, &sound, 0).unwrap(), 2);
        assert_eq!(mixer.play_channel(None, &sound, 0).unwrap(), 3);
        assert_eq!(mixer.play_channel(Some(0), &sound, 0).unwrap(), 0);
    }

    #[test]
    fn auto_play_with_every_channel_busy_changes_nothing() {
        let (mixer, _clock) = mixer_with(2);
        let finished = finished_counter(&mixer);
        let first = chunk(64);
        mixer.play_channel(None, &first, LOOP_FOREVER).unwrap();
        mixer.play_channel(None, &first, LOOP_FOREVER).unwrap();

        let other = chunk(128);
        assert_eq!(
            mixer.play_channel(None, &other, 0),
            Err(MixerError::NoFreeChannel)
        );
        for which in 0..2 {
            assert!(Arc::ptr_eq(&mixer.chunk(which).unwrap().unwrap(), &first));
        }
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_arguments_are_distinct_errors() {
        let (mixer, _clock) = mixer_with(2);
        assert_eq!(
            mixer.play_channel(Some(2), &chunk(64), 0),
            Err(MixerError::InvalidChannel(2))
        );
        assert_eq!(
            mixer.play_channel(None, &chunk(3), 0),
            Err(MixerError::BadFrame)
        );
        assert_eq!(mixer.halt_channel(5), Err(MixerError::InvalidChannel(5)));
        assert_eq!(mixer.fading(9), Fading::Idle);
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        let (mixer, _clock) = mixer_with(1);
        mixer.play_channel(Some(0), &chunk(10), 0).unwrap();
        let mut out = vec![0u8; 16];
        mixer.mix_period(&mut out);
        assert!(out[..8].iter().all(|byte| *byte == 0x10));
        assert!(out[8..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn replaying_a_busy_channel_finishes_the_old_sound_first() {
        let (mixer, _clock) = mixer_with(1);
        let finished = finished_counter(&mixer);
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let effect: EffectFn = Arc::new(|_: EffectScope, _: &mut [u8]| {});
        mixer.play_channel(Some(0), &chunk(64), LOOP_FOREVER).unwrap();
        mixer
            .register_effect(
                EffectScope::Channel(0),
                effect,
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        mixer.play_channel(Some(0), &chunk(32), 0).unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(mixer.lock().effect_count(EffectScope::Channel(0)), Ok(0));
    }

    #[test]
    fn halt_and_unregister_all_are_idempotent() {
        let (mixer, _clock) = mixer_with(2);
        let finished = finished_counter(&mixer);
        mixer.play_channel(Some(0), &chunk(64), LOOP_FOREVER).unwrap();
        mixer.halt_channel(0).unwrap();
        mixer.halt_channel(0).unwrap();
        mixer.halt_all();
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        mixer.unregister_all_effects(EffectScope::Channel(1)).unwrap();
        mixer.unregister_all_effects(EffectScope::Channel(1)).unwrap();
        mixer.unregister_all_effects(EffectScope::PostMix).unwrap();
        assert_eq!(
            mixer.unregister_all_effects(EffectScope::Channel(2)),
            Err(MixerError::InvalidChannel(2))
        );
    }

    #[test]
    fn unregistering_an_unknown_effect_is_no_match() {
        let (mixer, _clock) = mixer_with(1);
        let effect: EffectFn = Arc::new(|_: EffectScope, _: &mut [u8]| {});
        assert_eq!(
            mixer.unregister_effect(EffectScope::PostMix, &effect),
            Err(MixerError::NoSuchEffect)
        );
        assert_eq!(
            mixer.register_effect(EffectScope::Channel(4), effect, None),
            Err(MixerError::InvalidChannel(4))
        );
    }

    #[test]
    fn resize_round_trip_keeps_lower_channels_and_clears_upper_ones() {
        let (mixer, _clock) = mixer_with(2);
        let finished = finished_counter(&mixer);
        let sound = chunk(64);
        mixer.play_channel(Some(1), &sound, LOOP_FOREVER).unwrap();
        mixer.set_volume(1, 77).unwrap();
        mixer.set_tag(1, 3).unwrap();

        assert_eq!(mixer.resize(6).unwrap(), 6);
        mixer.play_channel(Some(4), &sound, LOOP_FOREVER).unwrap();
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let effect: EffectFn = Arc::new(|_: EffectScope, _: &mut [u8]| {});
        mixer
            .register_effect(
                EffectScope::Channel(5),
                effect,
                Some(Box::new(move |scope| {
                    assert_eq!(scope, EffectScope::Channel(5));
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        mixer.reserve_channels(5);

        assert_eq!(mixer.resize(2).unwrap(), 2);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(mixer.lock().reserved_channels(), 2);
        assert!(mixer.playing(1).unwrap());
        assert_eq!(mixer.volume(1).unwrap(), 77);
        assert_eq!(mixer.channel_tag(1).unwrap(), 3);
        assert_eq!(mixer.playing(4), Err(MixerError::InvalidChannel(4)));

        assert_eq!(mixer.resize(6).unwrap(), 6);
        assert!(!mixer.playing(4).unwrap());
        assert_eq!(mixer.volume(4).unwrap(), MAX_VOLUME);
    }

    #[test]
    fn set_volume_all_reports_average_previous_volume() {
        let (mixer, _clock) = mixer_with(2);
        mixer.set_volume(0, 100).unwrap();
        mixer.set_volume(1, 50).unwrap();
        assert_eq!(mixer.set_volume_all(500), 75);
        assert_eq!(mixer.volume(0).unwrap(), MAX_VOLUME);
        assert_eq!(mixer.set_volume(0, -3).unwrap(), MAX_VOLUME);
        assert_eq!(mixer.volume(0).unwrap(), 0);

        let (empty, _clock) = mixer_with(0);
        assert_eq!(empty.set_volume_all(10), 0);
    }

    #[test]
    fn master_volume_is_clamped() {
        let (mixer, _clock) = mixer_with(1);
        assert_eq!(mixer.set_master_volume(1000), MAX_VOLUME);
        assert_eq!(mixer.master_volume(), MAX_VOLUME);
        mixer.set_master_volume(-1);
        assert_eq!(mixer.lock().master_volume(), 0);
    }

    #[test]
    fn resume_pushes_expiry_back_by_paused_time() {
        let (mixer, clock) = mixer_with(1);
        mixer
            .play_channel_timed(Some(0), &chunk(64), LOOP_FOREVER, Some(100))
            .unwrap();
        clock.set(50);
        mixer.pause(0).unwrap();
        assert!(mixer.paused(0).unwrap());
        clock.set(1050);
        mixer.resume(0).unwrap();

        let mut out = vec![0u8; 16];
        clock.set(1100);
        mixer.mix_period(&mut out);
        assert!(mixer.playing(0).unwrap());
        clock.set(1101);
        mixer.mix_period(&mut out);
        assert!(!mixer.playing(0).unwrap());
    }

    #[test]
    fn huge_time_limits_saturate_instead_of_wrapping() {
        let (mixer, clock) = mixer_with(2);
        clock.set(5);
        mixer
            .play_channel_timed(None, &chunk(64), LOOP_FOREVER, Some(u64::MAX))
            .unwrap();
        mixer.expire_channel(1, Some(u64::MAX)).unwrap();
        assert_eq!(mixer.lock().channels[0].expire, Some(u64::MAX));
        assert_eq!(mixer.lock().channels[1].expire, Some(u64::MAX));

        mixer.pause(0).unwrap();
        clock.set(10);
        mixer.resume(0).unwrap();
        assert_eq!(mixer.lock().channels[0].expire, Some(u64::MAX));

        let mut out = vec![0u8; 16];
        mixer.mix_period(&mut out);
        assert!(mixer.playing(0).unwrap());
    }

    #[test]
    fn expire_channel_sets_and_clears_limits() {
        let (mixer, clock) = mixer_with(2);
        mixer.play_channel(Some(0), &chunk(64), LOOP_FOREVER).unwrap();
        mixer.play_channel(Some(1), &chunk(64), LOOP_FOREVER).unwrap();
        assert_eq!(mixer.expire_all(Some(10)), 2);
        mixer.expire_channel(1, None).unwrap();
        clock.set(20);
        let mut out = vec![0u8; 16];
        mixer.mix_period(&mut out);
        assert!(!mixer.playing(0).unwrap());
        assert!(mixer.playing(1).unwrap());
    }

    #[test]
    fn halt_chunk_stops_every_channel_using_it() {
        let (mixer, _clock) = mixer_with(3);
        let shared = chunk(64);
        mixer.play_channel(Some(0), &shared, LOOP_FOREVER).unwrap();
        mixer.play_channel(Some(1), &chunk(64), LOOP_FOREVER).unwrap();
        mixer.play_channel(Some(2), &shared, LOOP_FOREVER).unwrap();
        assert_eq!(mixer.halt_chunk(&shared), 2);
        assert_eq!(mixer.playing_count(), 1);
        assert!(mixer.playing(1).unwrap());
    }

    #[test]
    fn pause_all_and_resume_all_touch_only_audible_channels() {
        let (mixer, _clock) = mixer_with(3);
        mixer.play_channel(Some(0), &chunk(64), LOOP_FOREVER).unwrap();
        mixer.pause_all();
        assert_eq!(mixer.paused_count(), 1);
        assert!(!mixer.paused(1).unwrap());
        mixer.resume_all();
        assert_eq!(mixer.paused_count(), 0);
    }

    #[test]
    fn close_releases_everything_and_renders_silence() {
        let clock = Arc::new(ManualClock::new());
        let settings = MixerSettings {
            sample_format: SampleFormat::U8,
            ..MixerSettings::default()
        };
        let mixer = Mixer::new(&settings, clock).unwrap();
        let finished = finished_counter(&mixer);
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let effect: EffectFn = Arc::new(|_: EffectScope, _: &mut [u8]| {});
        mixer
            .register_effect(
                EffectScope::PostMix,
                effect,
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        mixer.play_channel(Some(0), &chunk(64), LOOP_FOREVER).unwrap();

        mixer.close();
        assert!(!mixer.is_open());
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(mixer.num_channels(), 0);
        assert_eq!(
            mixer.play_channel(None, &chunk(64), 0),
            Err(MixerError::NoFreeChannel)
        );

        let mut out = vec![0u8; 32];
        mixer.mix_period(&mut out);
        assert!(out.iter().all(|byte| *byte == 0x80));
    }

    #[test]
    fn lock_groups_operations_atomically() {
        let (mixer, _clock) = mixer_with(2);
        let sound = chunk(64);
        {
            let mut engine = mixer.lock();
            engine.play_channel(Some(0), &sound, 0).unwrap();
            engine.play_channel(Some(1), &sound, 0).unwrap();
            engine.set_tag(0, 2).unwrap();
        }
        assert_eq!(mixer.playing_count(), 2);
        assert_eq!(mixer.group_oldest(2), Some(0));
    }

    #[test]
    fn handles_are_shared_across_threads() {
        let (mixer, _clock) = mixer_with(4);
        let sound = chunk(64);
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let mixer = mixer.clone();
                let sound = sound.clone();
                std::thread::spawn(move || mixer.play_channel(None, &sound, LOOP_FOREVER).unwrap())
            })
            .collect();
        let mut used: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        used.sort_unstable();
        assert_eq!(used, vec![0, 1, 2, 3]);
    }
}
