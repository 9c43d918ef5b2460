//! Group tags and the bulk operations built on them.
//!
//! Queries treat [`UNGROUPED`] as "any channel"; bulk mutations match the tag
//! exactly, so `halt_group(UNGROUPED)` only touches untagged channels.

use crate::constants::UNGROUPED;
use crate::error::{MixerError, Result};

use super::engine::Engine;

fn in_group(tag: i32, channel_tag: i32) -> bool {
    tag == UNGROUPED || tag == channel_tag
}

impl Engine {
    pub fn set_tag(&mut self, which: usize, tag: i32) -> Result<()> {
        self.channel_mut(which)?.tag = tag;
        Ok(())
    }

    /// Tag every channel in `from..=to`.
    pub fn group_channels(&mut self, from: usize, to: usize, tag: i32) -> Result<()> {
        if to >= self.channels.len() {
            return Err(MixerError::InvalidChannel(to));
        }
        for channel in self.channels.iter_mut().take(to + 1).skip(from) {
            channel.tag = tag;
        }
        Ok(())
    }

    pub fn channel_tag(&self, which: usize) -> Result<i32> {
        Ok(self.channel(which)?.tag)
    }

    fn tagged(&self, tag: i32) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.tag == tag)
            .map(|(which, _)| which)
            .collect()
    }

    /// Number of channels carrying `tag`, or every channel for
    /// [`UNGROUPED`].
    pub fn group_count(&self, tag: i32) -> usize {
        if tag == UNGROUPED {
            return self.channels.len();
        }
        self.channels
            .iter()
            .filter(|channel| channel.tag == tag)
            .count()
    }

    /// First idle channel in the group.
    pub fn group_available(&self, tag: i32) -> Option<usize> {
        self.channels
            .iter()
            .position(|channel| in_group(tag, channel.tag) && !channel.is_audible())
    }

    /// Audible channel in the group that started first. Ties go to the lowest
    /// channel number.
    pub fn group_oldest(&self, tag: i32) -> Option<usize> {
        let mut oldest: Option<(usize, u64)> = None;
        for (which, channel) in self.channels.iter().enumerate() {
            if !in_group(tag, channel.tag) || !channel.is_audible() {
                continue;
            }
            if oldest.map_or(true, |(_, start)| channel.start_time < start) {
                oldest = Some((which, channel.start_time));
            }
        }
        oldest.map(|(which, _)| which)
    }

    /// Audible channel in the group that started last. Ties go to the highest
    /// channel number.
    pub fn group_newest(&self, tag: i32) -> Option<usize> {
        let mut newest: Option<(usize, u64)> = None;
        for (which, channel) in self.channels.iter().enumerate() {
            if !in_group(tag, channel.tag) || !channel.is_audible() {
                continue;
            }
            if newest.map_or(true, |(_, start)| channel.start_time >= start) {
                newest = Some((which, channel.start_time));
            }
        }
        newest.map(|(which, _)| which)
    }

    pub fn halt_group(&mut self, tag: i32) -> usize {
        let members = self.tagged(tag);
        for which in &members {
            if *which < self.channels.len() {
                self.halt_locked(*which);
            }
        }
        members.len()
    }

    pub fn pause_group(&mut self, tag: i32) -> usize {
        let now = self.clock.ticks();
        let mut members = 0;
        for channel in self.channels.iter_mut().filter(|channel| channel.tag == tag) {
            channel.pause_at(now);
            members += 1;
        }
        members
    }

    pub fn resume_group(&mut self, tag: i32) -> usize {
        let now = self.clock.ticks();
        let mut members = 0;
        for channel in self.channels.iter_mut().filter(|channel| channel.tag == tag) {
            channel.resume_at(now);
            members += 1;
        }
        members
    }

    /// Fade out every channel in the group; returns how many fades started.
    pub fn fade_out_group(&mut self, tag: i32, ms: u64) -> usize {
        self.tagged(tag)
            .into_iter()
            .filter(|which| matches!(self.fade_out_channel(*which, ms), Ok(true)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::audio::Chunk;
    use crate::constants::{LOOP_FOREVER, UNGROUPED};
    use crate::error::MixerError;
    use crate::mixer::{ManualClock, Mixer, MixerSettings};

    fn setup() -> (Mixer, Arc<ManualClock>, Arc<Chunk>) {
        let clock = Arc::new(ManualClock::new());
        let mixer = Mixer::new(&MixerSettings::default(), clock.clone()).unwrap();
        let chunk = Arc::new(Chunk::from_raw(vec![0u8; 4096]));
        (mixer, clock, chunk)
    }

    #[test]
    fn group_channels_tags_an_inclusive_range() {
        let (mixer, _clock, _chunk) = setup();
        mixer.group_channels(2, 4, 7).unwrap();
        assert_eq!(mixer.group_count(7), 3);
        assert_eq!(mixer.channel_tag(1).unwrap(), UNGROUPED);
        assert_eq!(mixer.channel_tag(4).unwrap(), 7);
        assert_eq!(mixer.group_count(UNGROUPED), 8);
        assert_eq!(
            mixer.group_channels(6, 8, 1),
            Err(MixerError::InvalidChannel(8))
        );
        assert_eq!(mixer.set_tag(8, 1), Err(MixerError::InvalidChannel(8)));
    }

    #[test]
    fn available_skips_busy_members() {
        let (mixer, _clock, chunk) = setup();
        mixer.group_channels(0, 1, 3).unwrap();
        mixer.play_channel(Some(0), &chunk, LOOP_FOREVER).unwrap();
        assert_eq!(mixer.group_available(3), Some(1));
        mixer.play_channel(Some(1), &chunk, LOOP_FOREVER).unwrap();
        assert_eq!(mixer.group_available(3), None);
        assert_eq!(mixer.group_available(UNGROUPED), Some(2));
    }

    #[test]
    fn oldest_and_newest_break_ties_by_scan_order() {
        let (mixer, clock, chunk) = setup();
        mixer.group_channels(0, 3, 1).unwrap();
        clock.set(10);
        mixer.play_channel(Some(1), &chunk, LOOP_FOREVER).unwrap();
        mixer.play_channel(Some(2), &chunk, LOOP_FOREVER).unwrap();
        clock.set(20);
        mixer.play_channel(Some(0), &chunk, LOOP_FOREVER).unwrap();
        mixer.play_channel(Some(3), &chunk, LOOP_FOREVER).unwrap();

        assert_eq!(mixer.group_oldest(1), Some(1));
        assert_eq!(mixer.group_newest(1), Some(3));
        assert_eq!(mixer.group_oldest(9), None);
        assert_eq!(mixer.group_newest(9), None);
    }

    #[test]
    fn group_resume_shifts_member_expiry_only() {
        let (mixer, clock, chunk) = setup();
        mixer.set_tag(0, 2).unwrap();
        mixer
            .play_channel_timed(Some(0), &chunk, LOOP_FOREVER, Some(100))
            .unwrap();
        mixer
            .play_channel_timed(Some(1), &chunk, LOOP_FOREVER, Some(100))
            .unwrap();
        clock.set(50);
        assert_eq!(mixer.pause_group(2), 1);
        assert!(mixer.paused(0).unwrap());
        assert!(!mixer.paused(1).unwrap());

        clock.set(250);
        assert_eq!(mixer.resume_group(2), 1);
        let engine = mixer.lock();
        assert_eq!(engine.channels[0].expire, Some(300));
        assert_eq!(engine.channels[1].expire, Some(100));
    }

    #[test]
    fn bulk_operations_only_touch_the_group() {
        let (mixer, _clock, chunk) = setup();
        mixer.set_tag(0, 5).unwrap();
        mixer.set_tag(1, 5).unwrap();
        for which in 0..3 {
            mixer.play_channel(Some(which), &chunk, LOOP_FOREVER).unwrap();
        }

        assert_eq!(mixer.pause_group(5), 2);
        assert_eq!(mixer.paused_count(), 2);
        assert!(!mixer.paused(2).unwrap());
        assert_eq!(mixer.resume_group(5), 2);
        assert_eq!(mixer.paused_count(), 0);

        assert_eq!(mixer.fade_out_group(5, 100), 2);
        assert_eq!(mixer.fade_out_group(5, 100), 0);

        assert_eq!(mixer.halt_group(5), 2);
        assert!(!mixer.playing(0).unwrap());
        assert!(!mixer.playing(1).unwrap());
        assert!(mixer.playing(2).unwrap());
    }
}
