//! Shared constants for channel volumes and engine defaults.

/// Maximum value of any channel, chunk or master volume.
pub const MAX_VOLUME: i32 = 128;

/// Number of channels allocated when a mixer is opened with default settings.
pub const DEFAULT_MIX_CHANNELS: usize = 8;

/// Default output sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default output channel count.
pub const DEFAULT_OUTPUT_CHANNELS: u16 = 2;

/// Default period length in frames.
pub const DEFAULT_PERIOD_FRAMES: usize = 1024;

/// Largest output channel count accepted by [`crate::mixer::MixerSettings`].
pub const MAX_OUTPUT_CHANNELS: u16 = 8;

/// Tag carried by channels that do not belong to any group.
pub const UNGROUPED: i32 = -1;

/// Loop count meaning "repeat forever".
pub const LOOP_FOREVER: i32 = -1;
