//! # Polymix Library
//!
//! A real-time, multi-channel sample mixer. A fixed (but resizable) set of
//! channels each play one [`audio::chunk::Chunk`] at a time, with independent
//! volume, fades, expiry, pause state, group tags and effect chains. Once per
//! audio period the engine renders every audible channel into one output
//! buffer, runs the post-mix effect chain and hands the result to the output.
//!
//! ```rust
//! use std::sync::Arc;
//! use polymix_lib::audio::{AudioFormat, Chunk, SampleFormat};
//! use polymix_lib::mixer::{ManualClock, Mixer, MixerSettings};
//!
//! let settings = MixerSettings::default();
//! let clock = Arc::new(ManualClock::new());
//! let mixer = Mixer::new(&settings, clock).unwrap();
//!
//! let format = AudioFormat::new(48_000, 2, SampleFormat::S16);
//! let chunk = Arc::new(Chunk::from_raw(vec![0u8; format.bytes_in_ms(100)]));
//! let channel = mixer.play_channel(None, &chunk, 0).unwrap();
//! assert!(mixer.playing(channel).unwrap());
//!
//! let mut period = vec![0u8; format.bytes_in_ms(20)];
//! mixer.mix_period(&mut period);
//! ```

pub mod audio;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod mixer;
pub mod playback;

pub use error::{MixerError, Result};
