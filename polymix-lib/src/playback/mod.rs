//! Audio output boundary: feeding mixer periods to a rodio output device.

pub mod device;
pub mod output_meter;
pub mod source;

pub use device::AudioDevice;
pub use output_meter::OutputMeter;
pub use source::MixerSource;

/// Number of attempts to open the default output stream.
pub const OUTPUT_STREAM_OPEN_RETRIES: usize = 20;
/// Delay between output stream open attempts.
pub const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;
