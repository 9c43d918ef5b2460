//! Peak meter fed from the post-mix hook.

use std::sync::{Arc, Mutex, PoisonError};

use crate::mixer::MixHook;

/// Meter shared between the audio thread and whoever displays it.
pub type SharedOutputMeter = Arc<Mutex<OutputMeter>>;

impl OutputMeter {
    /// Post-mix hook that records every finished period into `meter`.
    pub fn hook(meter: SharedOutputMeter) -> MixHook {
        Box::new(move |buf: &mut [u8]| {
            meter
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_period(buf);
        })
    }
}

#[cfg(feature = "output-meter")]
mod enabled {
    use dasp_ring_buffer::Bounded;

    use crate::audio::samples::decode_samples_into;
    use crate::audio::AudioFormat;

    /// Per output channel peaks of the last few periods.
    pub struct OutputMeter {
        format: AudioFormat,
        history: Bounded<Vec<f32>>,
        samples: Vec<f32>,
    }

    impl std::fmt::Debug for OutputMeter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OutputMeter")
                .field("channels", &self.format.channels)
                .field("stored", &self.history.len())
                .finish()
        }
    }

    impl OutputMeter {
        pub fn new(format: AudioFormat, periods: usize) -> Self {
            let channels = format.channels.max(1) as usize;
            Self {
                format,
                history: Bounded::from(vec![0.0; channels * periods.max(1)]),
                samples: Vec::new(),
            }
        }

        fn channels(&self) -> usize {
            self.format.channels.max(1) as usize
        }

        pub fn reset(&mut self) {
            while self.history.pop().is_some() {}
        }

        pub fn push_period(&mut self, bytes: &[u8]) {
            let channels = self.channels();
            decode_samples_into(bytes, self.format.sample_format, &mut self.samples);
            let mut peaks = vec![0.0_f32; channels];
            for frame in self.samples.chunks_exact(channels) {
                for (peak, sample) in peaks.iter_mut().zip(frame) {
                    *peak = peak.max(sample.abs());
                }
            }
            for peak in peaks {
                self.history.push(peak);
            }
        }

        /// Peaks of the most recent period.
        pub fn levels(&self) -> Vec<f32> {
            let channels = self.channels();
            let len = self.history.len();
            if len < channels {
                return vec![0.0; channels];
            }
            (len - channels..len)
                .map(|index| self.history.get(index).copied().unwrap_or(0.0))
                .collect()
        }

        /// Highest peak per channel across the stored history.
        pub fn peak_hold(&self) -> Vec<f32> {
            let channels = self.channels();
            let mut held = vec![0.0_f32; channels];
            for (index, peak) in self.history.iter().enumerate() {
                let slot = &mut held[index % channels];
                *slot = slot.max(*peak);
            }
            held
        }
    }
}

#[cfg(not(feature = "output-meter"))]
mod disabled {
    use crate::audio::AudioFormat;

    #[derive(Debug)]
    pub struct OutputMeter {
        channels: usize,
    }

    impl OutputMeter {
        pub fn new(format: AudioFormat, _periods: usize) -> Self {
            Self {
                channels: format.channels.max(1) as usize,
            }
        }

        pub fn reset(&mut self) {}

        pub fn push_period(&mut self, _bytes: &[u8]) {}

        pub fn levels(&self) -> Vec<f32> {
            vec![0.0; self.channels]
        }

        pub fn peak_hold(&self) -> Vec<f32> {
            vec![0.0; self.channels]
        }
    }
}

#[cfg(not(feature = "output-meter"))]
pub use disabled::OutputMeter;
#[cfg(feature = "output-meter")]
pub use enabled::OutputMeter;
