//! Serializable mixer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::{AudioFormat, SampleFormat};
use crate::constants::{
    DEFAULT_MIX_CHANNELS, DEFAULT_OUTPUT_CHANNELS, DEFAULT_PERIOD_FRAMES, DEFAULT_SAMPLE_RATE,
    MAX_OUTPUT_CHANNELS, MAX_VOLUME,
};
use crate::error::{MixerError, Result};

/// Output format, channel store size and period length for one mixer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub mix_channels: usize,
    pub reserved_channels: usize,
    pub period_frames: usize,
    pub master_volume: i32,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_OUTPUT_CHANNELS,
            sample_format: SampleFormat::S16,
            mix_channels: DEFAULT_MIX_CHANNELS,
            reserved_channels: 0,
            period_frames: DEFAULT_PERIOD_FRAMES,
            master_volume: MAX_VOLUME,
        }
    }
}

impl MixerSettings {
    /// Parse settings from JSON, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: MixerSettings =
            serde_json::from_str(json).map_err(|err| MixerError::Settings(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| MixerError::Settings(format!("{}: {}", path.display(), err)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MixerError::Settings("sample_rate must be positive".into()));
        }
        if self.channels == 0 || self.channels > MAX_OUTPUT_CHANNELS {
            return Err(MixerError::Settings(format!(
                "channels must be between 1 and {}",
                MAX_OUTPUT_CHANNELS
            )));
        }
        if self.period_frames == 0 {
            return Err(MixerError::Settings("period_frames must be positive".into()));
        }
        Ok(())
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels, self.sample_format)
    }

    /// Bytes requested from the mixer for one period.
    pub fn period_bytes(&self) -> usize {
        self.period_frames * self.format().frame_width()
    }
}
