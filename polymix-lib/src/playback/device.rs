//! Default output device driving a mixer.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::{MixerError, Result};
use crate::mixer::{Mixer, MixerSettings, SystemClock};

use super::source::MixerSource;
use super::{OUTPUT_STREAM_OPEN_RETRIES, OUTPUT_STREAM_OPEN_RETRY_MS};

/// An open output stream fed by a [`Mixer`].
///
/// Dropping the device stops the stream; [`AudioDevice::close`] also tears
/// the mixer down.
pub struct AudioDevice {
    mixer: Mixer,
    sink: Sink,
    _stream: OutputStream,
}

impl AudioDevice {
    /// Open the default output and start rendering a new mixer on it.
    pub fn open(settings: &MixerSettings) -> Result<Self> {
        settings.validate()?;
        let stream = open_output_stream_with_retry()?;
        let mixer = Mixer::new(settings, Arc::new(SystemClock::new()))?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(MixerSource::new(mixer.clone(), settings.period_frames));
        sink.play();
        debug!("audio device opened");
        Ok(Self {
            mixer,
            sink,
            _stream: stream,
        })
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Stop output and release every channel and effect.
    pub fn close(self) {
        self.mixer.close();
        self.sink.stop();
        debug!("audio device closed");
    }
}

fn open_output_stream_with_retry() -> Result<OutputStream> {
    let mut last_error = String::new();
    for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
        match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                warn!(
                    "open_default_stream attempt {}/{} failed: {}",
                    attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                );
                last_error = err.to_string();
                if attempt < OUTPUT_STREAM_OPEN_RETRIES {
                    thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
                }
            }
        }
    }
    error!(
        "failed to open default output stream after {} attempts",
        OUTPUT_STREAM_OPEN_RETRIES
    );
    Err(MixerError::Device(last_error))
}
