//! Decode audio files into mixer chunks.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use polymix_lib::audio::{AudioFormat, Chunk};

use crate::convert::to_output_layout;

/// Decoded interleaved samples with their native layout.
pub struct Decoded {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

/// Decode the first audio track of `path` to interleaved `f32`.
pub fn decode_file(path: &Path) -> Result<Decoded> {
    let src = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
    let mut format = probed.format;

    let (track_id, codec_params) = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .map(|track| (track.id, track.codec_params.clone()))
        .ok_or_else(|| anyhow!("no supported audio tracks in {}", path.display()))?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs().make(&codec_params, &dec_opts)?;

    let mut samples = Vec::new();
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                sample_rate = spec.rate;
                let needed = decoded.capacity() * channels;
                if buffer.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                    buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = buffer.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(Error::DecodeError(err)) => warn!("decode error: {}", err),
            Err(Error::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        }
    }

    if channels == 0 || sample_rate == 0 {
        return Err(anyhow!("{} has no decodable audio", path.display()));
    }
    Ok(Decoded {
        samples,
        channels,
        sample_rate,
    })
}

/// Decode `path` and convert it into a chunk in `format`.
pub fn load_chunk(path: &Path, format: &AudioFormat) -> Result<Arc<Chunk>> {
    let decoded = decode_file(path)?;
    let samples = to_output_layout(
        &decoded.samples,
        decoded.channels,
        decoded.sample_rate,
        format,
    )?;
    let chunk = Chunk::from_f32_samples(&samples, format);
    info!(
        "loaded {} ({} ch @ {} Hz, {:.2}s)",
        path.display(),
        decoded.channels,
        decoded.sample_rate,
        format.duration_of(chunk.len()).as_secs_f32()
    );
    Ok(Arc::new(chunk))
}
