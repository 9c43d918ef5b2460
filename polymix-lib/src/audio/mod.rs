//! Output format description, sample chunks and sample codecs.

pub mod chunk;
pub mod format;
pub mod samples;

pub use chunk::Chunk;
pub use format::{AudioFormat, SampleFormat};
