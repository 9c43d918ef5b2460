//! Error type shared by every mixer operation.

use thiserror::Error;

/// Errors reported synchronously by mixer operations.
///
/// The variants keep invalid arguments, missing matches and resource
/// exhaustion apart so callers can react to each one differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixerError {
    #[error("invalid channel number {0}")]
    InvalidChannel(usize),
    #[error("tried to play a chunk with a bad frame")]
    BadFrame,
    #[error("no free channels available")]
    NoFreeChannel,
    #[error("no such effect registered")]
    NoSuchEffect,
    #[error("allocation failed: {0}")]
    AllocationFailed(&'static str),
    #[error("audio device error: {0}")]
    Device(String),
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, MixerError>;
