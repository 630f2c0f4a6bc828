use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("channel {index} has {actual} samples, expected {expected}")]
    RaggedChannels {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate channel name `{0}`")]
    DuplicateChannel(String),
    #[error("signal has no channels or no samples")]
    Empty,
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("sample rate unknown; pass one explicitly or add a time column")]
    MissingSampleRate,
    #[error("malformed EDF header: {0}")]
    Edf(String),
    #[error("EDF signals use different sample rates ({0:?} samples per record)")]
    MixedSampleRates(Vec<usize>),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("sample matrix has the wrong shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
