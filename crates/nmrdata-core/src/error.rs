//! Error taxonomy shared by every vendor reader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NmrDataError {
    /// Malformed or unparseable vendor header; aborts opening the source.
    #[error("header parse error: {0}")]
    HeaderParse(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("parameter {key} is not a {expected}")]
    ParameterType { key: String, expected: &'static str },

    /// Short read or I/O failure during a vector read. The channel is closed.
    #[error("read error at offset {offset}: expected {expected} bytes, got {got}")]
    ReadIo {
        offset: u64,
        expected: usize,
        got: usize,
    },

    #[error("dimension {dim} not supported (format limited to {max} dimensions)")]
    UnsupportedDimension { dim: usize, max: usize },

    #[error("vector index {index} out of bounds ({count} vectors)")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("data channel is closed")]
    ChannelClosed,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NmrDataError>;

impl NmrDataError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingParameter(key.into())
    }

    /// True for errors that leave the source's data channel unusable.
    pub fn closes_channel(&self) -> bool {
        matches!(self, Self::ReadIo { .. } | Self::ChannelClosed | Self::Io(_))
    }
}
