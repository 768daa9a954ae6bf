use std::io;
use thiserror::Error;

/// Custom error type for the macperf telemetry core.
///
/// Every variant here is recovered locally by the reader or sampler that
/// produced it; nothing propagates as a fatal error to the aggregator.
#[derive(Error, Debug)]
pub enum MacPerfError {
    #[error("SMC connection failed: {0}")]
    Connection(String),

    #[error("SMC key not found: {0}")]
    KeyNotFound(String),

    #[error("unsupported SMC data encoding: type '{data_type}', size {size}")]
    TypeUnsupported { data_type: String, size: u32 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("subprocess unavailable: {0}")]
    SubprocessUnavailable(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the macperf library
pub type Result<T> = std::result::Result<T, MacPerfError>;

impl MacPerfError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        MacPerfError::Connection(msg.into())
    }

    /// Create a key-not-found error
    pub fn key_not_found<S: Into<String>>(key: S) -> Self {
        MacPerfError::KeyNotFound(key.into())
    }

    /// Create a subprocess-unavailable error
    pub fn subprocess_unavailable<S: Into<String>>(msg: S) -> Self {
        MacPerfError::SubprocessUnavailable(msg.into())
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        MacPerfError::Parse(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MacPerfError::Other(msg.into())
    }
}
