//! Error types for sunclock

use thiserror::Error;

/// Main error type for sunclock operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Render aborted: {reason}")]
    RenderAborted { reason: String },

    #[error("Image {name} unavailable: {reason}")]
    ImageUnavailable { name: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::RenderAborted`].
    pub fn aborted(reason: impl Into<String>) -> Self {
        Error::RenderAborted {
            reason: reason.into(),
        }
    }

    /// Whether this error is an abandoned render pass rather than a hard failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::RenderAborted { .. })
    }
}

/// Result type alias for sunclock operations
pub type Result<T> = std::result::Result<T, Error>;
