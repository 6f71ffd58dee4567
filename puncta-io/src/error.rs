//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF codec error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Malformed or inconsistent image stack.
    #[error("invalid stack: {0}")]
    InvalidStack(String),

    /// Channel index outside the stack's channel count.
    #[error("channel {index} out of range (stack has {count})")]
    ChannelOutOfRange {
        /// Requested channel index.
        index: usize,
        /// Number of channels in the stack.
        count: usize,
    },

    /// Segmentation mask not found for an image.
    #[error("no segmentation mask at {0}")]
    MissingMask(PathBuf),

    /// Segmentation produced an unusable result.
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] puncta_core::Error),
}
