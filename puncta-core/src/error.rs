//! Error types for puncta-core.

use thiserror::Error;

/// Result type alias for puncta operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for puncta operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Object construction from an empty voxel set.
    #[error("cannot build a 3D object from zero voxels")]
    EmptyObject,

    /// Volume shape mismatch between two operands.
    #[error("volume shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape required by the operation, `(z, y, x)`.
        expected: (usize, usize, usize),
        /// Shape actually supplied.
        actual: (usize, usize, usize),
    },
}
