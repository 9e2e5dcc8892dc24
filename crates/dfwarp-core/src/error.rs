//! Error types for image, transform and filter operations.

use thiserror::Error;

/// Main error type for warping operations.
#[derive(Error, Debug)]
pub enum WarpError {
    /// Two grids that must coincide do not.
    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Region does not fit inside the image.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Direction matrix cannot be inverted.
    #[error("Invalid direction matrix: {0}")]
    InvalidDirection(String),

    /// A displacement field did not have three components per voxel.
    #[error("Displacement field must have 3 components per voxel, found {0}")]
    InvalidFieldComponents(usize),
}

/// Result type for warping operations.
pub type Result<T> = std::result::Result<T, WarpError>;

impl WarpError {
    /// Create a geometry mismatch error.
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }

    /// Create an invalid region error.
    pub fn invalid_region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Create an invalid direction error.
    pub fn invalid_direction(msg: impl Into<String>) -> Self {
        Self::InvalidDirection(msg.into())
    }
}
