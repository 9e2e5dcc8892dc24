//! Spacing type for representing physical distances between voxels.

use super::Vector;

/// Spacing between adjacent voxels along each axis.
///
/// This is a type alias to Vector for semantic clarity.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Create uniform spacing (same value for all dimensions).
    pub fn uniform(value: f64) -> Self {
        Vector::new([value; D])
    }

    /// Check that every component is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self[i].is_finite() && self[i] > 0.0)
    }
}
