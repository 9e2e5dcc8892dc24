//! Point type for representing spatial coordinates.
//!
//! Points represent positions in physical space, or continuous indices
//! in index space.

use nalgebra::Point as NaPoint;
use super::Vector;

/// A point in D-dimensional space.
///
/// Used for image origins, physical coordinates and continuous indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// Create a point at the origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Convert point to a vector of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0.coords[i]).collect()
    }

    /// Coordinates narrowed to `f32`, the tensor element type.
    pub fn to_f32_array(&self) -> [f32; D] {
        std::array::from_fn(|i| self.0.coords[i] as f32)
    }

    /// Largest absolute coordinate difference to another point.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        (0..D)
            .map(|i| (self[i] - other[i]).abs())
            .fold(0.0, f64::max)
    }

    /// Get the inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}
