//! Vector type for representing spatial displacements and directions.

use nalgebra::SVector;

/// A vector in D-dimensional space.
///
/// Vectors represent displacements, axis directions and per-axis spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector<const D: usize>(pub SVector<f64, D>);

impl<const D: usize> Vector<D> {
    /// Create a new vector from components.
    pub fn new(components: [f64; D]) -> Self {
        Self(SVector::from(components))
    }

    /// Create a zero vector.
    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    /// Convert vector to a vector of components.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0[i]).collect()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// Largest absolute component difference to another vector.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        (0..D)
            .map(|i| (self[i] - other[i]).abs())
            .fold(0.0, f64::max)
    }
}

impl<const D: usize> std::ops::Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl<const D: usize> std::ops::Div<f64> for Vector<D> {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self(self.0 / scalar)
    }
}
