//! Direction type for representing image orientation.

use nalgebra::SMatrix;
use super::Vector;

/// Direction matrix representing image orientation.
///
/// The direction matrix is a D×D matrix where column i is the direction of
/// the i-th image axis in physical space.
///
/// This is a thin wrapper around nalgebra's SMatrix to provide
/// domain-specific functionality while maintaining all nalgebra operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Create an identity direction matrix (no rotation).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build a direction matrix from its axis (column) vectors.
    pub fn from_columns(columns: [Vector<D>; D]) -> Self {
        let mut m = SMatrix::<f64, D, D>::zeros();
        for (c, column) in columns.iter().enumerate() {
            for r in 0..D {
                m[(r, c)] = column[r];
            }
        }
        Self(m)
    }

    /// Check if direction matrix is orthogonal.
    pub fn is_orthogonal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        (0..D).all(|i| {
            (0..D).all(|j| {
                let expected = if i == j { 1.0 } else { 0.0 };
                (product[(i, j)] - expected).abs() < 1e-6
            })
        })
    }

    /// Try to compute the inverse of the direction matrix.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Largest absolute entry difference to another matrix.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Get the inner nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl Direction<3> {
    /// Determinant of the direction matrix.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<(usize, usize)> for Direction<D> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}
