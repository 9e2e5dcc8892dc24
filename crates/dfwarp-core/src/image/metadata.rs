//! Image metadata types.
//!
//! This module provides the geometry bundle (origin, spacing, direction)
//! shared by images and displacement fields.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::error::{Result, WarpError};
use crate::spatial::{Direction, Point, Spacing};

/// Image metadata containing physical space information.
///
/// Metadata describes how image indices map to physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMetadata<const D: usize> {
    /// Physical coordinate of the first voxel (index 0, 0, ...).
    origin: Point<D>,
    /// Physical distance between voxels along each axis.
    spacing: Spacing<D>,
    /// Orientation of the image axes.
    direction: Direction<D>,
}

impl<const D: usize> ImageMetadata<D> {
    /// Create new image metadata.
    pub fn new(origin: Point<D>, spacing: Spacing<D>, direction: Direction<D>) -> Self {
        Self {
            origin,
            spacing,
            direction,
        }
    }

    /// Get the origin.
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Get the spacing.
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Get the direction.
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Check that two geometries agree within `tolerance`.
    ///
    /// Every origin coordinate, spacing component and direction entry is
    /// compared independently. The error names the first differing part.
    pub fn ensure_close(&self, other: &Self, tolerance: f64) -> Result<()> {
        let origin_diff = self.origin.max_abs_diff(&other.origin);
        if origin_diff > tolerance {
            return Err(WarpError::geometry_mismatch(format!(
                "origin {:?} vs {:?}",
                self.origin.to_vec(),
                other.origin.to_vec()
            )));
        }
        let spacing_diff = self.spacing.max_abs_diff(&other.spacing);
        if spacing_diff > tolerance {
            return Err(WarpError::geometry_mismatch(format!(
                "spacing {:?} vs {:?}",
                self.spacing.to_vec(),
                other.spacing.to_vec()
            )));
        }
        let direction_diff = self.direction.max_abs_diff(&other.direction);
        if direction_diff > tolerance {
            return Err(WarpError::geometry_mismatch(format!(
                "direction matrices differ by up to {direction_diff}"
            )));
        }
        Ok(())
    }

    /// Whether two geometries agree within `tolerance`.
    pub fn is_close(&self, other: &Self, tolerance: f64) -> bool {
        self.ensure_close(other, tolerance).is_ok()
    }

    /// Inverse of the direction matrix.
    pub fn inverse_direction(&self) -> Result<Direction<D>> {
        self.direction.try_inverse().ok_or_else(|| {
            WarpError::invalid_direction(format!("{:?} is singular", self.direction.inner()))
        })
    }

    /// Batch transform physical points `[Batch, D]` to continuous indices.
    pub fn world_to_index_tensor<B: Backend>(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let device = points.device();
        let origin_tensor = origin_row::<B, D>(&self.origin, &device);

        // I = (P - O) @ T with T = (D^-1)^T * S^-1, i.e. T_rc = (D^-1)_cr / S_c
        let inv_dir = self.inverse_direction()?;
        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(TensorData::new(t_data, [D, D]), &device);

        Ok((points - origin_tensor).matmul(t_tensor))
    }

    /// Batch transform continuous indices `[Batch, D]` to physical points.
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();
        let origin_tensor = origin_row::<B, D>(&self.origin, &device);

        // P = O + I @ M with M_rc = S_r * D_cr
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor = Tensor::<B, 2>::from_data(TensorData::new(m_data, [D, D]), &device);

        indices.matmul(m_tensor) + origin_tensor
    }
}

fn origin_row<B: Backend, const D: usize>(origin: &Point<D>, device: &B::Device) -> Tensor<B, 2> {
    let values = origin.to_f32_array().to_vec();
    Tensor::<B, 1>::from_data(TensorData::new(values, [D]), device).reshape([1, D])
}

impl<const D: usize> Default for ImageMetadata<D> {
    fn default() -> Self {
        Self {
            origin: Point::origin(),
            spacing: Spacing::uniform(1.0),
            direction: Direction::identity(),
        }
    }
}
