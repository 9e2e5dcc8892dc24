//! Displacement field transform implementation.
//!
//! This module provides a dense displacement field transform where each
//! voxel of a grid carries its own physical offset vector. The grid has its
//! own geometry, independent of the images it is applied to.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::error::{Result, WarpError};
use crate::image::{Image, ImageMetadata};
use crate::interpolation::{inside_buffer_mask, Interpolator, LinearInterpolator};
use super::trait_::Transform;

/// Dense displacement field transform for 3D volumes.
///
/// `T(p) = p + u(p)` where `u` is the field linearly interpolated at the
/// physical point `p`. Points outside the field's buffer are not displaced.
///
/// The displacement tensor has shape `[3, D, H, W]`; channel `c` is the
/// offset along physical axis `c` (x, y, z).
///
/// # Type Parameters
/// * `B` - The Burn backend
#[derive(Debug, Clone)]
pub struct DisplacementFieldTransform3D<B: Backend> {
    /// Displacement field with shape [3, D, H, W]
    displacement: Tensor<B, 4>,
    /// Geometry of the displacement grid
    metadata: ImageMetadata<3>,
}

impl<B: Backend> DisplacementFieldTransform3D<B> {
    /// Create a new 3D displacement field transform.
    ///
    /// # Arguments
    /// * `displacement` - Tensor of shape `[3, D, H, W]` containing displacement vectors
    /// * `metadata` - Physical geometry of the displacement grid
    pub fn new(displacement: Tensor<B, 4>, metadata: ImageMetadata<3>) -> Result<Self> {
        let components = displacement.dims()[0];
        if components != 3 {
            return Err(WarpError::InvalidFieldComponents(components));
        }
        if metadata.direction().try_inverse().is_none() {
            return Err(WarpError::invalid_direction("displacement field direction is singular"));
        }
        Ok(Self {
            displacement,
            metadata,
        })
    }

    /// Build a field from its three component volumes, each `[D, H, W]`.
    pub fn from_components(
        x: Tensor<B, 3>,
        y: Tensor<B, 3>,
        z: Tensor<B, 3>,
        metadata: ImageMetadata<3>,
    ) -> Result<Self> {
        let expected = x.dims();
        for other in [y.dims(), z.dims()] {
            if other != expected {
                return Err(WarpError::ShapeMismatch {
                    expected: expected.to_vec(),
                    actual: other.to_vec(),
                });
            }
        }
        Self::new(Tensor::stack::<4>(vec![x, y, z], 0), metadata)
    }

    /// Create a zero displacement field on the grid of `reference`.
    pub fn zeros(reference: &Image<B, 3>) -> Self {
        let [d, h, w] = reference.shape();
        let device = reference.data().device();
        Self {
            displacement: Tensor::zeros([3, d, h, w], &device),
            metadata: reference.metadata(),
        }
    }

    /// Get the displacement field.
    pub fn displacement(&self) -> Tensor<B, 4> {
        self.displacement.clone()
    }

    /// Geometry of the displacement grid.
    pub fn metadata(&self) -> &ImageMetadata<3> {
        &self.metadata
    }

    /// Spatial tensor shape `[D, H, W]`.
    pub fn shape(&self) -> [usize; 3] {
        let [_, d, h, w] = self.displacement.dims();
        [d, h, w]
    }

    /// Grid size in index order `(x, y, z)`.
    pub fn size(&self) -> [usize; 3] {
        let [d, h, w] = self.shape();
        [w, h, d]
    }

    /// One displacement component as a volume `[D, H, W]`.
    fn component(&self, axis: usize) -> Tensor<B, 3> {
        self.displacement.clone().narrow(0, axis, 1).squeeze::<3>(0)
    }

    /// Displacement vectors in grid storage order, shape `[N, 3]`.
    pub fn displacement_on_grid(&self) -> Tensor<B, 2> {
        let [d, h, w] = self.shape();
        self.displacement.clone().reshape([3, d * h * w]).swap_dims(0, 1)
    }

    /// Displacement at physical points `[N, 3]`; zero outside the field.
    pub fn displacement_at_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.sample(points, true)
    }

    /// Displacement at physical points `[N, 3]`; the border vector is
    /// repeated outside the field.
    pub fn displacement_at_points_clamped(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.sample(points, false)
    }

    fn sample(&self, points: Tensor<B, 2>, zero_outside: bool) -> Result<Tensor<B, 2>> {
        let indices = self.metadata.world_to_index_tensor(points)?;
        let outside = zero_outside.then(|| inside_buffer_mask(self.shape(), indices.clone()).bool_not());

        let interpolator = LinearInterpolator::new();
        let components = (0..3)
            .map(|axis| {
                let values = interpolator.interpolate(&self.component(axis), indices.clone());
                match &outside {
                    Some(mask) => values.mask_fill(mask.clone(), 0.0),
                    None => values,
                }
            })
            .collect::<Vec<_>>();

        Ok(Tensor::stack::<2>(components, 1))
    }
}

impl<B: Backend> Transform<B, 3> for DisplacementFieldTransform3D<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let offsets = self.displacement_at_points(points.clone())?;
        Ok(points + offsets)
    }
}
