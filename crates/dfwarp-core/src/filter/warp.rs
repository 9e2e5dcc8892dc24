//! Warp image filter.
//!
//! WarpImageFilter moves an image along a dense displacement field: every
//! output voxel at physical point `p` takes the input value at `p + u(p)`.

use burn::tensor::backend::Backend;
use crate::error::Result;
use crate::image::{generate_grid_3d, Image, ImageMetadata};
use crate::interpolation::Interpolator;
use crate::transform::DisplacementFieldTransform3D;
use super::resample::sample_points;

/// Geometry tolerance under which the field grid counts as the output grid.
const SAME_GRID_TOLERANCE: f64 = 1e-6;

/// Warp image filter.
///
/// When the displacement field shares the output grid its vectors are read
/// voxel by voxel. Otherwise the field is linearly interpolated at each
/// output point, repeating the border vector outside the field.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `I` - The interpolator type
pub struct WarpImageFilter<B, I>
where
    B: Backend,
    I: Interpolator<B>,
{
    shape: [usize; 3],
    metadata: ImageMetadata<3>,
    interpolator: I,
    edge_padding_value: f32,
    _phantom: std::marker::PhantomData<B>,
}

impl<B, I> WarpImageFilter<B, I>
where
    B: Backend,
    I: Interpolator<B>,
{
    /// Create a new warp filter producing an output of tensor shape `shape`.
    pub fn new(shape: [usize; 3], metadata: ImageMetadata<3>, interpolator: I) -> Self {
        Self {
            shape,
            metadata,
            interpolator,
            edge_padding_value: 0.0,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Create from a reference image (output grid = reference grid).
    pub fn new_from_reference(reference: &Image<B, 3>, interpolator: I) -> Self {
        Self::new(reference.shape(), reference.metadata(), interpolator)
    }

    /// Value for output voxels that map outside the input.
    pub fn with_edge_padding_value(mut self, value: f32) -> Self {
        self.edge_padding_value = value;
        self
    }

    /// Whether `field` lies on the output grid.
    pub fn field_on_output_grid(&self, field: &DisplacementFieldTransform3D<B>) -> bool {
        field.shape() == self.shape && field.metadata().is_close(&self.metadata, SAME_GRID_TOLERANCE)
    }

    /// Warp `input` with `field`.
    pub fn apply(&self, input: &Image<B, 3>, field: &DisplacementFieldTransform3D<B>) -> Result<Image<B, 3>> {
        let device = input.data().device();
        let on_grid = self.field_on_output_grid(field);
        tracing::debug!(shape = ?self.shape, on_grid, fill = self.edge_padding_value, "warping");

        let output_indices = generate_grid_3d::<B>(self.shape, &device);
        let output_points = self.metadata.index_to_world_tensor(output_indices);
        let offsets = if on_grid {
            field.displacement_on_grid()
        } else {
            field.displacement_at_points_clamped(output_points.clone())?
        };

        let values = sample_points(input, output_points + offsets, &self.interpolator, self.edge_padding_value)?;
        Ok(Image::with_metadata(values.reshape(self.shape), self.metadata))
    }
}
