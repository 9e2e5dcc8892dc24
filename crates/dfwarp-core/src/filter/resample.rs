//! Resample image filter.
//!
//! This module provides ResampleImageFilter which resamples an image
//! into a new coordinate system using a transform and an interpolator.

use std::marker::PhantomData;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::error::Result;
use crate::image::{generate_grid_3d, Image, ImageMetadata};
use crate::interpolation::{inside_buffer_mask, Interpolator};
use crate::transform::Transform;

/// Resample image filter.
///
/// Resamples an image by applying a transform to map points from the
/// output image space to the input image space, and then interpolating values.
///
/// The transform maps from Output Physical Space -> Input Physical Space.
/// Output voxels whose mapped point falls outside the input buffer receive
/// the default pixel value.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - The transform type
/// * `I` - The interpolator type
pub struct ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    shape: [usize; 3],
    metadata: ImageMetadata<3>,
    transform: T,
    interpolator: I,
    default_pixel_value: f32,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    /// Create a new resample filter.
    ///
    /// # Arguments
    /// * `shape` - Output tensor shape `[D, H, W]`
    /// * `metadata` - Output geometry (origin, spacing, direction)
    /// * `transform` - Transform from output space to input space
    /// * `interpolator` - Interpolator for input image sampling
    pub fn new(shape: [usize; 3], metadata: ImageMetadata<3>, transform: T, interpolator: I) -> Self {
        Self {
            shape,
            metadata,
            transform,
            interpolator,
            default_pixel_value: 0.0,
            _phantom: PhantomData,
        }
    }

    /// Create from a reference image.
    ///
    /// Uses the grid and geometry of the reference image for the output.
    pub fn new_from_reference(reference: &Image<B, 3>, transform: T, interpolator: I) -> Self {
        Self::new(reference.shape(), reference.metadata(), transform, interpolator)
    }

    /// Set default pixel value for outside the field of view.
    pub fn with_default_pixel_value(mut self, value: f32) -> Self {
        self.default_pixel_value = value;
        self
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image<B, 3>) -> Result<Image<B, 3>> {
        let device = input.data().device();
        tracing::debug!(shape = ?self.shape, fill = self.default_pixel_value, "resampling");

        // Output indices -> output physical points -> input physical points
        let output_indices = generate_grid_3d::<B>(self.shape, &device);
        let output_points = self.metadata.index_to_world_tensor(output_indices);
        let input_points = self.transform.transform_points(output_points)?;

        let values = sample_points(input, input_points, &self.interpolator, self.default_pixel_value)?;
        Ok(Image::with_metadata(values.reshape(self.shape), self.metadata))
    }
}

/// Sample `input` at physical points `[N, 3]`.
///
/// Points outside the input buffer receive `fill`.
pub(crate) fn sample_points<B, I>(
    input: &Image<B, 3>,
    points: Tensor<B, 2>,
    interpolator: &I,
    fill: f32,
) -> Result<Tensor<B, 1>>
where
    B: Backend,
    I: Interpolator<B>,
{
    let indices = input.world_to_index_tensor(points)?;
    let outside = inside_buffer_mask(input.shape(), indices.clone()).bool_not();
    let values = interpolator.interpolate(input.data(), indices);
    Ok(values.mask_fill(outside, fill))
}
