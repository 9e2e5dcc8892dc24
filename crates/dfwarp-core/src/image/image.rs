//! Image type with physical metadata and coordinate transformations.
//!
//! This module provides the Image struct which represents volumes
//! with tensor data and physical space metadata (origin, spacing, direction).

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::error::{Result, WarpError};
use crate::image::ImageMetadata;
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Image with physical metadata.
///
/// The Image type combines tensor data with physical space metadata that
/// describes how image indices map to physical coordinates.
///
/// # Type Parameters
/// * `B` - The backend for tensor operations
/// * `D` - The dimensionality of the image
///
/// # Coordinate Systems
/// * **Index Space**: voxel indices ordered `(x, y, z)`; the tensor itself is
///   stored as `[Z, Y, X]` so that x varies fastest.
/// * **Physical Space**: `point = origin + Direction * (index * spacing)`
///
/// # Examples
/// ```rust
/// use dfwarp_core::Image;
/// use dfwarp_core::spatial::{Point3, Spacing3, Direction3};
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 3>::zeros([10, 10, 10], &device);
/// let image = Image::new(data, Point3::origin(), Spacing3::uniform(1.0), Direction3::identity());
/// assert_eq!(image.num_voxels(), 1000);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Create a new image with the given data and metadata.
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            direction,
        }
    }

    /// Create an image from a flat buffer in storage order.
    ///
    /// `shape` is the tensor shape (slowest axis first).
    pub fn from_vec(
        values: Vec<f32>,
        shape: [usize; D],
        metadata: ImageMetadata<D>,
        device: &B::Device,
    ) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(WarpError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![values.len()],
            });
        }
        let data = Tensor::<B, D>::from_data(TensorData::new(values, shape), device);
        Ok(Self::with_metadata(data, metadata))
    }

    /// Create an image from data and a metadata bundle.
    pub fn with_metadata(data: Tensor<B, D>, metadata: ImageMetadata<D>) -> Self {
        Self::new(data, *metadata.origin(), *metadata.spacing(), *metadata.direction())
    }

    /// Get the image data tensor.
    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// Get the origin (physical coordinate of first voxel).
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Get the spacing (physical distance between voxels).
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Geometry of this image as a metadata bundle.
    pub fn metadata(&self) -> ImageMetadata<D> {
        ImageMetadata::new(self.origin, self.spacing, self.direction)
    }

    /// Get the tensor shape (slowest axis first).
    pub fn shape(&self) -> [usize; D] {
        self.data.dims()
    }

    /// Grid size in index order `(x, y, z)`.
    pub fn size(&self) -> [usize; D] {
        let mut size = self.shape();
        size.reverse();
        size
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.shape().iter().product()
    }

    /// Copy the voxel values out in storage order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.to_data().iter::<f32>().collect()
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point<D>) -> Result<Point<D>> {
        let inv_dir = self.metadata().inverse_direction()?;
        let rotated = inv_dir * (*point - self.origin);

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        Ok(index)
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point<D>) -> Point<D> {
        let mut scaled_index = Vector::<D>::zeros();
        for i in 0..D {
            scaled_index[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled_index
    }

    /// Batch transform physical points to continuous indices.
    ///
    /// # Arguments
    /// * `points` - A tensor of shape `[Batch, D]` containing physical points
    ///
    /// # Returns
    /// A tensor of shape `[Batch, D]` containing continuous indices
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.metadata().world_to_index_tensor(points)
    }

    /// Batch transform continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - A tensor of shape `[Batch, D]` containing continuous indices
    ///
    /// # Returns
    /// A tensor of shape `[Batch, D]` containing physical points
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        self.metadata().index_to_world_tensor(indices)
    }
}
