//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::{Bool, Tensor};
use burn::tensor::backend::Backend;

/// Interpolator trait for sampling values at continuous coordinates.
///
/// Implementations never read outside the buffer: coordinates beyond the
/// border are clamped. Callers decide what happens to points outside the
/// buffer with [`inside_buffer_mask`].
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a volume at given continuous indices.
    ///
    /// # Arguments
    /// * `data` - The source volume `[D, H, W]`
    /// * `indices` - The indices at which to interpolate `[Batch, 3]`, ordered `(x, y, z)`
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch]`
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}

/// Mask of the continuous indices that fall inside a buffer of tensor shape `shape`.
///
/// Along an axis of `n` voxels an index `i` is inside when `-0.5 <= i < n - 0.5`,
/// i.e. within half a voxel of the first and last sample centres.
pub fn inside_buffer_mask<B: Backend>(shape: [usize; 3], indices: Tensor<B, 2>) -> Tensor<B, 1, Bool> {
    let batch_size = indices.dims()[0];
    let device = indices.device();

    let mut inside = Tensor::<B, 1>::ones([batch_size], &device);
    for column in 0..3 {
        // columns are (x, y, z); tensor shape is [Z, Y, X]
        let extent = shape[2 - column] as f32;
        let coord = indices.clone().narrow(1, column, 1).squeeze::<1>(1);
        let above = coord.clone().greater_equal_elem(-0.5).float();
        let below = coord.lower_elem(extent - 0.5).float();
        inside = inside * above * below;
    }
    inside.greater_elem(0.5)
}
