//! Nearest neighbor interpolation implementation.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use super::trait_::Interpolator;

/// Nearest Neighbor Interpolator.
///
/// Picks the voxel whose centre is closest; ties round up (`floor(i + 0.5)`),
/// so values are copied exactly and never blended.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    /// Create a new nearest neighbor interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [d0, d1, d2] = data.dims(); // Z, Y, X

        // indices: (x, y, z)
        let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = indices.narrow(1, 2, 1).squeeze::<1>(1);

        let x_i = (x + 0.5).floor().clamp(0.0, (d2 - 1) as f64).int();
        let y_i = (y + 0.5).floor().clamp(0.0, (d1 - 1) as f64).int();
        let z_i = (z + 0.5).floor().clamp(0.0, (d0 - 1) as f64).int();

        // Strides for [Z, Y, X]
        let stride_z = (d1 * d2) as i32;
        let stride_y = d2 as i32;

        let idx = z_i * stride_z + y_i * stride_y + x_i;
        let flat_data = data.clone().reshape([d0 * d1 * d2]);
        flat_data.gather(0, idx)
    }
}
