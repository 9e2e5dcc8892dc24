use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;

/// Generate a grid of continuous indices for a 3D image shape.
///
/// Returns a tensor of shape `[N, 3]` where N is the total number of voxels.
/// Rows follow storage order of a `[D, H, W]` tensor and hold `(x, y, z)`.
///
/// # Arguments
/// * `shape` - The image shape `[D, H, W]`
/// * `device` - The device to create the tensor on
pub fn generate_grid_3d<B>(
    shape: [usize; 3],
    device: &B::Device,
) -> Tensor<B, 2>
where
    B: Backend,
{
    let [d, h, w] = shape;
    let total = d * h * w;

    let mut grid = Vec::with_capacity(total * 3);
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                grid.push(x as f32);
                grid.push(y as f32);
                grid.push(z as f32);
            }
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, [total * 3]), device)
        .reshape([total, 3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_grid_order() {
        let device = Default::default();
        let grid = generate_grid_3d::<TestBackend>([2, 1, 2], &device);
        assert_eq!(grid.dims(), [4, 3]);

        let values: Vec<f32> = grid.into_data().iter::<f32>().collect();
        assert_eq!(
            values,
            vec![
                0.0, 0.0, 0.0,
                1.0, 0.0, 0.0,
                0.0, 0.0, 1.0,
                1.0, 0.0, 1.0,
            ]
        );
    }
}
