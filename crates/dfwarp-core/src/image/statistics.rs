//! Voxel statistics used for diagnostics.

use burn::tensor::ElementConversion;
use burn::tensor::backend::Backend;
use crate::error::Result;
use crate::image::{Image, ImageRegion};

/// Count voxels whose value is strictly greater than `threshold`.
///
/// When `region` is given only voxels inside it are considered; the region
/// must fit inside the image. NaN values never count.
pub fn count_voxels_above<B: Backend>(
    image: &Image<B, 3>,
    threshold: f32,
    region: Option<&ImageRegion>,
) -> Result<usize> {
    let region = match region {
        Some(region) => {
            region.validate(image.size())?;
            *region
        }
        None => ImageRegion::largest_possible(image.size()),
    };
    if region.num_voxels() == 0 {
        return Ok(0);
    }

    let [x0, y0, z0] = region.index();
    let [sx, sy, sz] = region.size();
    let sub = image
        .data()
        .clone()
        .slice([z0..z0 + sz, y0..y0 + sy, x0..x0 + sx]);

    let count = sub
        .greater_elem(threshold)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    Ok(count as usize)
}

/// Count strictly positive voxels over the whole image.
pub fn count_positive_voxels<B: Backend>(image: &Image<B, 3>) -> usize {
    // The largest possible region always validates.
    count_voxels_above(image, 0.0, None).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageMetadata;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn volume_with_positive(count: usize) -> Image<TestBackend, 3> {
        let device = Default::default();
        let mut values = vec![0.0f32; 1000];
        // Spread the positive voxels with a stride coprime to 1000.
        for k in 0..count {
            values[(k * 37) % 1000] = 1.0 + k as f32;
        }
        // Negative values must not be counted.
        values[1] = -5.0;
        Image::from_vec(values, [10, 10, 10], ImageMetadata::default(), &device).unwrap()
    }

    #[test]
    fn test_count_37_of_1000() {
        let image = volume_with_positive(37);
        assert_eq!(count_positive_voxels(&image), 37);
    }

    #[test]
    fn test_count_empty_volume() {
        let image = volume_with_positive(0);
        assert_eq!(count_positive_voxels(&image), 0);
    }

    #[test]
    fn test_count_threshold_is_strict() {
        let device = Default::default();
        let values = vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 5.0];
        let image = Image::<TestBackend, 3>::from_vec(values, [2, 2, 2], ImageMetadata::default(), &device).unwrap();
        assert_eq!(count_voxels_above(&image, 2.0, None).unwrap(), 2);
    }

    #[test]
    fn test_count_in_region() {
        let device = Default::default();
        // x fastest: voxel (x, y, z) holds 1 only at x == 1
        let values: Vec<f32> = (0..27).map(|i| if i % 3 == 1 { 1.0 } else { 0.0 }).collect();
        let image = Image::<TestBackend, 3>::from_vec(values, [3, 3, 3], ImageMetadata::default(), &device).unwrap();

        let column = ImageRegion::new([1, 0, 0], [1, 3, 3]);
        assert_eq!(count_voxels_above(&image, 0.0, Some(&column)).unwrap(), 9);

        let corner = ImageRegion::new([2, 0, 0], [1, 3, 3]);
        assert_eq!(count_voxels_above(&image, 0.0, Some(&corner)).unwrap(), 0);

        let empty = ImageRegion::new([0, 0, 0], [0, 3, 3]);
        assert_eq!(count_voxels_above(&image, 0.0, Some(&empty)).unwrap(), 0);
    }

    #[test]
    fn test_count_rejects_oversized_region() {
        let image = volume_with_positive(3);
        let region = ImageRegion::new([5, 5, 5], [6, 1, 1]);
        assert!(count_voxels_above(&image, 0.0, Some(&region)).is_err());
    }
}
