use anyhow::{bail, ensure, Context, Result};
use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use dfwarp_core::image::{Image, ImageMetadata};
use dfwarp_core::transform::DisplacementFieldTransform3D;
use ndarray::{Array, ArrayD, ArrayView3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;
use crate::format::{nifti_path, ImageFormat};
use crate::header::{header_from_metadata, metadata_from_header};

/// NIfTI intent code for vector-valued voxels.
pub const NIFTI_INTENT_VECTOR: i16 = 1007;

/// Read a scalar volume from a NIfTI file.
///
/// Geometry comes from the sform, else the qform, else the voxel sizes.
/// Trailing singleton dimensions (e.g. a 4-D file with one time point) are
/// dropped; a 2-D file becomes a single slice.
pub fn read_nifti<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 3>> {
    let path = path.as_ref();
    let (metadata, mut array) = read_array(path)?;

    if array.ndim() == 2 {
        array.insert_axis_inplace(Axis(2));
    }
    while array.ndim() > 3 {
        let last = array.ndim() - 1;
        ensure!(
            array.len_of(Axis(last)) == 1,
            "Expected a scalar 3D volume in {}, found dimensions {:?}",
            path.display(),
            array.shape()
        );
        array = array.index_axis_move(Axis(last), 0);
    }
    let volume = array
        .into_dimensionality::<Ix3>()
        .with_context(|| format!("Expected a 3D volume in {}", path.display()))?;

    let (values, shape) = storage_order(volume.view());
    tracing::info!(path = %path.display(), size = ?[shape[2], shape[1], shape[0]], "read volume");

    let tensor = Tensor::<B, 3>::from_data(TensorData::new(values, shape), device);
    Ok(Image::with_metadata(tensor, metadata))
}

/// Read a displacement field from a NIfTI vector image.
///
/// Accepts `[X, Y, Z, 3]` and the standard `[X, Y, Z, 1, 3]` layout.
pub fn read_displacement_field<B: Backend, P: AsRef<Path>>(
    path: P,
    device: &B::Device,
) -> Result<DisplacementFieldTransform3D<B>> {
    let path = path.as_ref();
    let (metadata, mut array) = read_array(path)?;

    match array.ndim() {
        4 => {}
        5 => {
            ensure!(
                array.len_of(Axis(3)) == 1,
                "Displacement field {} has {} time points, expected 1",
                path.display(),
                array.len_of(Axis(3))
            );
            array = array.index_axis_move(Axis(3), 0);
        }
        n => bail!(
            "Displacement field {} must be a 4D or 5D vector image, found {} dimensions",
            path.display(),
            n
        ),
    }

    let volumes = (0..array.len_of(Axis(3)))
        .map(|axis| -> Result<Tensor<B, 3>> {
            let component = array
                .index_axis(Axis(3), axis)
                .into_dimensionality::<Ix3>()
                .context("Failed to extract displacement component")?;
            let (values, shape) = storage_order(component);
            Ok(Tensor::<B, 3>::from_data(TensorData::new(values, shape), device))
        })
        .collect::<Result<Vec<_>>>()?;

    let field = DisplacementFieldTransform3D::new(Tensor::stack::<4>(volumes, 0), metadata)?;
    tracing::info!(path = %path.display(), size = ?field.size(), "read displacement field");
    Ok(field)
}

/// Write an image to a NIfTI file.
///
/// Voxels are stored as `f32`; the geometry is written to both sform and qform.
///
/// # Arguments
/// * `path` - Path to write the NIfTI file (`.nii`, `.nii.gz`, `.hdr` or `.img`)
/// * `image` - The image to write
pub fn write_nifti<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 3>) -> Result<()> {
    let path = path.as_ref();
    ImageFormat::from_path(path)?;

    // [Z, Y, X] storage viewed as NIfTI [X, Y, Z]
    let [nz, ny, nx] = image.shape();
    let array = Array::from_shape_vec((nz, ny, nx), image.to_vec())
        .context("Failed to create ndarray")?
        .permuted_axes([2, 1, 0]);

    let header = header_from_metadata(&image.metadata());
    WriterOptions::new(nifti_path(path))
        .reference_header(&header)
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;

    tracing::info!(path = %path.display(), size = ?image.size(), "wrote volume");
    Ok(())
}

/// Write a displacement field as a `[X, Y, Z, 1, 3]` NIfTI vector image.
pub fn write_displacement_field<B: Backend, P: AsRef<Path>>(
    path: P,
    field: &DisplacementFieldTransform3D<B>,
) -> Result<()> {
    let path = path.as_ref();
    ImageFormat::from_path(path)?;

    let [nz, ny, nx] = field.shape();
    let values: Vec<f32> = field.displacement().into_data().iter::<f32>().collect();
    let array = Array::from_shape_vec((3, 1, nz, ny, nx), values)
        .context("Failed to create ndarray")?
        .permuted_axes([4, 3, 2, 1, 0]);

    let mut header = header_from_metadata(field.metadata());
    header.intent_code = NIFTI_INTENT_VECTOR;
    WriterOptions::new(nifti_path(path))
        .reference_header(&header)
        .write_nifti(&array)
        .with_context(|| format!("Failed to write displacement field {}", path.display()))?;

    tracing::info!(path = %path.display(), size = ?field.size(), "wrote displacement field");
    Ok(())
}

fn read_array(path: &Path) -> Result<(ImageMetadata<3>, ArrayD<f32>)> {
    ImageFormat::from_path(path)?;
    let obj = ReaderOptions::new()
        .read_file(nifti_path(path))
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let metadata = metadata_from_header(obj.header());
    tracing::debug!(path = %path.display(), ?metadata, "decoded header");
    ensure!(
        metadata.spacing().is_valid(),
        "Invalid voxel spacing {:?} in {}",
        metadata.spacing().to_vec(),
        path.display()
    );

    let array = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;
    Ok((metadata, array))
}

/// Flatten an `[X, Y, Z]` view into `[Z, Y, X]` storage order.
fn storage_order(volume: ArrayView3<f32>) -> (Vec<f32>, [usize; 3]) {
    let (nx, ny, nz) = volume.dim();
    let values = volume.permuted_axes([2, 1, 0]).iter().copied().collect();
    (values, [nz, ny, nx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use dfwarp_core::spatial::{Direction, Point, Spacing};
    use dfwarp_core::{InterpolationMode, WarpSettings};
    use ndarray::{Array3, Array5};
    use nifti::NiftiHeader;
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_read_nifti_basic() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.nii");

        // logical [X=3, Y=4, Z=5], value = x + 10 y + 100 z
        let array = Array3::from_shape_fn((3, 4, 5), |(x, y, z)| (x + 10 * y + 100 * z) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let image = read_nifti::<TestBackend, _>(&file_path, &device)?;

        assert_eq!(image.shape(), [5, 4, 3]);
        assert_eq!(image.size(), [3, 4, 5]);

        let values = image.to_vec();
        assert_eq!(values.len(), 60);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[3], 10.0);
        assert_eq!(values[12], 100.0);
        assert_eq!(values[59], 432.0);
        Ok(())
    }

    #[test]
    fn test_write_then_read_keeps_geometry() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("geometry.nii.gz");

        let mut direction = Direction::<3>::identity();
        direction[(0, 0)] = -1.0;
        let metadata = ImageMetadata::new(Point::new([12.5, -3.0, 40.0]), Spacing::new([0.5, 1.5, 2.0]), direction);
        let values: Vec<f32> = (0..24).map(|v| v as f32 * 0.5).collect();
        let device = Default::default();
        let image = Image::<TestBackend, 3>::from_vec(values.clone(), [2, 3, 4], metadata, &device)?;

        write_nifti(&file_path, &image)?;
        let loaded = read_nifti::<TestBackend, _>(&file_path, &device)?;

        assert_eq!(loaded.shape(), [2, 3, 4]);
        assert_eq!(loaded.to_vec(), values);
        assert!(loaded.metadata().is_close(&metadata, 1e-5));
        Ok(())
    }

    #[test]
    fn test_displacement_field_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("field.nii");
        let device = Default::default();

        let metadata = ImageMetadata::new(Point::new([1.0, 2.0, 3.0]), Spacing::uniform(2.0), Direction::identity());
        let component = |offset: f32| {
            let values: Vec<f32> = (0..12).map(|v| v as f32 + offset).collect();
            Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [2, 2, 3]), &device)
        };
        let field = DisplacementFieldTransform3D::from_components(component(0.0), component(100.0), component(200.0), metadata)?;

        write_displacement_field(&file_path, &field)?;
        let loaded = read_displacement_field::<TestBackend, _>(&file_path, &device)?;

        assert_eq!(loaded.shape(), [2, 2, 3]);
        assert!(loaded.metadata().is_close(&metadata, 1e-5));
        let expected: Vec<f32> = field.displacement().into_data().iter::<f32>().collect();
        let actual: Vec<f32> = loaded.displacement().into_data().iter::<f32>().collect();
        assert_eq!(actual, expected);
        Ok(())
    }

    #[test]
    fn test_four_dimensional_field_is_accepted() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("field4d.nii");
        // [X=2, Y=1, Z=1, 3]
        let array = Array::from_shape_fn((2, 1, 1, 3), |(x, _, _, c)| (10 * c + x) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let field = read_displacement_field::<TestBackend, _>(&file_path, &Default::default())?;
        let values: Vec<f32> = field.displacement().into_data().iter::<f32>().collect();
        assert_eq!(values, vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);
        Ok(())
    }

    #[test]
    fn test_scalar_volume_is_not_a_field() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("scalar.nii");
        WriterOptions::new(&file_path).write_nifti(&Array3::<f32>::zeros((2, 2, 2)))?;

        let err = read_displacement_field::<TestBackend, _>(&file_path, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("4D or 5D"));
        Ok(())
    }

    #[test]
    fn test_two_component_field_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("field2.nii");
        WriterOptions::new(&file_path).write_nifti(&Array::<f32, _>::zeros((2, 2, 2, 2)))?;

        let err = read_displacement_field::<TestBackend, _>(&file_path, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("3 components"));
        Ok(())
    }

    #[test]
    fn test_pair_written_through_image_path() -> Result<()> {
        let dir = tempdir()?;
        let device = Default::default();
        let values: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let image = Image::<TestBackend, 3>::from_vec(values.clone(), [2, 2, 2], ImageMetadata::default(), &device)?;

        write_nifti(dir.path().join("v.img"), &image)?;
        assert!(dir.path().join("v.img").exists());
        assert!(dir.path().join("v.hdr").exists());
        assert!(!dir.path().join("v.nii").exists());

        for name in ["v.img", "v.hdr"] {
            let loaded = read_nifti::<TestBackend, _>(dir.path().join(name), &device)?;
            assert_eq!(loaded.to_vec(), values, "reading {name}");
        }
        Ok(())
    }

    #[test]
    fn test_ras_files_displace_in_lps() -> Result<()> {
        let dir = tempdir()?;
        let device = Default::default();
        let header = NiftiHeader {
            sform_code: 1,
            srow_x: [1.0, 0.0, 0.0, 0.0],
            srow_y: [0.0, 1.0, 0.0, 0.0],
            srow_z: [0.0, 0.0, 1.0, 0.0],
            pixdim: [1.0; 8],
            ..NiftiHeader::default()
        };

        // [X=4, Y=1, Z=1] ramp and a field of +1 along the stored x component
        let volume = Array3::from_shape_fn((4, 1, 1), |(x, _, _)| x as f32);
        let mut shift = Array5::<f32>::zeros((4, 1, 1, 1, 3));
        shift.slice_mut(ndarray::s![.., .., .., .., 0]).fill(1.0);
        let volume_path = dir.path().join("volume.nii");
        let field_path = dir.path().join("field.nii");
        WriterOptions::new(&volume_path).reference_header(&header).write_nifti(&volume)?;
        WriterOptions::new(&field_path).reference_header(&header).write_nifti(&shift)?;

        let image = read_nifti::<TestBackend, _>(&volume_path, &device)?;
        let field = read_displacement_field::<TestBackend, _>(&field_path, &device)?;
        let settings = WarpSettings {
            interpolation: InterpolationMode::NearestNeighbor,
            default_value: -1.0,
            ..WarpSettings::default()
        };
        let output = settings.warp(&image, &field)?;
        assert_eq!(output.to_vec(), vec![-1.0, 0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_non_finite_spacing_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("broken.nii");
        let header = NiftiHeader {
            sform_code: 1,
            srow_x: [f32::NAN, 0.0, 0.0, 0.0],
            srow_y: [0.0, 1.0, 0.0, 0.0],
            srow_z: [0.0, 0.0, 1.0, 0.0],
            ..NiftiHeader::default()
        };
        WriterOptions::new(&file_path)
            .reference_header(&header)
            .write_nifti(&Array3::<f32>::zeros((2, 2, 2)))?;

        let err = read_nifti::<TestBackend, _>(&file_path, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid voxel spacing"));
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_nifti::<TestBackend, _>("/nonexistent/volume.nii", &Default::default()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/volume.nii"));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let image = Image::<TestBackend, 3>::from_vec(vec![0.0; 8], [2, 2, 2], ImageMetadata::default(), &device).unwrap();
        let target = dir.path().join("volume.mha");
        assert!(write_nifti(&target, &image).is_err());
        assert!(!target.exists());
    }
}
