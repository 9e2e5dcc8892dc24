//! The load, check, warp and write sequence behind `dfwarp`.

use std::io::Write;
use std::path::Path;
use burn::tensor::backend::Backend;
use dfwarp_core::image::{count_voxels_above, Image};
use dfwarp_core::WarpSettings;
use dfwarp_io::{read_displacement_field, read_nifti, write_nifti, ImageFormat};
use crate::error::PipelineError;

/// File locations for one run.
#[derive(Debug, Clone, Copy)]
pub struct Paths<'a> {
    pub input: &'a Path,
    pub displacement_field: &'a Path,
    pub output: &'a Path,
}

/// Warp the input volume through the displacement field and write the result.
///
/// Grid sizes and optional voxel counts are printed to `out`. Nothing is
/// written to `paths.output` unless every earlier step succeeded.
pub fn run<B: Backend>(
    paths: Paths<'_>,
    settings: &WarpSettings,
    device: &B::Device,
    out: &mut impl Write,
) -> Result<(), PipelineError> {
    ImageFormat::from_path(paths.output).map_err(|e| PipelineError::Output(e.into()))?;

    let input = read_nifti::<B, _>(paths.input, device).map_err(PipelineError::InputVolume)?;
    writeln!(out, "Input image size: {}", format_size(input.size()))?;

    let field = read_displacement_field::<B, _>(paths.displacement_field, device)
        .map_err(PipelineError::DisplacementField)?;
    writeln!(out, "Displacement field size: {}", format_size(field.size()))?;

    settings.check_geometry(&input, &field)?;

    if settings.count_voxels {
        let count = count_positive(&input, settings)?;
        writeln!(out, "Non-zero voxels in input: {count}")?;
    }

    let output = settings.warp(&input, &field)?;

    if settings.count_voxels {
        let count = count_positive(&output, settings)?;
        writeln!(out, "Non-zero voxels in output: {count}")?;
    }

    write_nifti(paths.output, &output).map_err(PipelineError::Output)?;
    tracing::info!(output = %paths.output.display(), "done");
    Ok(())
}

fn count_positive<B: Backend>(image: &Image<B, 3>, settings: &WarpSettings) -> Result<usize, PipelineError> {
    Ok(count_voxels_above(image, 0.0, settings.count_region.as_ref())?)
}

fn format_size(size: [usize; 3]) -> String {
    format!("{} x {} x {}", size[0], size[1], size[2])
}
