//! Run settings for a warp.
//!
//! `WarpSettings` collects every choice a caller can make about how a volume
//! is deformed and picks the matching filter chain.

use std::fmt;
use burn::tensor::backend::Backend;
use crate::error::{Result, WarpError};
use crate::filter::{ResampleImageFilter, WarpImageFilter};
use crate::image::{Image, ImageRegion};
use crate::interpolation::{Interpolator, LinearInterpolator, NearestNeighborInterpolator};
use crate::transform::DisplacementFieldTransform3D;

/// Tolerance on origin, spacing and direction when comparing a field with a volume.
pub const GEOMETRY_TOLERANCE: f64 = 1e-4;

/// How input intensities are sampled at non-grid positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Trilinear interpolation.
    #[default]
    Linear,
    /// Value of the closest voxel.
    NearestNeighbor,
}

/// Which filter chain applies the displacement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarpMethod {
    /// Resample filter driven by a displacement field transform.
    #[default]
    Resample,
    /// Dedicated warp filter.
    Warp,
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::NearestNeighbor => write!(f, "nearest"),
        }
    }
}

impl fmt::Display for WarpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resample => write!(f, "resample"),
            Self::Warp => write!(f, "warp"),
        }
    }
}

/// Settings for one warp run.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpSettings {
    pub interpolation: InterpolationMode,
    pub method: WarpMethod,
    /// Value written where the displaced point leaves the input.
    pub default_value: f32,
    /// Report strictly positive voxel counts before and after.
    pub count_voxels: bool,
    /// Restrict the counts to this region; whole image when `None`.
    pub count_region: Option<ImageRegion>,
    /// Skip the field/volume geometry check.
    pub allow_geometry_mismatch: bool,
}

impl Default for WarpSettings {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMode::default(),
            method: WarpMethod::default(),
            default_value: 0.0,
            count_voxels: false,
            count_region: None,
            allow_geometry_mismatch: false,
        }
    }
}

impl WarpSettings {
    /// Check that `field` lies on the grid of `volume`.
    ///
    /// Sizes must be equal and origin, spacing and direction must agree
    /// within [`GEOMETRY_TOLERANCE`]. With `allow_geometry_mismatch` a
    /// difference is only logged.
    pub fn check_geometry<B: Backend>(
        &self,
        volume: &Image<B, 3>,
        field: &DisplacementFieldTransform3D<B>,
    ) -> Result<()> {
        let result = if volume.size() != field.size() {
            Err(WarpError::geometry_mismatch(format!(
                "field size {:?} vs volume size {:?}",
                field.size(),
                volume.size()
            )))
        } else {
            field.metadata().ensure_close(&volume.metadata(), GEOMETRY_TOLERANCE)
        };

        match result {
            Err(err) if self.allow_geometry_mismatch => {
                tracing::warn!(%err, "continuing with mismatched displacement field");
                Ok(())
            }
            other => other,
        }
    }

    /// Deform `volume` with `field` using the configured filter chain.
    ///
    /// The output grid copies the volume's size, origin, spacing and direction.
    pub fn warp<B: Backend>(
        &self,
        volume: &Image<B, 3>,
        field: &DisplacementFieldTransform3D<B>,
    ) -> Result<Image<B, 3>> {
        tracing::info!(method = %self.method, interpolator = %self.interpolation, "deforming volume");
        match self.interpolation {
            InterpolationMode::Linear => self.warp_with(volume, field, LinearInterpolator::new()),
            InterpolationMode::NearestNeighbor => {
                self.warp_with(volume, field, NearestNeighborInterpolator::new())
            }
        }
    }

    fn warp_with<B, I>(
        &self,
        volume: &Image<B, 3>,
        field: &DisplacementFieldTransform3D<B>,
        interpolator: I,
    ) -> Result<Image<B, 3>>
    where
        B: Backend,
        I: Interpolator<B>,
    {
        match self.method {
            WarpMethod::Resample => ResampleImageFilter::new_from_reference(volume, field.clone(), interpolator)
                .with_default_pixel_value(self.default_value)
                .apply(volume),
            WarpMethod::Warp => WarpImageFilter::new_from_reference(volume, interpolator)
                .with_edge_padding_value(self.default_value)
                .apply(volume, field),
        }
    }
}
