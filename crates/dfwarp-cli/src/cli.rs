//! Command-line arguments.

use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use dfwarp_core::{ImageRegion, InterpolationMode, WarpMethod, WarpSettings};

/// Apply a 3-D displacement field to a volume.
#[derive(Parser, Debug)]
#[command(name = "dfwarp", version)]
pub struct Cli {
    /// Input volume (.nii, .nii.gz, .hdr)
    pub input: PathBuf,

    /// Displacement field on the grid of the input volume
    pub displacement_field: PathBuf,

    /// Where to write the warped volume
    pub output: PathBuf,

    /// Interpolation used when sampling the input volume
    #[arg(long, value_enum, default_value_t = InterpolatorArg::Linear)]
    pub interpolator: InterpolatorArg,

    /// Filter chain applying the field
    #[arg(long, value_enum, default_value_t = MethodArg::Resample)]
    pub method: MethodArg,

    /// Value for voxels displaced outside the input volume
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub default_value: f32,

    /// Print the number of strictly positive voxels before and after warping
    #[arg(long)]
    pub count_voxels: bool,

    /// Restrict voxel counts to the box x,y,z,sx,sy,sz (implies --count-voxels)
    #[arg(long, value_parser = ImageRegion::parse)]
    pub count_region: Option<ImageRegion>,

    /// Warp even if the field and volume grids differ
    #[arg(long)]
    pub allow_geometry_mismatch: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterpolatorArg {
    Linear,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Resample,
    Warp,
}

impl From<InterpolatorArg> for InterpolationMode {
    fn from(arg: InterpolatorArg) -> Self {
        match arg {
            InterpolatorArg::Linear => InterpolationMode::Linear,
            InterpolatorArg::Nearest => InterpolationMode::NearestNeighbor,
        }
    }
}

impl From<MethodArg> for WarpMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Resample => WarpMethod::Resample,
            MethodArg::Warp => WarpMethod::Warp,
        }
    }
}

impl Cli {
    pub fn settings(&self) -> WarpSettings {
        WarpSettings {
            interpolation: self.interpolator.into(),
            method: self.method.into(),
            default_value: self.default_value,
            count_voxels: self.count_voxels || self.count_region.is_some(),
            count_region: self.count_region,
            allow_geometry_mismatch: self.allow_geometry_mismatch,
        }
    }

    /// Default log filter when `RUST_LOG` is not set, or the forced one for `-v`/`-q`.
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["dfwarp"].iter().chain(args)).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["in.nii", "field.nii", "out.nii"]);
        assert_eq!(cli.settings(), WarpSettings::default());
        assert_eq!(cli.log_level(), None);
    }

    #[test]
    fn test_all_options() {
        let cli = parse(&[
            "in.nii.gz",
            "field.nii.gz",
            "out.nii.gz",
            "--interpolator",
            "nearest",
            "--method",
            "warp",
            "--default-value",
            "200",
            "--count-region",
            "1,2,3,4,5,6",
            "--allow-geometry-mismatch",
            "-v",
        ]);
        let settings = cli.settings();
        assert_eq!(settings.interpolation, InterpolationMode::NearestNeighbor);
        assert_eq!(settings.method, WarpMethod::Warp);
        assert_eq!(settings.default_value, 200.0);
        assert!(settings.count_voxels);
        assert_eq!(settings.count_region, Some(ImageRegion::new([1, 2, 3], [4, 5, 6])));
        assert!(settings.allow_geometry_mismatch);
        assert_eq!(cli.log_level(), Some("debug"));
    }

    #[test]
    fn test_negative_default_value() {
        let cli = parse(&["a.nii", "b.nii", "c.nii", "--default-value", "-1024"]);
        assert_eq!(cli.settings().default_value, -1024.0);
    }

    #[test]
    fn test_rejects_bad_region_and_missing_paths() {
        assert!(Cli::try_parse_from(["dfwarp", "a.nii", "b.nii", "c.nii", "--count-region", "1,2,3"]).is_err());
        assert!(Cli::try_parse_from(["dfwarp", "a.nii", "b.nii"]).is_err());
        assert!(Cli::try_parse_from(["dfwarp", "a.nii", "b.nii", "c.nii", "-v", "-q"]).is_err());
    }
}
