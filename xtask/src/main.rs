use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::{Array, Array3};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// NIfTI intent code for vector-valued voxels.
const NIFTI_INTENT_VECTOR: i16 = 1007;

const PHANTOM_FILE: &str = "phantom.nii.gz";
const SHIFT_FILE: &str = "shift.nii.gz";
const ZERO_FILE: &str = "zero.nii.gz";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Developer automation for the dfwarp workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cube phantom plus constant and zero displacement fields
    GenPhantom {
        /// Output directory
        #[arg(short, long, default_value = "test_data")]
        output: PathBuf,

        /// Edge length of the cubic volume in voxels
        #[arg(long, default_value_t = 32)]
        size: usize,

        /// Constant LPS displacement dx,dy,dz in mm written to the shift field
        #[arg(long, default_value = "2,0,0", value_parser = parse_shift, allow_hyphen_values = true)]
        shift: [f32; 3],
    },

    /// Remove generated phantom files
    Clean {
        /// Directory containing generated files
        #[arg(short, long, default_value = "test_data")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenPhantom { output, size, shift } => {
            gen_phantom(&output, size, shift)?;
        }
        Commands::Clean { output } => {
            clean(&output)?;
        }
    }

    Ok(())
}

fn parse_shift(text: &str) -> Result<[f32; 3]> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid shift '{text}'"))?;
    match values.as_slice() {
        [dx, dy, dz] => Ok([*dx, *dy, *dz]),
        _ => bail!("Shift '{}' must have 3 components, found {}", text, values.len()),
    }
}

fn gen_phantom(output: &Path, size: usize, shift: [f32; 3]) -> Result<()> {
    if size < 4 {
        bail!("Phantom size must be at least 4, got {}", size);
    }
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    // Centred cube covering the middle half of each axis
    let lo = size / 4;
    let hi = size - size / 4;
    let phantom = Array3::from_shape_fn((size, size, size), |(x, y, z)| {
        let inside = [x, y, z].iter().all(|&i| i >= lo && i < hi);
        if inside { 100.0f32 } else { 0.0 }
    });
    let path = output.join(PHANTOM_FILE);
    WriterOptions::new(&path)
        .write_nifti(&phantom)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), size, "wrote phantom");

    write_constant_field(&output.join(SHIFT_FILE), size, shift)?;
    write_constant_field(&output.join(ZERO_FILE), size, [0.0; 3])?;

    println!(
        "Try: cargo run -p dfwarp-cli -- {} {} {} --count-voxels",
        output.join(PHANTOM_FILE).display(),
        output.join(SHIFT_FILE).display(),
        output.join("warped.nii.gz").display()
    );
    Ok(())
}

/// Write an `[X, Y, Z, 1, 3]` vector image holding `shift` at every voxel.
fn write_constant_field(path: &Path, size: usize, shift: [f32; 3]) -> Result<()> {
    let field = Array::from_shape_fn((size, size, size, 1, 3), |(_, _, _, _, c)| shift[c]);
    let header = NiftiHeader {
        intent_code: NIFTI_INTENT_VECTOR,
        ..NiftiHeader::default()
    };
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&field)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), ?shift, "wrote displacement field");
    Ok(())
}

fn clean(output: &Path) -> Result<()> {
    if !output.exists() {
        warn!("Directory does not exist: {}", output.display());
        return Ok(());
    }
    for name in [PHANTOM_FILE, SHIFT_FILE, ZERO_FILE] {
        let path = output.join(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            info!("Removed {}", path.display());
        }
    }
    Ok(())
}
