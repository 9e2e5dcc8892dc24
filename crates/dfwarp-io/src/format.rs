//! Image file format detection.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Single-file NIfTI-1 (`.nii`).
    Nifti,
    /// Gzip-compressed single-file NIfTI-1 (`.nii.gz`).
    NiftiGz,
    /// NIfTI-1 header/image pair (`.hdr` + `.img`).
    NiftiPair,
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unsupported image format for {0} (expected .nii, .nii.gz, .hdr or .img)")]
    UnsupportedFormat(PathBuf),
}

impl ImageFormat {
    /// Detect the format from the file name, ignoring case.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".nii.gz") {
            Ok(Self::NiftiGz)
        } else if name.ends_with(".nii") {
            Ok(Self::Nifti)
        } else if name.ends_with(".hdr") || name.ends_with(".img") {
            Ok(Self::NiftiPair)
        } else {
            Err(FormatError::UnsupportedFormat(path.to_path_buf()))
        }
    }
}

/// Path to hand to the NIfTI reader or writer.
///
/// A header/image pair is addressed through its `.hdr` file; the library
/// places the voxel data in the `.img` next to it.
pub fn nifti_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let is_image_file = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("img"));
    if is_image_file {
        path.with_extension("hdr")
    } else {
        path.to_path_buf()
    }
}
