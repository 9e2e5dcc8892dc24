//! NIfTI input and output for volumes and displacement fields.

pub mod format;
mod header;
pub mod nifti_io;

pub use format::{FormatError, ImageFormat};
pub use nifti_io::{read_displacement_field, read_nifti, write_displacement_field, write_nifti};
