//! Image types and operations.
//!
//! This module provides the Image type and related functionality
//! for representing volumes with physical metadata.

pub mod image;
pub mod metadata;
pub mod grid;
pub mod region;
pub mod statistics;

pub use image::Image;
pub use metadata::ImageMetadata;
pub use grid::generate_grid_3d;
pub use region::ImageRegion;
pub use statistics::{count_positive_voxels, count_voxels_above};
