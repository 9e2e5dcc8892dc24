pub mod error;
pub mod spatial;
pub mod image;
pub mod interpolation;
pub mod transform;
pub mod filter;
pub mod settings;

pub use error::{Result, WarpError};
pub use image::{Image, ImageMetadata, ImageRegion};
pub use spatial::{Point, Vector, Spacing, Direction};
pub use settings::{InterpolationMode, WarpMethod, WarpSettings};
