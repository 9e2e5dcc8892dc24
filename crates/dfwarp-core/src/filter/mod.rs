pub mod resample;
pub mod warp;

pub use resample::ResampleImageFilter;
pub use warp::WarpImageFilter;
