//! Transform types and operations.
//!
//! This module provides the transform trait and the dense displacement
//! field transform used for deformable warping.

pub mod trait_;
pub mod displacement_field;

pub use trait_::Transform;
pub use displacement_field::DisplacementFieldTransform3D;
