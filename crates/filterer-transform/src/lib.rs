//! filterer-transform - Geometric transformations for Image Filterer
//!
//! Scaling of ARGB images for the zoomable views and for fitting large
//! images into a bounded preview:
//!
//! - Sampling (nearest neighbor)
//! - Linear interpolation (for enlarging)
//! - Area mapping (for shrinking, anti-aliased)

mod error;
pub mod scale;

pub use error::{TransformError, TransformResult};
pub use scale::{ScaleMethod, scale, scale_by_sampling, scale_to_max_size, scale_to_size};
