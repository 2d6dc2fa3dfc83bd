//! filterer-filter - Neighborhood averaging blur
//!
//! This crate provides:
//!
//! - [`Neighborhood`] sampling of the 3x3 window around a pixel, with
//!   out-of-image rows and columns excluded
//! - Averaging strategies ([`PackedAverage`], [`ChannelAverage`]) that
//!   produce bit-identical results by different means
//! - [`blur`] / [`blur_repeated`] to apply one or more passes

pub mod average;
pub mod blur;
mod error;
pub mod neighborhood;

pub use average::{AverageMethod, AveragingStrategy, ChannelAverage, PackedAverage, integer_average};
pub use blur::{blur, blur_repeated};
pub use error::{FilterError, FilterResult};
pub use neighborhood::Neighborhood;
