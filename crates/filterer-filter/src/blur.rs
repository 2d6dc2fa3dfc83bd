//! Neighborhood averaging blur
//!
//! Every output pixel is the strategy's average of the source pixel's
//! [`Neighborhood`]. Samples are always read from the source, never from
//! partially written output, so one pass is independent of scan order.

use crate::{AveragingStrategy, Neighborhood};
use filterer_core::RasterImage;

/// Apply one blur pass.
///
/// Returns a new image of the same size; `source` is untouched. A uniform
/// image is a fixed point.
pub fn blur<S: AveragingStrategy + ?Sized>(source: &RasterImage, strategy: &S) -> RasterImage {
    let (w, h) = source.dimensions();
    let mut out = source.create_template().try_into_mut().unwrap();

    for y in 0..h {
        let row = out.row_data_mut(y);
        for (x, px) in (0..w).zip(row.iter_mut()) {
            *px = strategy.average(&Neighborhood::sample(source, x, y));
        }
    }

    out.into()
}

/// Apply `passes` blur passes, each reading the previous pass's output.
///
/// Zero passes returns `source` itself.
pub fn blur_repeated<S: AveragingStrategy + ?Sized>(
    source: &RasterImage,
    strategy: &S,
    passes: u32,
) -> RasterImage {
    let mut current = source.clone();
    for pass in 1..=passes {
        current = blur(&current, strategy);
        log::debug!("{} blur pass {}/{} done", strategy.name(), pass, passes);
    }
    current
}
