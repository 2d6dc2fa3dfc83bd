//! 3x3 neighborhood sampling
//!
//! The window around a pixel never reaches outside the image: a column or
//! row that would fall off an edge is dropped as a whole instead of being
//! clamped or padded. Interior pixels get 9 samples, edge pixels 6 and
//! corner pixels 4.

use filterer_core::RasterImage;
use std::ops::Deref;

/// The samples around one pixel, in row-major order.
///
/// Backed by a fixed array so sampling does not allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    values: [u32; 9],
    len: usize,
}

impl Neighborhood {
    /// Sample the neighborhood of `(x, y)` in `image`.
    ///
    /// The center pixel is always included.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn sample(image: &RasterImage, x: u32, y: u32) -> Self {
        let (w, h) = image.dimensions();
        assert!(
            x < w && y < h,
            "neighborhood center ({x}, {y}) outside {w}x{h} image"
        );

        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(w - 1);
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);

        let mut values = [0u32; 9];
        let mut len = 0;
        for sy in y0..=y1 {
            let row = &image.row_data(sy)[x0 as usize..=x1 as usize];
            values[len..len + row.len()].copy_from_slice(row);
            len += row.len();
        }
        Self { values, len }
    }

    /// The sampled values.
    pub fn values(&self) -> &[u32] {
        &self.values[..self.len]
    }
}

impl Deref for Neighborhood {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        self.values()
    }
}
