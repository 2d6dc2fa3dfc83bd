//! Image comparison operations
//!
//! - Pixel difference counting
//! - Per-channel maximum and mean absolute difference

use super::RasterImage;
use crate::color;
use crate::error::{Error, Result};

/// Full comparison result
#[derive(Debug, Clone, PartialEq)]
pub struct CompareResult {
    /// Whether images are equal
    pub equal: bool,
    /// Number of differing pixels
    pub n_diff: u64,
    /// Largest absolute difference seen in any single channel
    pub max_channel_diff: u32,
    /// Mean absolute channel difference over all channels of all pixels
    pub mean_abs_diff: f64,
}

impl RasterImage {
    /// Compare two images channel by channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the images differ in size.
    pub fn compare(&self, other: &RasterImage) -> Result<CompareResult> {
        if !self.sizes_equal(other) {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }

        let mut n_diff = 0u64;
        let mut max_channel_diff = 0u32;
        let mut total = 0u64;

        for (&a, &b) in self.data().iter().zip(other.data()) {
            if a == b {
                continue;
            }
            n_diff += 1;
            let (ca, cb) = (color::decompose(a), color::decompose(b));
            for (x, y) in [
                (ca.red, cb.red),
                (ca.green, cb.green),
                (ca.blue, cb.blue),
                (ca.alpha, cb.alpha),
            ] {
                let d = x.abs_diff(y);
                max_channel_diff = max_channel_diff.max(d);
                total += d as u64;
            }
        }

        let samples = self.data().len() as f64 * 4.0;
        Ok(CompareResult {
            equal: n_diff == 0,
            n_diff,
            max_channel_diff,
            mean_abs_diff: total as f64 / samples,
        })
    }

    /// Count the number of pixels that differ between two images.
    pub fn count_pixel_diffs(&self, other: &RasterImage) -> Result<u64> {
        Ok(self.compare(other)?.n_diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_identical() {
        let a = RasterImage::new_filled(3, 3, 0xff10_2030).unwrap();
        let result = a.compare(&a.deep_clone()).unwrap();
        assert!(result.equal);
        assert_eq!(result.n_diff, 0);
        assert_eq!(result.mean_abs_diff, 0.0);
    }

    #[test]
    fn test_compare_single_channel_diff() {
        let a = RasterImage::new_filled(2, 1, 0xff00_0000).unwrap();
        let mut b = a.to_mut();
        b.set_pixel(1, 0, 0xff00_0008).unwrap();
        let b: RasterImage = b.into();

        let result = a.compare(&b).unwrap();
        assert!(!result.equal);
        assert_eq!(result.n_diff, 1);
        assert_eq!(result.max_channel_diff, 8);
        assert_eq!(result.mean_abs_diff, 1.0);
    }

    #[test]
    fn test_compare_size_mismatch() {
        let a = RasterImage::new(2, 2).unwrap();
        let b = RasterImage::new(2, 3).unwrap();
        assert!(matches!(
            a.count_pixel_diffs(&b),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
