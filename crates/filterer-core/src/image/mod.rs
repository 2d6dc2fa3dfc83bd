//! RasterImage - The image container
//!
//! `RasterImage` holds a rectangular grid of packed 32-bit ARGB pixels.
//!
//! # Pixel layout
//!
//! - One `u32` per pixel, rows stored top to bottom
//! - No row padding: `data.len() == width * height`
//! - Channel order inside a pixel is ARGB (see [`crate::color`])
//!
//! # Ownership model
//!
//! `RasterImage` uses `Arc` for efficient cloning (shared ownership), so an
//! image can be handed to another thread or kept as "the current frame"
//! without copying. To modify pixel data, convert to `RasterImageMut` via
//! [`RasterImage::try_into_mut`] or [`RasterImage::to_mut`], then convert
//! back with `Into<RasterImage>`.

mod access;
pub mod compare;

pub use compare::CompareResult;

use crate::error::{Error, Result};
use std::sync::Arc;

/// Internal image data
#[derive(Debug, PartialEq, Eq)]
struct ImageData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Packed ARGB pixels, row-major
    data: Vec<u32>,
}

impl ImageData {
    fn filled(width: u32, height: u32, color: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(Error::InvalidDimension { width, height })?;
        Ok(Self {
            width,
            height,
            data: vec![color; len],
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Main image container
///
/// # Examples
///
/// ```
/// use filterer_core::RasterImage;
///
/// let image = RasterImage::new(640, 480).unwrap();
/// assert_eq!(image.width(), 640);
/// assert_eq!(image.height(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct RasterImage {
    inner: Arc<ImageData>,
}

impl RasterImage {
    /// Create a new image with every pixel set to `0` (transparent black).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_filled(width, height, 0)
    }

    /// Create a new image with every pixel set to `color`.
    pub fn new_filled(width: u32, height: u32, color: u32) -> Result<Self> {
        Ok(RasterImage {
            inner: Arc::new(ImageData::filled(width, height, color)?),
        })
    }

    /// Wrap an existing row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for a zero-sized image and
    /// [`Error::BufferLength`] if `data` does not hold exactly
    /// `width * height` pixels.
    pub fn from_pixels(width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(RasterImage {
            inner: Arc::new(ImageData {
                width,
                height,
                data,
            }),
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Result<Self> {
        let mut data = ImageData::filled(width, height, 0)?;
        for y in 0..height {
            for x in 0..width {
                let idx = data.index(x, y);
                data.data[idx] = f(x, y);
            }
        }
        Ok(RasterImage {
            inner: Arc::new(data),
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Get raw access to the pixel data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the number of strong references to this image.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Get the pixels of one row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        assert!(y < self.inner.height, "row {y} out of bounds");
        let start = self.inner.index(0, y);
        &self.inner.data[start..start + self.inner.width as usize]
    }

    /// Create a new image with the same dimensions, every pixel set to 0.
    pub fn create_template(&self) -> Self {
        RasterImage {
            inner: Arc::new(ImageData {
                width: self.inner.width,
                height: self.inner.height,
                data: vec![0u32; self.inner.data.len()],
            }),
        }
    }

    /// Check if two images have the same width and height.
    pub fn sizes_equal(&self, other: &RasterImage) -> bool {
        self.inner.width == other.inner.width && self.inner.height == other.inner.height
    }

    /// Check whether both handles point at the same pixel buffer.
    pub fn shares_data_with(&self, other: &RasterImage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a deep copy of this image.
    ///
    /// Unlike `clone()` which shares data via Arc, this creates
    /// a completely independent copy.
    pub fn deep_clone(&self) -> Self {
        RasterImage {
            inner: Arc::new(ImageData {
                width: self.inner.width,
                height: self.inner.height,
                data: self.inner.data.clone(),
            }),
        }
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<RasterImageMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(RasterImageMut { inner: data }),
            Err(arc) => Err(RasterImage { inner: arc }),
        }
    }

    /// Create a mutable copy of this image.
    pub fn to_mut(&self) -> RasterImageMut {
        RasterImageMut {
            inner: ImageData {
                width: self.inner.width,
                height: self.inner.height,
                data: self.inner.data.clone(),
            },
        }
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for RasterImage {}

/// Mutable image
///
/// Allows modification of pixel data. Convert back to an immutable
/// [`RasterImage`] using `Into<RasterImage>`.
#[derive(Debug)]
pub struct RasterImageMut {
    inner: ImageData,
}

impl RasterImageMut {
    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get raw access to the pixel data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to the pixel data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Get mutable access to a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        assert!(y < self.inner.height, "row {y} out of bounds");
        let start = self.inner.index(0, y);
        let width = self.inner.width as usize;
        &mut self.inner.data[start..start + width]
    }

}

impl From<RasterImageMut> for RasterImage {
    fn from(image: RasterImageMut) -> Self {
        RasterImage {
            inner: Arc::new(image.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_creation() {
        let image = RasterImage::new(100, 200).unwrap();
        assert_eq!(image.dimensions(), (100, 200));
        assert_eq!(image.data().len(), 20_000);
        assert!(image.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            RasterImage::new(0, 10),
            Err(Error::InvalidDimension {
                width: 0,
                height: 10
            })
        ));
        assert!(RasterImage::new(10, 0).is_err());
    }

    #[test]
    fn test_from_pixels_checks_length() {
        let err = RasterImage::from_pixels(3, 2, vec![0; 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferLength {
                expected: 6,
                actual: 5,
                ..
            }
        ));
        assert!(RasterImage::from_pixels(3, 2, vec![7; 6]).is_ok());
    }

    #[test]
    fn test_from_fn_row_major() {
        let image = RasterImage::from_fn(3, 2, |x, y| y * 10 + x).unwrap();
        assert_eq!(image.data(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(image.row_data(1), &[10, 11, 12]);
    }

    #[test]
    fn test_clone_shares_data() {
        let image1 = RasterImage::new(10, 10).unwrap();
        let image2 = image1.clone();
        assert_eq!(image1.ref_count(), 2);
        assert!(image1.shares_data_with(&image2));
    }

    #[test]
    fn test_deep_clone() {
        let image1 = RasterImage::new_filled(10, 10, 0xff12_3456).unwrap();
        let image2 = image1.deep_clone();
        assert_eq!(image1.ref_count(), 1);
        assert!(!image1.shares_data_with(&image2));
        assert_eq!(image1, image2);
    }

    #[test]
    fn test_try_into_mut() {
        let image = RasterImage::new(10, 10).unwrap();
        let mut image_mut = image.try_into_mut().unwrap();
        image_mut.data_mut().fill(0xff00_00ff);
        let image: RasterImage = image_mut.into();
        assert_eq!(image.data()[0], 0xff00_00ff);

        let shared = image.clone();
        assert!(image.try_into_mut().is_err());
        drop(shared);
    }

    #[test]
    fn test_create_template() {
        let image = RasterImage::new_filled(4, 3, 0xffff_ffff).unwrap();
        let template = image.create_template();
        assert!(template.sizes_equal(&image));
        assert!(template.data().iter().all(|&p| p == 0));
    }
}
