//! Pixel access functions
//!
//! Low-level functions for getting and setting individual pixels.
//! Checked accessors return `Option`/`Result`; the `_unchecked` variants
//! are for inner loops whose bounds are already established and panic on
//! out-of-range coordinates.

use super::{RasterImage, RasterImageMut};
use crate::color::{self, Argb};
use crate::error::{Error, Result};

impl RasterImage {
    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.inner.width || y >= self.inner.height {
            return None;
        }
        Some(self.inner.data[self.inner.index(x, y)])
    }

    /// Get a pixel value without bounds checking the coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the computed index falls outside the buffer. A too-large
    /// `x` on a row other than the last silently reads the next row, so
    /// callers must keep `x < width`.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        self.inner.data[self.inner.index(x, y)]
    }

    /// Get the decomposed channels at (x, y).
    pub fn get_argb(&self, x: u32, y: u32) -> Option<Argb> {
        self.get_pixel(x, y).map(color::decompose)
    }

    /// Get `(r, g, b, a)` at (x, y).
    pub fn get_rgba(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        self.get_pixel(x, y).map(color::extract_rgba)
    }
}

impl RasterImageMut {
    /// Get a pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.inner.width || y >= self.inner.height {
            return None;
        }
        Some(self.inner.data[self.inner.index(x, y)])
    }

    /// Get a pixel value without bounds checking the coordinates.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        self.inner.data[self.inner.index(x, y)]
    }

    /// Set a pixel value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        if x >= self.inner.width || y >= self.inner.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.inner.width,
                height: self.inner.height,
            });
        }
        let idx = self.inner.index(x, y);
        self.inner.data[idx] = val;
        Ok(())
    }

    /// Set a pixel from decomposed channels.
    pub fn set_argb(&mut self, x: u32, y: u32, argb: Argb) -> Result<()> {
        self.set_pixel(x, y, argb.pack())
    }

    /// Set an opaque RGB pixel at (x, y).
    pub fn set_rgb(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        self.set_pixel(x, y, color::compose_rgb(r, g, b))
    }
}
