//! Filterer Core - Basic data structures for image filtering
//!
//! This crate provides the fundamental data structures used throughout
//! the Image Filterer workspace:
//!
//! - [`RasterImage`] / [`RasterImageMut`] - The image container (immutable / mutable)
//! - [`color`] - Packing and unpacking of 32-bit ARGB pixels
//! - [`Error`] / [`Result`] - The core error type

pub mod error;
pub mod image;

pub use color::Argb;
pub use error::{Error, Result};
pub use image::{CompareResult, RasterImage, RasterImageMut};

/// Color channel helpers for 32-bit ARGB pixels.
///
/// # Pixel format
///
/// Pixels are stored as `0xAARRGGBB`: alpha in bits 24-31, red in 16-23,
/// green in 8-15 and blue in 0-7.
///
/// Extracting the channels and composing them again reproduces the
/// original value bit for bit.
pub mod color {
    /// Shift amounts for extracting color channels
    pub const ALPHA_SHIFT: u32 = 24;
    pub const RED_SHIFT: u32 = 16;
    pub const GREEN_SHIFT: u32 = 8;
    pub const BLUE_SHIFT: u32 = 0;

    /// Mask applied to a channel before and after shifting
    pub const CHANNEL_MASK: u32 = 0xff;

    /// Fully opaque black.
    pub const OPAQUE_BLACK: u32 = 0xff00_0000;

    /// Extract alpha component from a 32-bit pixel.
    #[inline]
    pub fn alpha(pixel: u32) -> u8 {
        ((pixel >> ALPHA_SHIFT) & CHANNEL_MASK) as u8
    }

    /// Extract red component from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & CHANNEL_MASK) as u8
    }

    /// Extract green component from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & CHANNEL_MASK) as u8
    }

    /// Extract blue component from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & CHANNEL_MASK) as u8
    }

    /// Pack four channel values into a pixel.
    ///
    /// Each channel is masked to its low 8 bits before packing, so
    /// out-of-range values are silently truncated (`0x1ff` packs as `0xff`).
    /// Callers that need saturation must clamp beforehand.
    #[inline]
    pub fn compose(red: u32, green: u32, blue: u32, alpha: u32) -> u32 {
        ((alpha & CHANNEL_MASK) << ALPHA_SHIFT)
            | ((red & CHANNEL_MASK) << RED_SHIFT)
            | ((green & CHANNEL_MASK) << GREEN_SHIFT)
            | ((blue & CHANNEL_MASK) << BLUE_SHIFT)
    }

    /// Compose a 32-bit ARGB pixel from bytes.
    #[inline]
    pub fn compose_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
        compose(r as u32, g as u32, b as u32, a as u32)
    }

    /// Compose an opaque 32-bit pixel (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        compose_argb(255, r, g, b)
    }

    /// Extract `(r, g, b, a)` from a 32-bit pixel.
    #[inline]
    pub fn extract_rgba(pixel: u32) -> (u8, u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel), alpha(pixel))
    }

    /// Split a pixel into its four channels.
    #[inline]
    pub fn decompose(pixel: u32) -> Argb {
        Argb {
            red: red(pixel) as u32,
            green: green(pixel) as u32,
            blue: blue(pixel) as u32,
            alpha: alpha(pixel) as u32,
        }
    }

    /// A pixel split into separate channels.
    ///
    /// Channels are held as `u32` so that sums and averages can be computed
    /// without intermediate casts; [`Argb::pack`] applies the same masking
    /// policy as [`compose`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Argb {
        pub red: u32,
        pub green: u32,
        pub blue: u32,
        pub alpha: u32,
    }

    impl Argb {
        /// Create a decomposed color.
        pub fn new(red: u32, green: u32, blue: u32, alpha: u32) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Pack the channels back into a 32-bit pixel.
        #[inline]
        pub fn pack(self) -> u32 {
            compose(self.red, self.green, self.blue, self.alpha)
        }
    }

    impl From<u32> for Argb {
        fn from(pixel: u32) -> Self {
            decompose(pixel)
        }
    }

    impl From<Argb> for u32 {
        fn from(argb: Argb) -> Self {
            argb.pack()
        }
    }

}
