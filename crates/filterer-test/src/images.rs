//! Deterministic synthetic test images

use filterer_core::{RasterImage, color};

/// An image where every pixel has the same color.
pub fn uniform(width: u32, height: u32, color: u32) -> RasterImage {
    RasterImage::new_filled(width, height, color).expect("valid test image size")
}

/// Opaque image whose red channel ramps left to right and green channel
/// ramps top to bottom; blue is fixed at 128.
pub fn gradient(width: u32, height: u32) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
        color::compose_rgb(r, g, 128)
    })
    .expect("valid test image size")
}

/// Checkerboard of `cell`-sized squares alternating between two colors.
pub fn checkerboard(width: u32, height: u32, cell: u32, a: u32, b: u32) -> RasterImage {
    let cell = cell.max(1);
    RasterImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b }
    })
    .expect("valid test image size")
}

/// Image of pseudo-random pixels (all four channels random) for a seed.
pub fn noise(width: u32, height: u32, seed: u32) -> RasterImage {
    let mut rng = SimpleRng::new(seed);
    RasterImage::from_fn(width, height, |_, _| (rng.next() >> 32) as u32)
        .expect("valid test image size")
}

/// Simple linear congruential generator for reproducible randomness
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    fn next(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }
}
