//! Image scaling operations
//!
//! Provides various scaling algorithms including:
//! - Linear interpolation (for enlarging)
//! - Sampling (nearest neighbor)
//! - Area mapping (for shrinking with anti-aliasing)
//!
//! All four ARGB channels are scaled independently; alpha is treated like
//! any color channel.

use crate::{TransformError, TransformResult};
use filterer_core::{Argb, RasterImage, color};

/// Scaling method to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMethod {
    /// Nearest-neighbor sampling (fastest, pixelated results)
    Sampling,
    /// Bilinear interpolation (good for enlarging)
    Linear,
    /// Area mapping (best for shrinking, anti-aliased)
    AreaMap,
    /// Area mapping when shrinking along either axis, linear otherwise
    #[default]
    Auto,
}

/// Scale an image by the given factors
///
/// The output is `max(1, trunc(width * scale_x))` by
/// `max(1, trunc(height * scale_y))`.
///
/// # Arguments
/// * `pix` - Input image
/// * `scale_x` - Horizontal scale factor (e.g., 2.0 = double width)
/// * `scale_y` - Vertical scale factor
/// * `method` - Scaling algorithm to use
///
/// # Errors
///
/// [`TransformError::InvalidScaleFactor`] if a factor is not a positive
/// finite number.
pub fn scale(
    pix: &RasterImage,
    scale_x: f32,
    scale_y: f32,
    method: ScaleMethod,
) -> TransformResult<RasterImage> {
    check_factor(scale_x)?;
    check_factor(scale_y)?;
    let width = scaled_length(pix.width(), scale_x);
    let height = scaled_length(pix.height(), scale_y);
    scale_to_dims(pix, width, height, method)
}

/// Scale an image to a specific size
///
/// A zero `width` or `height` is derived from the other one so that the
/// aspect ratio is kept.
///
/// # Arguments
/// * `pix` - Input image
/// * `width` - Target width (0 to maintain aspect ratio)
/// * `height` - Target height (0 to maintain aspect ratio)
pub fn scale_to_size(pix: &RasterImage, width: u32, height: u32) -> TransformResult<RasterImage> {
    let (w, h) = pix.dimensions();
    let (width, height) = match (width, height) {
        (0, 0) => {
            return Err(TransformError::InvalidParameters(
                "width and height cannot both be 0".to_string(),
            ));
        }
        (0, height) => (proportional(w, height, h), height),
        (width, 0) => (width, proportional(h, width, w)),
        dims => dims,
    };
    scale_to_dims(pix, width, height, ScaleMethod::Auto)
}

/// Scale an image using nearest-neighbor sampling
///
/// # Arguments
/// * `pix` - Input image
/// * `scale_x` - Horizontal scale factor
/// * `scale_y` - Vertical scale factor
pub fn scale_by_sampling(
    pix: &RasterImage,
    scale_x: f32,
    scale_y: f32,
) -> TransformResult<RasterImage> {
    scale(pix, scale_x, scale_y, ScaleMethod::Sampling)
}

/// Fit an image inside a `size` x `size` box.
///
/// Images that already fit are returned as is (sharing their data).
/// Otherwise the longer side becomes exactly `size` and the shorter side is
/// scaled by the same ratio, truncated and at least 1.
pub fn scale_to_max_size(pix: &RasterImage, size: u32) -> TransformResult<RasterImage> {
    if size == 0 {
        return Err(TransformError::InvalidParameters(
            "maximum size must be positive".to_string(),
        ));
    }
    let (w, h) = pix.dimensions();
    if w <= size && h <= size {
        return Ok(pix.clone());
    }
    let (width, height) = if w >= h {
        (size, proportional(h, size, w))
    } else {
        (proportional(w, size, h), size)
    };
    scale_to_dims(pix, width, height, ScaleMethod::Auto)
}

fn check_factor(factor: f32) -> TransformResult<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(TransformError::InvalidScaleFactor(format!(
            "{factor} (must be positive and finite)"
        )))
    }
}

fn scaled_length(len: u32, factor: f32) -> u32 {
    let scaled = (len as f64 * factor as f64).trunc();
    if scaled < 1.0 {
        1
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// `len * num / den`, truncated, at least 1.
fn proportional(len: u32, num: u32, den: u32) -> u32 {
    ((len as u64 * num as u64 / den as u64) as u32).max(1)
}

fn scale_to_dims(
    pix: &RasterImage,
    width: u32,
    height: u32,
    method: ScaleMethod,
) -> TransformResult<RasterImage> {
    if pix.dimensions() == (width, height) {
        return Ok(pix.clone());
    }

    let method = match method {
        ScaleMethod::Auto if width < pix.width() || height < pix.height() => ScaleMethod::AreaMap,
        ScaleMethod::Auto => ScaleMethod::Linear,
        m => m,
    };
    log::debug!(
        "scaling {}x{} -> {}x{} ({:?})",
        pix.width(),
        pix.height(),
        width,
        height,
        method
    );

    match method {
        ScaleMethod::Sampling => scale_sampling(pix, width, height),
        ScaleMethod::Linear => scale_linear(pix, width, height),
        _ => scale_area_map(pix, width, height),
    }
}

fn scale_sampling(pix: &RasterImage, width: u32, height: u32) -> TransformResult<RasterImage> {
    let (w, h) = pix.dimensions();
    let rx = w as f64 / width as f64;
    let ry = h as f64 / height as f64;
    let src_x: Vec<u32> = (0..width)
        .map(|dx| (((dx as f64 + 0.5) * rx) as u32).min(w - 1))
        .collect();

    Ok(RasterImage::from_fn(width, height, |dx, dy| {
        let sy = (((dy as f64 + 0.5) * ry) as u32).min(h - 1);
        pix.get_pixel_unchecked(src_x[dx as usize], sy)
    })?)
}

/// Source position and blend weight for one output coordinate.
struct Tap {
    lo: u32,
    hi: u32,
    t: f64,
}

fn linear_taps(src_len: u32, dst_len: u32) -> Vec<Tap> {
    let ratio = src_len as f64 / dst_len as f64;
    let max = (src_len - 1) as f64;
    (0..dst_len)
        .map(|d| {
            let f = ((d as f64 + 0.5) * ratio - 0.5).clamp(0.0, max);
            let lo = f.floor() as u32;
            Tap {
                lo,
                hi: (lo + 1).min(src_len - 1),
                t: f - lo as f64,
            }
        })
        .collect()
}

fn scale_linear(pix: &RasterImage, width: u32, height: u32) -> TransformResult<RasterImage> {
    let xs = linear_taps(pix.width(), width);
    let ys = linear_taps(pix.height(), height);

    Ok(RasterImage::from_fn(width, height, |dx, dy| {
        let tx = &xs[dx as usize];
        let ty = &ys[dy as usize];
        let p00 = color::decompose(pix.get_pixel_unchecked(tx.lo, ty.lo));
        let p10 = color::decompose(pix.get_pixel_unchecked(tx.hi, ty.lo));
        let p01 = color::decompose(pix.get_pixel_unchecked(tx.lo, ty.hi));
        let p11 = color::decompose(pix.get_pixel_unchecked(tx.hi, ty.hi));

        let blend = |f: fn(&Argb) -> u32| -> u32 {
            let top = f(&p00) as f64 * (1.0 - tx.t) + f(&p10) as f64 * tx.t;
            let bottom = f(&p01) as f64 * (1.0 - tx.t) + f(&p11) as f64 * tx.t;
            (top * (1.0 - ty.t) + bottom * ty.t).round().clamp(0.0, 255.0) as u32
        };
        color::compose(
            blend(|c| c.red),
            blend(|c| c.green),
            blend(|c| c.blue),
            blend(|c| c.alpha),
        )
    })?)
}

/// Source pixels overlapped by each output coordinate, with coverage.
fn area_spans(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f64)>> {
    let ratio = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * ratio;
            let end = ((d + 1) as f64 * ratio).min(src_len as f64);
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).clamp(first + 1, src_len);
            (first..last)
                .filter_map(|s| {
                    let cover = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (cover > 0.0).then_some((s, cover))
                })
                .collect()
        })
        .collect()
}

fn scale_area_map(pix: &RasterImage, width: u32, height: u32) -> TransformResult<RasterImage> {
    let xs = area_spans(pix.width(), width);
    let ys = area_spans(pix.height(), height);

    Ok(RasterImage::from_fn(width, height, |dx, dy| {
        let mut sum = [0.0f64; 4];
        let mut total = 0.0f64;
        for &(sy, wy) in &ys[dy as usize] {
            for &(sx, wx) in &xs[dx as usize] {
                let weight = wx * wy;
                let c = color::decompose(pix.get_pixel_unchecked(sx, sy));
                sum[0] += c.red as f64 * weight;
                sum[1] += c.green as f64 * weight;
                sum[2] += c.blue as f64 * weight;
                sum[3] += c.alpha as f64 * weight;
                total += weight;
            }
        }
        let avg = |v: f64| (v / total).round().clamp(0.0, 255.0) as u32;
        color::compose(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]))
    })?)
}
