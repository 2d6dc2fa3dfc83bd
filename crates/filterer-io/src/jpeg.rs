//! JPEG image format support
//!
//! Reads JPEG images using the `jpeg-decoder` crate. Grayscale, RGB and
//! CMYK streams are decoded to opaque 32-bit ARGB.
//!
//! JPEG *writing* is not provided: `jpeg-decoder` is decode-only and saved
//! output is always PNG.

use crate::{IoError, IoResult};
use filterer_core::{RasterImage, color};
use jpeg_decoder::{Decoder, PixelFormat};
use std::io::Read;

/// Read a JPEG image from a reader.
///
/// The reader must be positioned at the JPEG SOI marker (`FF D8`).
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<RasterImage> {
    let mut decoder = Decoder::new(reader);
    let data = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing after decode".to_string()))?;

    let width = info.width as u32;
    let height = info.height as u32;
    let samples = match info.pixel_format {
        PixelFormat::L8 => 1,
        PixelFormat::L16 => 2,
        PixelFormat::RGB24 => 3,
        PixelFormat::CMYK32 => 4,
        #[allow(unreachable_patterns)]
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported JPEG pixel format: {:?}",
                other
            )));
        }
    };

    let needed = width as usize * height as usize * samples;
    if data.len() < needed {
        return Err(IoError::InvalidData(format!(
            "JPEG data holds {} bytes, {}x{} image needs {}",
            data.len(),
            width,
            height,
            needed
        )));
    }

    let pix = RasterImage::from_fn(width, height, |x, y| {
        let idx = (y as usize * width as usize + x as usize) * samples;
        let px = &data[idx..idx + samples];
        match samples {
            // 16-bit luma is big-endian; px[0] is the high byte
            1 | 2 => color::compose_rgb(px[0], px[0], px[0]),
            3 => color::compose_rgb(px[0], px[1], px[2]),
            _ => {
                let k = px[3];
                color::compose_rgb(
                    cmyk_channel(px[0], k),
                    cmyk_channel(px[1], k),
                    cmyk_channel(px[2], k),
                )
            }
        }
    })?;

    Ok(pix)
}

#[inline]
fn cmyk_channel(c: u8, k: u8) -> u8 {
    ((255 - c as u32) * (255 - k as u32) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cmyk_channel() {
        assert_eq!(cmyk_channel(0, 0), 255);
        assert_eq!(cmyk_channel(255, 0), 0);
        assert_eq!(cmyk_channel(0, 255), 0);
    }

    #[test]
    fn test_truncated_stream_is_decode_error() {
        let result = read_jpeg(Cursor::new(vec![0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(matches!(result, Err(IoError::DecodeError(_))));
    }
}
