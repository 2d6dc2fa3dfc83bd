//! PNG image format support

use crate::{IoError, IoResult};
use filterer_core::{RasterImage, color};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
///
/// Every color type is normalized to 8-bit channels before conversion:
/// palettes and low bit depths are expanded, `tRNS` becomes an alpha
/// channel and 16-bit samples keep their high byte.
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<RasterImage> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };

    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != BitDepth::Eight {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNG output depth: {:?}",
            bit_depth
        )));
    }

    let samples = match color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        ColorType::Indexed => {
            return Err(IoError::UnsupportedFormat(
                "indexed PNG was not expanded".to_string(),
            ));
        }
    };

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];
    let needed = bytes_per_row * height as usize;
    if data.len() < needed || bytes_per_row < width as usize * samples {
        return Err(IoError::InvalidData(format!(
            "PNG frame holds {} bytes, {}x{} image needs {}",
            data.len(),
            width,
            height,
            needed
        )));
    }

    let pix = RasterImage::from_fn(width, height, |x, y| {
        let idx = y as usize * bytes_per_row + x as usize * samples;
        let px = &data[idx..idx + samples];
        match samples {
            1 => color::compose_rgb(px[0], px[0], px[0]),
            2 => color::compose_argb(px[1], px[0], px[0], px[0]),
            3 => color::compose_rgb(px[0], px[1], px[2]),
            _ => color::compose_argb(px[3], px[0], px[1], px[2]),
        }
    })?;

    Ok(pix)
}

/// Write a PNG image
///
/// Always written as 8-bit RGBA so that alpha survives a round trip.
pub fn write_png<W: Write>(pix: &RasterImage, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let mut data = Vec::with_capacity(pix.data().len() * 4);
    for &pixel in pix.data() {
        let (r, g, b, a) = color::extract_rgba(pixel);
        data.extend_from_slice(&[r, g, b, a]);
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;
    writer
        .finish()
        .map_err(|e| IoError::EncodeError(format!("PNG finish error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_raw(width: u32, height: u32, color: ColorType, depth: BitDepth, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(depth);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn test_png_roundtrip_keeps_alpha() {
        let pix = RasterImage::from_pixels(
            2,
            2,
            vec![0xff11_2233, 0x8044_5566, 0x0000_0000, 0x7fff_ffff],
        )
        .unwrap();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();
        assert_eq!(back, pix);
    }

    #[test]
    fn test_read_gray8() {
        let bytes = encode_raw(2, 1, ColorType::Grayscale, BitDepth::Eight, &[0x10, 0xf0]);
        let pix = read_png(Cursor::new(bytes)).unwrap();
        assert_eq!(pix.data(), &[0xff10_1010, 0xfff0_f0f0]);
    }

    #[test]
    fn test_read_gray_alpha() {
        let bytes = encode_raw(1, 1, ColorType::GrayscaleAlpha, BitDepth::Eight, &[0x40, 0x80]);
        let pix = read_png(Cursor::new(bytes)).unwrap();
        assert_eq!(pix.data(), &[0x8040_4040]);
    }

    #[test]
    fn test_read_rgb16_keeps_high_byte() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc];
        let bytes = encode_raw(1, 1, ColorType::Rgb, BitDepth::Sixteen, &data);
        let pix = read_png(Cursor::new(bytes)).unwrap();
        assert_eq!(pix.data(), &[0xff12_569a]);
    }

    #[test]
    fn test_read_gray1_expands() {
        // 0b1000_0000: first pixel white, second black
        let bytes = encode_raw(2, 1, ColorType::Grayscale, BitDepth::One, &[0x80]);
        let pix = read_png(Cursor::new(bytes)).unwrap();
        assert_eq!(pix.data(), &[0xffff_ffff, 0xff00_0000]);
    }

    #[test]
    fn test_read_garbage_is_decode_error() {
        let result = read_png(Cursor::new(b"not a png at all".to_vec()));
        assert!(matches!(result, Err(IoError::DecodeError(_))));
    }
}
