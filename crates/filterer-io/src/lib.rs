//! Filterer IO - Image file reading and writing
//!
//! Supported formats:
//! - PNG (read/write, feature `png-format`)
//! - JPEG (read only, feature `jpeg`)
//!
//! The user-facing entry points are [`load_image`], which accepts `.png`,
//! `.jpg` and `.jpeg` files, and [`save_image`], which always writes PNG.

mod error;
pub mod format;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;

pub use error::{IoError, IoResult};
pub use format::{ImageFormat, detect_format, detect_format_from_bytes};

use filterer_core::RasterImage;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

/// Extensions accepted by [`load_image`], lowercase.
pub const INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Read an image from a file, detecting the format from its content.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let file = File::open(path).map_err(IoError::Io)?;
    read_image_format(BufReader::new(file), format)
}

/// Read an image from memory, detecting the format from its content.
pub fn read_image_mem(data: &[u8]) -> IoResult<RasterImage> {
    let format = detect_format_from_bytes(data)?;
    read_image_format(Cursor::new(data), format)
}

/// Decode an image of a known format.
pub fn read_image_format<R: std::io::BufRead + std::io::Seek>(
    reader: R,
    format: ImageFormat,
) -> IoResult<RasterImage> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(reader),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg(reader),
        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(format!(
            "{:?} support not enabled",
            format
        ))),
    }
}

/// Write an image to a file in the given format.
pub fn write_image<P: AsRef<Path>>(
    pix: &RasterImage,
    path: P,
    format: ImageFormat,
) -> IoResult<()> {
    let file = File::create(path.as_ref()).map_err(IoError::Io)?;
    let mut writer = BufWriter::new(file);
    write_image_format(pix, &mut writer, format)?;
    writer.flush().map_err(IoError::Io)?;
    Ok(())
}

/// Encode an image to memory in the given format.
pub fn write_image_mem(pix: &RasterImage, format: ImageFormat) -> IoResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_image_format(pix, &mut buf, format)?;
    Ok(buf)
}

/// Encode an image to a writer in the given format.
pub fn write_image_format<W: Write>(
    #[allow(unused_variables)] pix: &RasterImage,
    #[allow(unused_variables)] writer: W,
    format: ImageFormat,
) -> IoResult<()> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::write_png(pix, writer),
        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(format!(
            "writing {:?} is not supported",
            format
        ))),
    }
}

/// Whether `path` carries one of the accepted input extensions.
pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
    ImageFormat::from_path(path).is_some()
}

/// Open an image chosen by the user.
///
/// The extension must be `.png`, `.jpg` or `.jpeg` (any case); the content
/// is then sniffed, so a PNG saved with a `.jpg` name still loads.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for other extensions or unrecognized
/// content, [`IoError::Io`] if the file cannot be read, and decode errors
/// for malformed files.
pub fn load_image<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    if !is_supported_input(path) {
        return Err(IoError::UnsupportedFormat(format!(
            "{}: expected one of {}",
            path.display(),
            INPUT_EXTENSIONS.join(", ")
        )));
    }
    let pix = read_image(path)?;
    log::info!(
        "loaded {} ({}x{})",
        path.display(),
        pix.width(),
        pix.height()
    );
    Ok(pix)
}

/// Append `.png` unless the file name already ends with it (any case).
///
/// `out` and `out.jpg` become `out.png` and `out.jpg.png`; `OUT.PNG` is
/// kept as is.
pub fn normalize_png_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let has_png = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(".png"));
    if has_png {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".png");
        PathBuf::from(name)
    }
}

/// Save an image as PNG, normalizing the file name first.
///
/// Returns the path actually written.
pub fn save_image<P: AsRef<Path>>(pix: &RasterImage, path: P) -> IoResult<PathBuf> {
    let target = normalize_png_path(path);
    write_image(pix, &target, ImageFormat::Png)?;
    log::info!(
        "saved {} ({}x{})",
        target.display(),
        pix.width(),
        pix.height()
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_png_path() {
        assert_eq!(normalize_png_path("out"), PathBuf::from("out.png"));
        assert_eq!(normalize_png_path("out.jpg"), PathBuf::from("out.jpg.png"));
        assert_eq!(normalize_png_path("OUT.PNG"), PathBuf::from("OUT.PNG"));
        assert_eq!(normalize_png_path("dir/a.Png"), PathBuf::from("dir/a.Png"));
    }

    #[test]
    fn test_is_supported_input() {
        assert!(is_supported_input("a.png"));
        assert!(is_supported_input("a.JPEG"));
        assert!(!is_supported_input("a.bmp"));
        assert!(!is_supported_input("a"));
    }

    #[test]
    fn test_load_rejects_extension_before_touching_disk() {
        let result = load_image("/nonexistent/picture.bmp");
        assert!(matches!(result, Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_image("/nonexistent/picture.png");
        assert!(matches!(result, Err(IoError::Io(_))));
    }

    #[cfg(feature = "png-format")]
    #[test]
    fn test_mem_roundtrip() {
        let pix = RasterImage::new_filled(3, 2, 0xff80_4020).unwrap();
        let bytes = write_image_mem(&pix, ImageFormat::Png).unwrap();
        assert_eq!(read_image_mem(&bytes).unwrap(), pix);
    }

    #[test]
    fn test_jpeg_write_unsupported() {
        let pix = RasterImage::new(1, 1).unwrap();
        assert!(matches!(
            write_image_mem(&pix, ImageFormat::Jpeg),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
