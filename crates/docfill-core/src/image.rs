//! Image header sniffing and aspect-fit sizing.

use std::io::Cursor;

use image::ImageReader;

use crate::error::PackageError;

/// EMU (English Metric Units) per pixel at 96 DPI.
pub const EMU_PER_PIXEL: u64 = 9525;

/// Supported raster formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// Image bytes with their detected format and native pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    /// Detect format and native dimensions from the encoded bytes.
    ///
    /// Only the header is decoded. Formats other than PNG, JPEG and GIF are
    /// rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackageError> {
        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|_| PackageError::UnsupportedImage)?;
        let format = match reader.format() {
            Some(image::ImageFormat::Png) => ImageFormat::Png,
            Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(image::ImageFormat::Gif) => ImageFormat::Gif,
            _ => return Err(PackageError::UnsupportedImage),
        };
        let (width, height) = reader
            .into_dimensions()
            .map_err(|_| PackageError::UnsupportedImage)?;

        if width == 0 || height == 0 {
            return Err(PackageError::UnsupportedImage);
        }

        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }
}

/// Inline image reference placed into a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Relationship id returned by image registration.
    pub relationship_id: String,
    /// Placeholder name, used as the drawing's description.
    pub name: String,
    pub width_emu: u64,
    pub height_emu: u64,
}

/// Scale `native` to fit inside `max`, preserving aspect ratio.
///
/// Both axes are rounded and clamped to at least one pixel.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_within(native: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (width, height) = native;
    let (max_width, max_height) = max;
    if width == 0 || height == 0 {
        return (max_width.max(1), max_height.max(1));
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let scaled = |v: u32| (f64::from(v) * scale).round().max(1.0) as u32;
    (scaled(width), scaled(height))
}

/// Convert a pixel length to EMU.
pub fn pixels_to_emu(pixels: u32) -> u64 {
    u64::from(pixels) * EMU_PER_PIXEL
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    /// Encoded PNG of the given dimensions.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, image::ImageFormat::Png)
    }

    #[test]
    fn test_png_header() {
        let image = ImageData::from_bytes(png_bytes(640, 480)).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width, image.height), (640, 480));
    }

    #[test]
    fn test_jpeg_header() {
        let image = ImageData::from_bytes(encoded(64, 48, image::ImageFormat::Jpeg)).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!((image.width, image.height), (64, 48));
        assert_eq!(image.format.content_type(), "image/jpeg");
    }

    #[test]
    fn test_gif_header() {
        let image = ImageData::from_bytes(encoded(30, 20, image::ImageFormat::Gif)).unwrap();
        assert_eq!(image.format, ImageFormat::Gif);
        assert_eq!((image.width, image.height), (30, 20));
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let result = ImageData::from_bytes(b"not an image".to_vec());
        assert!(matches!(result, Err(PackageError::UnsupportedImage)));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let mut bytes = png_bytes(10, 10);
        bytes.truncate(12);
        let result = ImageData::from_bytes(bytes);
        assert!(matches!(result, Err(PackageError::UnsupportedImage)));
    }

    #[test]
    fn test_fit_within_downscale() {
        assert_eq!(fit_within((1600, 1200), (800, 600)), (800, 600));
        assert_eq!(fit_within((1000, 500), (800, 600)), (800, 400));
    }

    #[test]
    fn test_fit_within_upscale_keeps_aspect() {
        assert_eq!(fit_within((100, 50), (400, 400)), (400, 200));
    }

    #[test]
    fn test_fit_within_clamps_to_one() {
        assert_eq!(fit_within((10_000, 1), (100, 100)), (100, 1));
    }

    #[test]
    fn test_pixels_to_emu() {
        assert_eq!(pixels_to_emu(96), 914_400);
    }
}
