use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbaImage};
use thiserror::Error;

use crate::canvas::MAX_CANVAS_DIM;

/// File name offered to the download link.
pub const DEFAULT_EXPORT_NAME: &str = "painting.png";

#[derive(Debug, Error)]
pub enum RasterError {
    /// The imported bytes could not be decoded into a usable image.
    #[error("invalid import source: {0}")]
    InvalidImportSource(String),
    #[error("encode error: {0}")]
    Encode(#[from] ImageError),
}

// ============================================================================
// IMPORT
// ============================================================================

/// Decode any raster format the `image` crate recognises into RGBA.
///
/// Nothing is written anywhere on failure, so callers can decode first and
/// only touch the canvas once the asset is fully available.
pub fn decode_import(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    if bytes.is_empty() {
        return Err(RasterError::InvalidImportSource("empty input".into()));
    }
    let img = image::load_from_memory(bytes)
        .map_err(|e| RasterError::InvalidImportSource(e.to_string()))?
        .to_rgba8();

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(RasterError::InvalidImportSource("image has no pixels".into()));
    }
    if w > MAX_CANVAS_DIM || h > MAX_CANVAS_DIM {
        return Err(RasterError::InvalidImportSource(format!(
            "{}×{} exceeds the {} px limit",
            w, h, MAX_CANVAS_DIM
        )));
    }
    Ok(img)
}

// ============================================================================
// EXPORT
// ============================================================================

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut out = Cursor::new(Vec::with_capacity(image.as_raw().len() / 2));
    PngEncoder::new(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_round_trip_preserves_pixels() {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 2, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode_import(&bytes).unwrap(), img);
    }

    #[test]
    fn garbage_is_an_invalid_source() {
        assert!(matches!(
            decode_import(b"definitely not an image"),
            Err(RasterError::InvalidImportSource(_))
        ));
        assert!(matches!(decode_import(&[]), Err(RasterError::InvalidImportSource(_))));
    }
}
