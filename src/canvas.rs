use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum supported canvas dimension in pixels (per axis).
pub const MAX_CANVAS_DIM: u32 = 32_768;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("pixel ({x}, {y}) is outside the {width}×{height} surface")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("snapshot is {found:?} but the surface is {expected:?}")]
    DimensionMismatch { expected: (u32, u32), found: (u32, u32) },
    #[error("invalid surface dimensions {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ParseColorError(pub String);

// ============================================================================
// COLOR
// ============================================================================

/// Opaque 24-bit RGB color. Alpha is implicit and always written as 255.
/// Serializes as its `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value; the top byte is ignored.
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Reads the RGB channels of an image pixel, ignoring alpha.
    pub fn from_rgba(pixel: Rgba<u8>) -> Self {
        Self::rgb(pixel.0[0], pixel.0[1], pixel.0[2])
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.to_u32())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parses `#rrggbb` (the leading `#` is optional), as produced by an HTML
    /// color input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_u32)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.to_hex()
    }
}

// ============================================================================
// PIXEL RECT
// ============================================================================

/// Inclusive pixel-space bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRect {
    pub fn point(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable copy of a surface's pixels at one point in time.
///
/// The pixel data is captured by deep copy and then shared behind an `Arc`, so
/// cloning a snapshot is cheap and nothing can ever write through it.
#[derive(Clone)]
pub struct Snapshot {
    pixels: Arc<RgbaImage>,
}

impl Snapshot {
    /// Take ownership of an already-detached buffer (e.g. a finished fill).
    pub fn from_image(image: RgbaImage) -> Self {
        Self { pixels: Arc::new(image) }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width() && y < self.height() {
            Some(Color::from_rgba(*self.pixels.get_pixel(x, y)))
        } else {
            None
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
            || (self.dimensions() == other.dimensions()
                && self.pixels.as_raw() == other.pixels.as_raw())
    }
}

impl Eq for Snapshot {}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

// ============================================================================
// SURFACE
// ============================================================================

/// The live canvas: a `width × height` buffer of opaque RGBA pixels.
pub struct Surface {
    pixels: RgbaImage,
    background: Color,
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<(), SurfaceError> {
    if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(SurfaceError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl Surface {
    /// Create a surface filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, SurfaceError> {
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, background.to_rgba()),
            background,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<(), SurfaceError> {
        if x >= self.width() || y >= self.height() {
            return Err(SurfaceError::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Color, SurfaceError> {
        self.check_bounds(x, y)?;
        Ok(Color::from_rgba(*self.pixels.get_pixel(x, y)))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<(), SurfaceError> {
        self.check_bounds(x, y)?;
        self.pixels.put_pixel(x, y, color.to_rgba());
        Ok(())
    }

    /// Deep-copy the whole buffer into an immutable snapshot.
    pub fn capture(&self) -> Snapshot {
        Snapshot::from_image(self.pixels.clone())
    }

    /// Overwrite the whole buffer with `snapshot`.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SurfaceError> {
        if snapshot.dimensions() != self.dimensions() {
            return Err(SurfaceError::DimensionMismatch {
                expected: self.dimensions(),
                found: snapshot.dimensions(),
            });
        }
        self.pixels.copy_from_slice(snapshot.as_image().as_raw());
        Ok(())
    }

    /// Reallocate to `width × height` filled with the background color.
    /// Any history referring to the old buffer is stale afterwards.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        check_dimensions(width, height)?;
        self.pixels = RgbaImage::from_pixel(width, height, self.background.to_rgba());
        Ok(())
    }

    /// Fill every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba().0;
        self.pixels
            .par_chunks_mut(4)
            .for_each(|px| px.copy_from_slice(&rgba));
    }

    /// Draw `image` with its top-left corner at `(x, y)`, clipped to the
    /// surface. Source alpha is blended over the existing pixels and the
    /// result is stored opaque.
    pub fn blit(&mut self, image: &RgbaImage, x: i64, y: i64) {
        let (w, h) = (self.width() as i64, self.height() as i64);
        let (src_w, src_h) = (image.width() as i64, image.height() as i64);

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + src_w).min(w);
        let y1 = (y + src_h).min(h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = w as usize * 4;
        let src_stride = src_w as usize * 4;
        let src_raw = image.as_raw();

        self.pixels
            .par_chunks_mut(stride)
            .enumerate()
            .skip(y0 as usize)
            .take((y1 - y0) as usize)
            .for_each(|(row, dst_row)| {
                let sy = (row as i64 - y) as usize;
                for dx in x0..x1 {
                    let sx = (dx - x) as usize;
                    let s = sy * src_stride + sx * 4;
                    let d = dx as usize * 4;
                    let alpha = src_raw[s + 3] as u32;
                    for c in 0..3 {
                        let src = src_raw[s + c] as u32;
                        let dst = dst_row[d + c] as u32;
                        dst_row[d + c] = ((src * alpha + dst * (255 - alpha) + 127) / 255) as u8;
                    }
                    dst_row[d + 3] = 255;
                }
            });
    }

    /// Paint a horizontal run `[x0, x1]` on row `y`. Both ends must already be
    /// clipped to the surface.
    pub(crate) fn put_span(&mut self, y: u32, x0: u32, x1: u32, color: Color) {
        let rgba = color.to_rgba();
        for x in x0..=x1 {
            self.pixels.put_pixel(x, y, rgba);
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Detached copy of the pixel buffer, for work that must not touch the
    /// live surface until it is complete.
    pub fn to_image(&self) -> RgbaImage {
        self.pixels.clone()
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}
