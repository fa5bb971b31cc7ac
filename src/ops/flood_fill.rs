// ============================================================================
// FLOOD FILL: 4-connected bucket fill on a detached pixel buffer
// ============================================================================

use image::RgbaImage;

use crate::canvas::{Color, PixelRect};

/// A bucket-fill request. `target` is the color that was under the seed when
/// the request was made; `replacement` is the paint color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillRequest {
    pub x: i64,
    pub y: i64,
    pub target: Color,
    pub replacement: Color,
}

impl FillRequest {
    pub fn new(x: i64, y: i64, target: Color, replacement: Color) -> Self {
        Self { x, y, target, replacement }
    }

    /// Build a request whose target is sampled from `pixels` at the seed.
    /// Returns `None` when the seed is outside the buffer.
    pub fn sampled(pixels: &RgbaImage, x: i64, y: i64, replacement: Color) -> Option<Self> {
        if !in_bounds(pixels, x, y) {
            return None;
        }
        let target = Color::from_rgba(*pixels.get_pixel(x as u32, y as u32));
        Some(Self::new(x, y, target, replacement))
    }
}

/// Why a fill left the buffer untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOpReason {
    /// Target and replacement are the same color.
    SameColor,
    /// The seed lies outside the buffer.
    SeedOutside,
    /// The seed pixel no longer has the target color.
    SeedMismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillOutcome {
    Filled { pixels: usize, bounds: PixelRect },
    Unchanged(NoOpReason),
}

impl FillOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FillOutcome::Filled { .. })
    }

    pub fn filled_pixels(&self) -> usize {
        match self {
            FillOutcome::Filled { pixels, .. } => *pixels,
            FillOutcome::Unchanged(_) => 0,
        }
    }
}

#[inline(always)]
fn in_bounds(pixels: &RgbaImage, x: i64, y: i64) -> bool {
    x >= 0 && y >= 0 && x < pixels.width() as i64 && y < pixels.height() as i64
}

/// Read the RGB value at an in-bounds coordinate straight from the raw buffer.
#[inline(always)]
fn rgb_at(raw: &[u8], offset: usize) -> Color {
    Color::rgb(raw[offset], raw[offset + 1], raw[offset + 2])
}

/// Replace every pixel 4-connected to the seed that has the target color.
///
/// Uses an explicit LIFO work-list, so traversal is depth-first and stack
/// usage does not grow with the region. Neighbours are pushed without any
/// check; bounds and color are tested when a coordinate is popped, and a
/// repainted pixel no longer matches the target, which doubles as the visited
/// mark. Pixels outside the connected region are never written.
pub fn flood_fill(pixels: &mut RgbaImage, request: &FillRequest) -> FillOutcome {
    let FillRequest { x, y, target, replacement } = *request;

    if target == replacement {
        return FillOutcome::Unchanged(NoOpReason::SameColor);
    }
    if !in_bounds(pixels, x, y) {
        return FillOutcome::Unchanged(NoOpReason::SeedOutside);
    }

    let width = pixels.width() as usize;
    let fill = replacement.to_rgba().0;
    let raw: &mut [u8] = pixels;

    let seed_offset = (y as usize * width + x as usize) * 4;
    if rgb_at(raw, seed_offset) != target {
        return FillOutcome::Unchanged(NoOpReason::SeedMismatch);
    }

    let height = (raw.len() / 4 / width) as i64;
    let mut bounds = PixelRect::point(x as u32, y as u32);
    let mut count = 0usize;

    let mut stack: Vec<(i64, i64)> = Vec::with_capacity(4096);
    stack.push((x, y));

    while let Some((px, py)) = stack.pop() {
        if px < 0 || py < 0 || px >= width as i64 || py >= height {
            continue;
        }
        let offset = (py as usize * width + px as usize) * 4;
        if rgb_at(raw, offset) != target {
            continue;
        }

        raw[offset..offset + 4].copy_from_slice(&fill);
        count += 1;
        bounds.include(px as u32, py as u32);

        stack.push((px, py + 1));
        stack.push((px, py - 1));
        stack.push((px + 1, py));
        stack.push((px - 1, py));
    }

    FillOutcome::Filled { pixels: count, bounds }
}
