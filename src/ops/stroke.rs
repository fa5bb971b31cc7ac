// ============================================================================
// STROKE RASTERIZER: aliased round-capped brush segments
// ============================================================================
//
// Points are surface coordinates: pixel (3, 4) covers [3, 4) × [4, 5) and
// its center is (3.5, 4.5), the same cell `floor` picks for a fill seed.
// A pixel is painted when its center lies within `width / 2` of the stroke's
// centerline, which gives round caps and round joins for free when segments
// share endpoints. Anything outside the surface is clipped silently.

use crate::canvas::{Color, PixelRect, Surface};

/// Radius used for a brush of the given diameter. Widths below one pixel
/// still paint the pixel under the pointer.
fn radius_for(width: f32) -> f32 {
    width.max(1.0) / 2.0
}

/// Clip the float box `[min, max]` to the surface, returning pixel bounds.
fn clip_box(surface: &Surface, min: (f32, f32), max: (f32, f32)) -> Option<PixelRect> {
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    if max.0 < 0.0 || max.1 < 0.0 || min.0 > w - 1.0 || min.1 > h - 1.0 {
        return None;
    }
    Some(PixelRect {
        min_x: min.0.max(0.0).ceil() as u32,
        min_y: min.1.max(0.0).ceil() as u32,
        max_x: max.0.min(w - 1.0).floor() as u32,
        max_y: max.1.min(h - 1.0).floor() as u32,
    })
    .filter(|r| r.min_x <= r.max_x && r.min_y <= r.max_y)
}

/// Stamp a filled disc of diameter `width` centered on `center`. The pixel
/// under `center` is always painted, so a thin click on a pixel corner still
/// leaves a mark. Returns the painted bounds, or `None` when nothing landed
/// on the surface.
pub fn draw_dot(surface: &mut Surface, center: (f32, f32), width: f32, color: Color) -> Option<PixelRect> {
    let painted = draw_segment(surface, center, center, width, color);
    let (cx, cy) = (center.0.floor() as i64, center.1.floor() as i64);
    if !surface.contains(cx, cy) {
        return painted;
    }
    let (cx, cy) = (cx as u32, cy as u32);
    surface.put_span(cy, cx, cx, color);
    let under = PixelRect::point(cx, cy);
    Some(painted.map_or(under, |p| p.union(under)))
}

/// Draw a straight segment of the given width with round caps.
pub fn draw_segment(
    surface: &mut Surface,
    from: (f32, f32),
    to: (f32, f32),
    width: f32,
    color: Color,
) -> Option<PixelRect> {
    // Pixel-index space: pixel (x, y) has its center at (x, y).
    let from = (from.0 - 0.5, from.1 - 0.5);
    let to = (to.0 - 0.5, to.1 - 0.5);
    let r = radius_for(width);
    let area = clip_box(
        surface,
        (from.0.min(to.0) - r, from.1.min(to.1) - r),
        (from.0.max(to.0) + r, from.1.max(to.1) + r),
    )?;

    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len_sq = dx * dx + dy * dy;
    let r_sq = r * r;
    let mut painted: Option<PixelRect> = None;

    for y in area.min_y..=area.max_y {
        // Collect the covered run on this row; the covered set of a capsule
        // is convex, so each row is one contiguous span.
        let mut run: Option<(u32, u32)> = None;
        for x in area.min_x..=area.max_x {
            if dist_sq_to_segment((x as f32, y as f32), from, dx, dy, len_sq) <= r_sq {
                run = Some(match run {
                    Some((start, _)) => (start, x),
                    None => (x, x),
                });
            }
        }
        if let Some((x0, x1)) = run {
            surface.put_span(y, x0, x1, color);
            let row = PixelRect { min_x: x0, min_y: y, max_x: x1, max_y: y };
            painted = Some(painted.map_or(row, |p| p.union(row)));
        }
    }

    painted
}

#[inline]
fn dist_sq_to_segment(p: (f32, f32), a: (f32, f32), dx: f32, dy: f32, len_sq: f32) -> f32 {
    let t = if len_sq > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.0 + dx * t - p.0;
    let cy = a.1 + dy * t - p.1;
    cx * cx + cy * cy
}
