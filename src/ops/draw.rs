//! Rasterization primitives: brush stamps, lines, shapes and fills.
//!
//! Every function clips against the surface bounds and returns the rect it
//! actually touched (`None` when nothing changed), so callers can forward
//! minimal damage regions without recomputing them.

use crate::brush::Brush;
use crate::rect::{Point, Rect};
use crate::surface::{Pixel, Surface};
use log::warn;

/// Stamp the brush once, centered on `pos`.
///
/// Masked samples are written unconditionally, including transparent ones;
/// an eraser is just a brush whose footprint holds the transparent color.
pub fn draw_brush(surface: &mut Surface, brush: &Brush, pos: Point) -> Option<Rect> {
    let hotspot = brush.hotspot();
    let origin = pos - hotspot;
    let stamp = Rect::new(
        origin.x,
        origin.y,
        brush.width() as i32,
        brush.height() as i32,
    );
    let touched = stamp.intersect(surface.bounds());
    if touched.is_empty() {
        return None;
    }
    for y in 0..brush.height() as i32 {
        for x in 0..brush.width() as i32 {
            if brush.masked(x, y) {
                if let Some(pixel) = brush.surface().get_pixel(x, y) {
                    surface.set_pixel(origin.x + x, origin.y + y, pixel);
                }
            }
        }
    }
    Some(touched)
}

/// Stamp the brush along the Bresenham line from `from` to `to`,
/// inclusive on both ends.
pub fn draw_line(surface: &mut Surface, brush: &Brush, from: Point, to: Point) -> Option<Rect> {
    let mut touched = Rect::EMPTY;
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut p = from;
    loop {
        if let Some(r) = draw_brush(surface, brush, p) {
            touched = touched.union(r);
        }
        if p == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            p.x += sx;
        }
        if e2 <= dx {
            err += dx;
            p.y += sy;
        }
    }
    if touched.is_empty() {
        None
    } else {
        Some(touched)
    }
}

/// Stroke the outline of the rect spanned by two corner points.
pub fn draw_rectangle(surface: &mut Surface, brush: &Brush, a: Point, b: Point) -> Option<Rect> {
    let rect = Rect::spanning(a, b);
    let tl = Point::new(rect.left, rect.top);
    let tr = Point::new(rect.right() - 1, rect.top);
    let bl = Point::new(rect.left, rect.bottom() - 1);
    let br = Point::new(rect.right() - 1, rect.bottom() - 1);
    let mut touched = Rect::EMPTY;
    for (from, to) in [(tl, tr), (tr, br), (br, bl), (bl, tl)] {
        if let Some(r) = draw_line(surface, brush, from, to) {
            touched = touched.union(r);
        }
    }
    if touched.is_empty() {
        None
    } else {
        Some(touched)
    }
}

/// Fill the rect spanned by two corner points with a solid value.
pub fn draw_filled_rectangle(
    surface: &mut Surface,
    a: Point,
    b: Point,
    value: Pixel,
) -> Option<Rect> {
    let rect = Rect::spanning(a, b).intersect(surface.bounds());
    if rect.is_empty() {
        return None;
    }
    for y in rect.top..rect.bottom() {
        for x in rect.left..rect.right() {
            surface.set_pixel(x, y, value);
        }
    }
    Some(rect)
}

/// Horizontal half-widths of an ellipse with radii `rx`, `ry`: one
/// `(dy, half)` pair per scanline, where samples `-half..=half` around the
/// center are inside.
pub(crate) fn ellipse_spans(rx: i32, ry: i32) -> Vec<(i32, i32)> {
    let rx = rx.max(0);
    let ry = ry.max(0);
    if ry == 0 {
        return vec![(0, rx)];
    }
    (-ry..=ry)
        .map(|dy| {
            let t = dy as f64 / ry as f64;
            let half = (rx as f64 * (1.0 - t * t).sqrt()).round() as i32;
            (dy, half)
        })
        .collect()
}

/// Stroke an ellipse outline with the brush.
pub fn draw_ellipse(
    surface: &mut Surface,
    brush: &Brush,
    center: Point,
    rx: i32,
    ry: i32,
) -> Option<Rect> {
    if ry <= 0 {
        let rx = rx.max(0);
        return draw_line(
            surface,
            brush,
            Point::new(center.x - rx, center.y),
            Point::new(center.x + rx, center.y),
        );
    }
    let spans = ellipse_spans(rx, ry);
    let mut touched = Rect::EMPTY;
    let mut stamp = |surface: &mut Surface, x: i32, y: i32, touched: &mut Rect| {
        if let Some(r) = draw_brush(surface, brush, Point::new(x, y)) {
            *touched = touched.union(r);
        }
    };
    let mut prev_half: Option<i32> = None;
    for &(dy, half) in &spans {
        let y = center.y + dy;
        // Walk the edge between this scanline's extent and the previous
        // one's, so steep sections stay connected.
        let from = prev_half.unwrap_or(half).min(half);
        let to = prev_half.unwrap_or(half).max(half);
        for x in from..=to {
            stamp(surface, center.x - x, y, &mut touched);
            stamp(surface, center.x + x, y, &mut touched);
        }
        prev_half = Some(half);
    }
    if touched.is_empty() {
        None
    } else {
        Some(touched)
    }
}

/// Fill an ellipse with a solid value.
pub fn draw_filled_ellipse(
    surface: &mut Surface,
    center: Point,
    rx: i32,
    ry: i32,
    value: Pixel,
) -> Option<Rect> {
    let mut touched = Rect::EMPTY;
    for (dy, half) in ellipse_spans(rx, ry) {
        let y = center.y + dy;
        let row = Rect::new(center.x - half, y, 2 * half + 1, 1).intersect(surface.bounds());
        if row.is_empty() {
            continue;
        }
        for x in row.left..row.right() {
            surface.set_pixel(x, y, value);
        }
        touched = touched.union(row);
    }
    if touched.is_empty() {
        None
    } else {
        Some(touched)
    }
}

/// Connected region of samples equal to the sample under `seed`, as a
/// visited mask plus its bounding box.  4-connected, scanning by raw
/// sample bytes so it works for both formats.
fn fill_region(surface: &Surface, seed: Point) -> Option<(Vec<u8>, Rect)> {
    surface.get_pixel(seed.x, seed.y)?;
    let w = surface.width() as i32;
    let h = surface.height() as i32;
    let n = surface.format().sample_size();
    let data = surface.data();
    let sample_at = |index: usize| &data[index * n..index * n + n];
    let target = sample_at((seed.y * w + seed.x) as usize).to_vec();

    let mut mask = vec![0u8; (w * h) as usize];
    // Flat indices fit in u32 even for large canvases, which keeps the
    // work stack compact.
    let mut stack: Vec<u32> = vec![(seed.y * w + seed.x) as u32];
    mask[(seed.y * w + seed.x) as usize] = 1;
    let mut bbox = Rect::new(seed.x, seed.y, 1, 1);

    while let Some(index) = stack.pop() {
        let index = index as i32;
        let x = index % w;
        let y = index / w;
        bbox = bbox.union(Rect::new(x, y, 1, 1));
        let neighbors = [
            (x > 0, index - 1),
            (x < w - 1, index + 1),
            (y > 0, index - w),
            (y < h - 1, index + w),
        ];
        for (in_bounds, next) in neighbors {
            if in_bounds && mask[next as usize] == 0 && sample_at(next as usize) == target {
                mask[next as usize] = 1;
                stack.push(next as u32);
            }
        }
    }
    Some((mask, bbox))
}

/// Flood-fill the connected region under `seed` with `value`.
///
/// Filling a region with the value it already holds is a no-op, which also
/// makes the fill idempotent.
pub fn flood_fill(surface: &mut Surface, seed: Point, value: Pixel) -> Option<Rect> {
    if value.format() != surface.format() {
        warn!(
            "dropping {:?} fill on a {:?} surface",
            value.format(),
            surface.format()
        );
        return None;
    }
    if surface.get_pixel(seed.x, seed.y)? == value {
        return None;
    }
    let (mask, bbox) = fill_region(surface, seed)?;
    let w = surface.width() as i32;
    for y in bbox.top..bbox.bottom() {
        for x in bbox.left..bbox.right() {
            if mask[(y * w + x) as usize] != 0 {
                surface.set_pixel(x, y, value);
            }
        }
    }
    Some(bbox)
}

/// Flood-fill the region under `seed` with a vertical color ramp: each row
/// of the region's bounding box maps to one ramp step, top to bottom.
pub fn gradient_fill(surface: &mut Surface, seed: Point, ramp: &[Pixel]) -> Option<Rect> {
    if ramp.is_empty() {
        return None;
    }
    let (mask, bbox) = fill_region(surface, seed)?;
    let w = surface.width() as i32;
    for y in bbox.top..bbox.bottom() {
        let step = ((y - bbox.top) as usize * ramp.len()) / bbox.height as usize;
        let value = ramp[step.min(ramp.len() - 1)];
        for x in bbox.left..bbox.right() {
            if mask[(y * w + x) as usize] != 0 {
                surface.set_pixel(x, y, value);
            }
        }
    }
    Some(bbox)
}
