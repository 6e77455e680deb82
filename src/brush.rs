//! The stamp applied at every step of a stroke.
//!
//! A brush is a small surface plus a footprint mask.  The mask decides
//! which samples a stamp writes, independently of the sample values, so a
//! brush recolored to the transparent background still erases its full
//! footprint instead of stamping nothing.

use crate::ops::draw::ellipse_spans;
use crate::patch::Patch;
use crate::rect::Point;
use crate::surface::{Pixel, PixelFormat, Surface};
use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushShape {
    Rectangle,
    Ellipse,
    /// Captured from the canvas; keeps its own colors.
    Image,
}

#[derive(Clone, Debug)]
pub struct Brush {
    shape: BrushShape,
    surface: Surface,
    /// One byte per sample; nonzero samples are part of the footprint.
    mask: Vec<u8>,
    colorize: bool,
    saved: Option<Surface>,
}

impl Brush {
    /// A solid rectangular brush.
    pub fn rectangle(width: u32, height: u32, color: Pixel, format: PixelFormat) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut brush = Self {
            shape: BrushShape::Rectangle,
            surface: Surface::new(width, height, format),
            mask: vec![1; width as usize * height as usize],
            colorize: true,
            saved: None,
        };
        brush.set_color(color);
        brush
    }

    /// A solid elliptical brush inscribed in `width` x `height`.
    pub fn ellipse(width: u32, height: u32, color: Pixel, format: PixelFormat) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let rx = (width as i32 - 1) / 2;
        let ry = (height as i32 - 1) / 2;
        let mut mask = vec![0u8; width as usize * height as usize];
        for (dy, half) in ellipse_spans(rx, ry) {
            let y = ry + dy;
            for x in (rx - half).max(0)..=(rx + half).min(width as i32 - 1) {
                mask[y as usize * width as usize + x as usize] = 1;
            }
        }
        let mut brush = Self {
            shape: BrushShape::Ellipse,
            surface: Surface::new(width, height, format),
            mask,
            colorize: true,
            saved: None,
        };
        brush.set_color(color);
        brush
    }

    /// Turn captured pixels into a brush.  The footprint is the set of
    /// non-transparent samples, and the brush keeps its own colors rather
    /// than following the foreground.
    pub fn from_patch(patch: &Patch) -> Self {
        let surface = patch.surface().clone();
        let w = surface.width() as i32;
        let h = surface.height() as i32;
        let mut mask = vec![0u8; (w * h) as usize];
        for y in 0..h {
            for x in 0..w {
                if let Some(pixel) = surface.get_pixel(x, y) {
                    if !pixel.is_transparent() {
                        mask[(y * w + x) as usize] = 1;
                    }
                }
            }
        }
        Self {
            shape: BrushShape::Image,
            surface,
            mask,
            colorize: false,
            saved: None,
        }
    }

    pub fn shape(&self) -> BrushShape {
        self.shape
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// Stamps are anchored here, the footprint center.
    pub fn hotspot(&self) -> Point {
        Point::new(self.width() as i32 / 2, self.height() as i32 / 2)
    }

    /// Whether this sample belongs to the footprint.
    #[inline]
    pub fn masked(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return false;
        }
        self.mask[y as usize * self.width() as usize + x as usize] != 0
    }

    /// Whether stroke setup should recolor this brush to the foreground.
    pub fn paints_with_foreground(&self) -> bool {
        self.colorize
    }

    /// Recolor every footprint sample.  Transparent colors are written
    /// too; that is what turns a brush into an eraser.
    pub fn set_color(&mut self, color: Pixel) {
        if color.format() != self.surface.format() {
            warn!(
                "dropping {:?} recolor on a {:?} brush",
                color.format(),
                self.surface.format()
            );
            return;
        }
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                if self.masked(x, y) {
                    self.surface.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Save the current pixels so a temporary recolor can be undone.
    pub fn remember(&mut self) {
        self.saved = Some(self.surface.clone());
    }

    /// Undo a temporary recolor, if one is pending.
    pub fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.surface = saved;
        }
    }

    pub fn flip_x(&mut self) {
        self.surface.flip_x();
        let w = self.width() as usize;
        if w > 0 {
            for row in self.mask.chunks_exact_mut(w) {
                row.reverse();
            }
        }
    }

    pub fn flip_y(&mut self) {
        self.surface.flip_y();
        let w = self.width() as usize;
        let h = self.height() as usize;
        if w == 0 {
            return;
        }
        let (mut top, mut bottom) = (0, h.saturating_sub(1));
        while top < bottom {
            let (a, b) = self.mask.split_at_mut(bottom * w);
            a[top * w..(top + 1) * w].swap_with_slice(&mut b[..w]);
            top += 1;
            bottom -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::palette::Palette;
    use crate::rect::Rect;
    use uuid::Uuid;

    #[test]
    fn rectangle_brush_is_fully_masked() {
        let brush = Brush::rectangle(3, 2, Pixel::Indexed(5), PixelFormat::Indexed);
        for y in 0..2 {
            for x in 0..3 {
                assert!(brush.masked(x, y));
                assert_eq!(brush.surface().get_pixel(x, y), Some(Pixel::Indexed(5)));
            }
        }
        assert!(!brush.masked(3, 0));
        assert_eq!(brush.hotspot(), Point::new(1, 1));
    }

    #[test]
    fn ellipse_brush_rounds_corners() {
        let brush = Brush::ellipse(5, 5, Pixel::Indexed(1), PixelFormat::Indexed);
        assert!(brush.masked(2, 2));
        assert!(brush.masked(0, 2));
        assert!(brush.masked(2, 0));
        assert!(!brush.masked(0, 0));
        assert!(!brush.masked(4, 4));
    }

    #[test]
    fn erase_recolor_keeps_footprint() {
        let mut brush = Brush::rectangle(2, 2, Pixel::Indexed(5), PixelFormat::Indexed);
        brush.remember();
        brush.set_color(Pixel::Indexed(0));
        assert!(brush.masked(0, 0));
        assert_eq!(brush.surface().get_pixel(0, 0), Some(Pixel::Indexed(0)));
        brush.restore();
        assert_eq!(brush.surface().get_pixel(0, 0), Some(Pixel::Indexed(5)));
    }

    #[test]
    fn captured_brush_masks_painted_samples_only() {
        let palette =
            Palette::new(vec![[0, 0, 0, 0], [255, 0, 0, 255]], &[0], EventBus::new()).shared();
        let mut source = Surface::new(3, 1, PixelFormat::Indexed);
        source.set_pixel(1, 0, Pixel::Indexed(1));
        let patch = Patch::capture(&source, Rect::new(0, 0, 3, 1), Uuid::new_v4(), palette);

        let brush = Brush::from_patch(&patch);
        assert!(!brush.paints_with_foreground());
        assert!(!brush.masked(0, 0));
        assert!(brush.masked(1, 0));
        assert!(!brush.masked(2, 0));
    }

    #[test]
    fn flips_move_mask_with_pixels() {
        let palette =
            Palette::new(vec![[0, 0, 0, 0], [255, 0, 0, 255]], &[0], EventBus::new()).shared();
        let mut source = Surface::new(2, 2, PixelFormat::Indexed);
        source.set_pixel(0, 0, Pixel::Indexed(1));
        let patch = Patch::capture(&source, Rect::new(0, 0, 2, 2), Uuid::new_v4(), palette);
        let mut brush = Brush::from_patch(&patch);

        brush.flip_x();
        assert!(brush.masked(1, 0));
        assert!(!brush.masked(0, 0));
        brush.flip_y();
        assert!(brush.masked(1, 1));
        assert_eq!(brush.surface().get_pixel(1, 1), Some(Pixel::Indexed(1)));
    }
}
