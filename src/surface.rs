//! Pixel storage and the blit compositing primitive.
//!
//! A [`Surface`] is a contiguous row-major byte buffer: one byte per pixel
//! for indexed surfaces, four for direct-color ones.  Everything that
//! touches pixels, from brush stamps to undo restores, bottoms out in
//! either [`Surface::set_pixel`] or [`Surface::blit`].

use crate::error::SurfaceError;
use crate::palette::{self, Palette};
use crate::rect::{Point, Rect};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The palette index that merge blits treat as "not painted".
pub const TRANSPARENT_INDEX: u8 = 0;

/// Sample layout of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// One byte per pixel, resolved through the palette.
    Indexed,
    /// Four bytes per pixel, `[r, g, b, a]`.
    Rgba,
}

impl PixelFormat {
    #[inline]
    pub fn sample_size(self) -> usize {
        match self {
            PixelFormat::Indexed => 1,
            PixelFormat::Rgba => 4,
        }
    }
}

/// One pixel value in either format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pixel {
    Indexed(u8),
    Rgba(image::Rgba<u8>),
}

impl Pixel {
    /// Transparent means "skipped by merge blits": index 0 for indexed
    /// pixels, zero alpha for direct color.
    #[inline]
    pub fn is_transparent(self) -> bool {
        match self {
            Pixel::Indexed(i) => i == TRANSPARENT_INDEX,
            Pixel::Rgba(c) => c.0[3] == 0,
        }
    }

    #[inline]
    pub fn format(self) -> PixelFormat {
        match self {
            Pixel::Indexed(_) => PixelFormat::Indexed,
            Pixel::Rgba(_) => PixelFormat::Rgba,
        }
    }

    /// Raw sample bytes and their length.
    #[inline]
    pub fn bytes(self) -> ([u8; 4], usize) {
        match self {
            Pixel::Indexed(i) => ([i, 0, 0, 0], 1),
            Pixel::Rgba(c) => (c.0, 4),
        }
    }
}

/// Resolve a pixel value for `index` in the given format.  Direct-color
/// surfaces get the palette entry's RGBA bytes, indexed ones the index
/// itself.
pub fn pixel_from_index(format: PixelFormat, palette: &Palette, index: u8) -> Pixel {
    match format {
        PixelFormat::Indexed => Pixel::Indexed(index),
        PixelFormat::Rgba => Pixel::Rgba(image::Rgba(palette.rgba(index as usize))),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Surface {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Surface {
    /// A zero-filled surface (all pixels transparent).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * format.sample_size()],
        }
    }

    /// Wrap an existing buffer; the length must match the dimensions
    /// exactly.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, SurfaceError> {
        let expected = width as usize * height as usize * format.sample_size();
        if data.len() != expected {
            return Err(SurfaceError::BufferSize {
                width,
                height,
                format,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    fn sample_size(&self) -> usize {
        self.format.sample_size()
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.sample_size()
    }

    /// Read one pixel; `None` outside the surface.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let at = self.offset(x, y);
        Some(match self.format {
            PixelFormat::Indexed => Pixel::Indexed(self.data[at]),
            PixelFormat::Rgba => {
                let mut c = [0u8; 4];
                c.copy_from_slice(&self.data[at..at + 4]);
                Pixel::Rgba(image::Rgba(c))
            }
        })
    }

    /// Write one pixel.  Out-of-bounds writes are dropped; a format
    /// mismatch is logged and dropped, since a wrong-format pixel deep in
    /// a stroke loop should not abort the stroke.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: Pixel) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        if pixel.format() != self.format {
            warn!(
                "dropping {:?} write on a {:?} surface",
                pixel.format(),
                self.format
            );
            return;
        }
        let at = self.offset(x, y);
        let (bytes, n) = pixel.bytes();
        self.data[at..at + n].copy_from_slice(&bytes[..n]);
    }

    /// Set every pixel to `value`.  Returns the touched rect.
    pub fn fill(&mut self, value: Pixel) -> Rect {
        let (bytes, n) = value.bytes();
        if n != self.sample_size() {
            warn!(
                "dropping {:?} fill on a {:?} surface",
                value.format(),
                self.format
            );
            return Rect::EMPTY;
        }
        for sample in self.data.chunks_exact_mut(n) {
            sample.copy_from_slice(&bytes[..n]);
        }
        self.bounds()
    }

    /// Reset every pixel to transparent.  Returns the touched rect.
    pub fn clear(&mut self) -> Rect {
        self.data.fill(0);
        self.bounds()
    }

    /// Mirror horizontally in place.
    pub fn flip_x(&mut self) -> Rect {
        let n = self.sample_size();
        let row_len = self.width as usize * n;
        if row_len == 0 {
            return Rect::EMPTY;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let mut lo = 0;
            let mut hi = row_len - n;
            while lo < hi {
                for b in 0..n {
                    row.swap(lo + b, hi + b);
                }
                lo += n;
                hi -= n;
            }
        }
        self.bounds()
    }

    /// Mirror vertically in place.
    pub fn flip_y(&mut self) -> Rect {
        let row_len = self.width as usize * self.sample_size();
        if row_len == 0 {
            return Rect::EMPTY;
        }
        let height = self.height as usize;
        let (mut top, mut bottom) = (0, height.saturating_sub(1));
        while top < bottom {
            let (a, b) = self.data.split_at_mut(bottom * row_len);
            a[top * row_len..(top + 1) * row_len].swap_with_slice(&mut b[..row_len]);
            top += 1;
            bottom -= 1;
        }
        self.bounds()
    }

    /// Copy a region of `src` into this surface.
    ///
    /// Mismatched rect sizes clamp to the common size; both rects are then
    /// clipped against their surfaces (moving one origin shifts the other
    /// by the same amount so the copied content stays aligned).  With
    /// `overwrite` all samples are copied; otherwise transparent source
    /// samples leave the destination untouched.
    ///
    /// Returns the destination rect actually written, possibly empty.
    pub fn blit(
        &mut self,
        src: &Surface,
        src_rect: Rect,
        dst_rect: Rect,
        overwrite: bool,
    ) -> Result<Rect, SurfaceError> {
        if src.format != self.format {
            return Err(SurfaceError::FormatMismatch {
                src: src.format,
                dst: self.format,
            });
        }

        let mut sx = src_rect.left;
        let mut sy = src_rect.top;
        let mut dx = dst_rect.left;
        let mut dy = dst_rect.top;
        let mut w = src_rect.width.min(dst_rect.width);
        let mut h = src_rect.height.min(dst_rect.height);

        // Clip against both surfaces, shifting the opposite origin so the
        // copied content stays put.
        if sx < 0 {
            dx -= sx;
            w += sx;
            sx = 0;
        }
        if sy < 0 {
            dy -= sy;
            h += sy;
            sy = 0;
        }
        if dx < 0 {
            sx -= dx;
            w += dx;
            dx = 0;
        }
        if dy < 0 {
            sy -= dy;
            h += dy;
            dy = 0;
        }
        w = w.min(src.width as i32 - sx).min(self.width as i32 - dx);
        h = h.min(src.height as i32 - sy).min(self.height as i32 - dy);
        if w <= 0 || h <= 0 {
            return Ok(Rect::EMPTY);
        }

        let n = self.sample_size();
        let span = w as usize * n;
        for row in 0..h {
            let s = src.offset(sx, sy + row);
            let d = self.offset(dx, dy + row);
            if overwrite {
                self.data[d..d + span].copy_from_slice(&src.data[s..s + span]);
            } else {
                for col in 0..w as usize {
                    let sp = s + col * n;
                    let dp = d + col * n;
                    let transparent = match self.format {
                        PixelFormat::Indexed => src.data[sp] == TRANSPARENT_INDEX,
                        PixelFormat::Rgba => src.data[sp + 3] == 0,
                    };
                    if !transparent {
                        self.data[dp..dp + n].copy_from_slice(&src.data[sp..sp + n]);
                    }
                }
            }
        }
        Ok(Rect::new(dx, dy, w, h))
    }

    /// Expand to straight RGBA bytes for display or export.  Indexed
    /// surfaces run through the palette's packed table; direct-color
    /// surfaces are copied as-is.
    pub fn to_rgba_pixels(&self, palette: &Palette) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.data.clone(),
            PixelFormat::Indexed => {
                let w = self.width as usize;
                if w == 0 || self.height == 0 {
                    return Vec::new();
                }
                let mut out = vec![0u8; w * self.height as usize * 4];
                let table = palette.packed_table();
                out.par_chunks_mut(w * 4)
                    .zip(self.data.par_chunks(w))
                    .for_each(|(dst_row, src_row)| {
                        for (dst, &index) in dst_row.chunks_exact_mut(4).zip(src_row) {
                            dst.copy_from_slice(&palette::unpack(table[index as usize]));
                        }
                    });
                out
            }
        }
    }

    /// Pointer position helper for hit-testing.
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }
}
