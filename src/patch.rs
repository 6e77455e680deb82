//! Rectangular pixel snapshots.
//!
//! A patch is the unit the undo history trades in: capture a region before
//! a stroke, capture it again afterwards, and the pair can replay the edit
//! in either direction.  Patches also back the brush-capture tool, which
//! turns a selection into a stampable brush.

use crate::palette::PaletteRef;
use crate::rect::Rect;
use crate::surface::Surface;
use uuid::Uuid;

/// An immutable copy of a region of one layer's surface.
#[derive(Clone, Debug)]
pub struct Patch {
    surface: Surface,
    rect: Rect,
    layer_id: Uuid,
    palette: PaletteRef,
}

impl Patch {
    /// Snapshot `rect` of `source`.  The rect is clamped to the surface
    /// bounds first, so the stored region always matches the stored
    /// pixels.
    pub fn capture(source: &Surface, rect: Rect, layer_id: Uuid, palette: PaletteRef) -> Self {
        let rect = rect.intersect(source.bounds());
        let mut surface = Surface::new(
            rect.width.max(0) as u32,
            rect.height.max(0) as u32,
            source.format(),
        );
        if !rect.is_empty() {
            // Same format and an exact-fit destination, cannot fail.
            let _ = surface.blit(source, rect, surface.bounds(), true);
        }
        Self {
            surface,
            rect,
            layer_id,
            palette,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Where the pixels came from, in layer coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn layer_id(&self) -> Uuid {
        self.layer_id
    }

    pub fn palette(&self) -> &PaletteRef {
        &self.palette
    }
}
