//! One paintable plane of a drawing.
//!
//! Besides its surface, a layer owns a full-surface backup patch.  The
//! backup is the substrate of both undo and flicker-free preview: preview
//! tools restore the previously-drawn region from the backup before every
//! redraw, and a finished stroke refreshes the backup to commit.

use crate::brush::Brush;
use crate::event::{EditorEvent, EventBus};
use crate::ops::draw;
use crate::palette::PaletteRef;
use crate::patch::Patch;
use crate::rect::{Point, Rect};
use crate::surface::{Pixel, PixelFormat, Surface};
use log::warn;
use uuid::Uuid;

pub struct Layer {
    id: Uuid,
    surface: Surface,
    backup: Patch,
    visible: bool,
    /// Animated layers are presented one-at-a-time by hosts that play
    /// drawings as flipbooks.
    animated: bool,
    /// Region of the most recent draw operation, used by preview tools to
    /// know what to restore.  Replaced, not accumulated, on every draw.
    last_change: Option<Rect>,
    palette: PaletteRef,
    events: EventBus,
}

impl Layer {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        palette: PaletteRef,
        events: EventBus,
    ) -> Self {
        let id = Uuid::new_v4();
        let surface = Surface::new(width, height, format);
        let backup = Patch::capture(&surface, surface.bounds(), id, PaletteRef::clone(&palette));
        Self {
            id,
            surface,
            backup,
            visible: true,
            animated: false,
            last_change: None,
            palette,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.events.emit(&EditorEvent::SurfaceChanged {
            layer_id: self.id,
            rect: self.surface.bounds(),
        });
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn set_animated(&mut self, animated: bool) {
        self.animated = animated;
    }

    pub fn last_change(&self) -> Option<Rect> {
        self.last_change
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        self.surface.get_pixel(x, y)
    }

    /// Record a draw and notify observers.  Every pixel-touching method of
    /// the layer funnels through here.
    fn touched(&mut self, rect: Rect, silent: bool) -> Option<Rect> {
        if rect.is_empty() {
            return None;
        }
        self.last_change = Some(rect);
        if !silent {
            self.events.emit(&EditorEvent::SurfaceChanged {
                layer_id: self.id,
                rect,
            });
        }
        Some(rect)
    }

    /// Snapshot the whole surface as the new restore point.  Called when a
    /// stroke commits.
    pub fn make_backup(&mut self) {
        self.backup = Patch::capture(
            &self.surface,
            self.surface.bounds(),
            self.id,
            PaletteRef::clone(&self.palette),
        );
        self.last_change = None;
    }

    /// Copy a region of the backup over the live surface, overwriting.
    /// `None` restores everything; `dest` relocates the restored pixels
    /// (defaults to the source region, the plain undo-restore case).
    /// Returns the restored rect.
    pub fn restore_backup(
        &mut self,
        region: Option<Rect>,
        dest: Option<Rect>,
        silent: bool,
    ) -> Option<Rect> {
        let region = region.unwrap_or_else(|| self.surface.bounds());
        let dest = dest.unwrap_or(region);
        let restored = match self.surface.blit(self.backup.surface(), region, dest, true) {
            Ok(rect) => rect,
            Err(err) => {
                warn!("backup restore failed: {err}");
                return None;
            }
        };
        if restored.is_empty() {
            return None;
        }
        if !silent {
            self.events.emit(&EditorEvent::SurfaceChanged {
                layer_id: self.id,
                rect: restored,
            });
        }
        Some(restored)
    }

    /// Drop any uncommitted preview pixels, e.g. the hover brush cursor
    /// when the pointer leaves the canvas.
    pub fn clear_preview(&mut self) -> Option<Rect> {
        let pending = self.last_change.take()?;
        self.restore_backup(Some(pending), None, false)
    }

    /// Snapshot a region, from the live surface or from the backup.
    /// Capturing from the backup yields pre-stroke pixels even while a
    /// stroke is in progress.
    pub fn make_patch(&self, region: Rect, from_backup: bool) -> Patch {
        let source = if from_backup {
            self.backup.surface()
        } else {
            &self.surface
        };
        Patch::capture(source, region, self.id, PaletteRef::clone(&self.palette))
    }

    /// Replay a patch, at its original position or at `position`.  With
    /// `merge` transparent patch samples leave the layer untouched.
    pub fn draw_patch(&mut self, patch: &Patch, position: Option<Point>, merge: bool) -> Option<Rect> {
        let dest = match position {
            Some(pos) => patch.rect().at(pos),
            None => patch.rect(),
        };
        let src = patch.surface().bounds();
        match self.surface.blit(patch.surface(), src, dest, !merge) {
            Ok(rect) => self.touched(rect, false),
            Err(err) => {
                warn!("patch draw failed: {err}");
                None
            }
        }
    }

    pub fn draw_brush(&mut self, brush: &Brush, pos: Point) -> Option<Rect> {
        let rect = draw::draw_brush(&mut self.surface, brush, pos)?;
        self.touched(rect, false)
    }

    pub fn draw_line(&mut self, brush: &Brush, from: Point, to: Point) -> Option<Rect> {
        let rect = draw::draw_line(&mut self.surface, brush, from, to)?;
        self.touched(rect, false)
    }

    /// Outline rectangle with the brush, or solid when `filled` carries
    /// the fill value.
    pub fn draw_rectangle(
        &mut self,
        brush: &Brush,
        a: Point,
        b: Point,
        filled: Option<Pixel>,
    ) -> Option<Rect> {
        let rect = match filled {
            Some(value) => draw::draw_filled_rectangle(&mut self.surface, a, b, value)?,
            None => draw::draw_rectangle(&mut self.surface, brush, a, b)?,
        };
        self.touched(rect, false)
    }

    pub fn draw_ellipse(
        &mut self,
        brush: &Brush,
        center: Point,
        rx: i32,
        ry: i32,
        filled: Option<Pixel>,
    ) -> Option<Rect> {
        let rect = match filled {
            Some(value) => draw::draw_filled_ellipse(&mut self.surface, center, rx, ry, value)?,
            None => draw::draw_ellipse(&mut self.surface, brush, center, rx, ry)?,
        };
        self.touched(rect, false)
    }

    pub fn draw_fill(&mut self, seed: Point, value: Pixel) -> Option<Rect> {
        let rect = draw::flood_fill(&mut self.surface, seed, value)?;
        self.touched(rect, false)
    }

    pub fn draw_gradient_fill(&mut self, seed: Point, ramp: &[Pixel]) -> Option<Rect> {
        let rect = draw::gradient_fill(&mut self.surface, seed, ramp)?;
        self.touched(rect, false)
    }

    /// Reset the layer to a solid value, or to transparent.
    pub fn draw_clear(&mut self, value: Option<Pixel>) -> Option<Rect> {
        let rect = match value {
            Some(value) => self.surface.fill(value),
            None => self.surface.clear(),
        };
        self.touched(rect, false)
    }

    pub fn blit(
        &mut self,
        src: &Surface,
        src_rect: Rect,
        dst_rect: Rect,
        overwrite: bool,
    ) -> Option<Rect> {
        match self.surface.blit(src, src_rect, dst_rect, overwrite) {
            Ok(rect) => self.touched(rect, false),
            Err(err) => {
                warn!("layer blit failed: {err}");
                None
            }
        }
    }

    pub fn flip_x(&mut self) -> Option<Rect> {
        let rect = self.surface.flip_x();
        self.touched(rect, false)
    }

    pub fn flip_y(&mut self) -> Option<Rect> {
        let rect = self.surface.flip_y();
        self.touched(rect, false)
    }

    /// Swap in a new surface wholesale (format conversion).  The backup is
    /// refreshed so undo cannot resurrect pixels in the old format.
    pub(crate) fn replace_surface(&mut self, surface: Surface) {
        self.surface = surface;
        self.make_backup();
        self.events.emit(&EditorEvent::SurfaceChanged {
            layer_id: self.id,
            rect: self.surface.bounds(),
        });
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("size", &(self.surface.width(), self.surface.height()))
            .field("format", &self.surface.format())
            .field("visible", &self.visible)
            .finish()
    }
}
