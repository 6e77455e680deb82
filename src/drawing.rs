//! The document: a palette plus an ordered stack of layers.
//!
//! Layer order is bottom-to-top; compositing and the pixel probe walk the
//! stack accordingly.  All layers share one palette and one event bus, so
//! a palette edit repaints every layer and any observer sees every change
//! through a single subscription.

use crate::error::DrawingError;
use crate::event::{EditorEvent, EventBus};
use crate::layer::Layer;
use crate::palette::{Palette, PaletteRef, Rgba8};
use crate::rect::{Point, Rect};
use crate::surface::{Pixel, PixelFormat, Surface, TRANSPARENT_INDEX};

pub struct Drawing {
    width: u32,
    height: u32,
    format: PixelFormat,
    palette: PaletteRef,
    layers: Vec<Layer>,
    active_index: usize,
    selection: Option<Rect>,
    events: EventBus,
}

impl Drawing {
    /// A drawing always has at least one layer; one is created here.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        palette: PaletteRef,
        events: EventBus,
    ) -> Self {
        let layer = Layer::new(
            width,
            height,
            format,
            PaletteRef::clone(&palette),
            events.clone(),
        );
        Self {
            width,
            height,
            format,
            palette,
            layers: vec![layer],
            active_index: 0,
            selection: None,
            events,
        }
    }

    /// Convenience constructor for an indexed drawing with a fresh bus.
    /// Index 0 becomes the transparent color.
    pub fn indexed(width: u32, height: u32, colors: Vec<Rgba8>) -> Self {
        let events = EventBus::new();
        let palette = Palette::new(colors, &[TRANSPARENT_INDEX as usize], events.clone()).shared();
        Self::new(width, height, PixelFormat::Indexed, palette, events)
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

    pub fn palette(&self) -> &PaletteRef {
        &self.palette
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_index]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active_index]
    }

    fn check_layer_index(&self, index: usize) -> Result<(), DrawingError> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(DrawingError::LayerIndexOutOfRange {
                index,
                len: self.layers.len(),
            })
        }
    }

    /// Append a new empty layer on top of the stack.
    pub fn add_layer(&mut self, activate: bool) -> usize {
        let layer = Layer::new(
            self.width,
            self.height,
            self.format,
            PaletteRef::clone(&self.palette),
            self.events.clone(),
        );
        let index = self.layers.len();
        let layer_id = layer.id();
        self.layers.push(layer);
        self.events.emit(&EditorEvent::LayerAdded { index, layer_id });
        if activate {
            self.active_index = index;
            self.events
                .emit(&EditorEvent::LayerActivated { index, layer_id });
        }
        index
    }

    /// Remove a layer.  The last remaining layer cannot be removed.
    pub fn remove_layer(&mut self, index: usize) -> Result<(), DrawingError> {
        self.check_layer_index(index)?;
        if self.layers.len() == 1 {
            return Err(DrawingError::LastLayer);
        }
        let layer = self.layers.remove(index);
        self.events.emit(&EditorEvent::LayerRemoved {
            index,
            layer_id: layer.id(),
        });
        if self.active_index >= self.layers.len() {
            self.active_index = self.layers.len() - 1;
        }
        Ok(())
    }

    /// Move a layer to a new stack position; the moved layer stays
    /// active if it was.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), DrawingError> {
        self.check_layer_index(from)?;
        self.check_layer_index(to)?;
        if from == to {
            return Ok(());
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        if self.active_index == from {
            self.active_index = to;
        } else if from < self.active_index && self.active_index <= to {
            self.active_index -= 1;
        } else if to <= self.active_index && self.active_index < from {
            self.active_index += 1;
        }
        self.events.emit(&EditorEvent::LayerMoved { from, to });
        Ok(())
    }

    pub fn activate_layer(&mut self, index: usize) -> Result<(), DrawingError> {
        self.check_layer_index(index)?;
        self.active_index = index;
        self.events.emit(&EditorEvent::LayerActivated {
            index,
            layer_id: self.layers[index].id(),
        });
        Ok(())
    }

    /// Reset a layer to a solid value (or transparent) and commit.
    pub fn clear_layer(&mut self, index: usize, value: Option<Pixel>) -> Result<(), DrawingError> {
        self.check_layer_index(index)?;
        let layer = &mut self.layers[index];
        layer.draw_clear(value);
        layer.make_backup();
        Ok(())
    }

    pub fn flip_layer_horizontal(&mut self, index: usize) -> Result<(), DrawingError> {
        self.check_layer_index(index)?;
        let layer = &mut self.layers[index];
        layer.flip_x();
        layer.make_backup();
        Ok(())
    }

    pub fn flip_layer_vertical(&mut self, index: usize) -> Result<(), DrawingError> {
        self.check_layer_index(index)?;
        let layer = &mut self.layers[index];
        layer.flip_y();
        layer.make_backup();
        Ok(())
    }

    /// What the composited drawing shows at `pos`: the topmost visible
    /// non-transparent pixel, or the transparent value when nothing is
    /// painted there.  `None` outside the canvas.
    pub fn get_pixel(&self, pos: Point) -> Option<Pixel> {
        let mut result = None;
        for layer in self.layers.iter().rev() {
            if !layer.visible() {
                continue;
            }
            let pixel = layer.get_pixel(pos.x, pos.y)?;
            if result.is_none() {
                result = Some(pixel);
            }
            if !pixel.is_transparent() {
                return Some(pixel);
            }
        }
        result
    }

    /// Composite all visible layers into one surface, bottom to top.
    pub fn flatten_visible(&self) -> Surface {
        let mut flat = Surface::new(self.width, self.height, self.format);
        let bounds = flat.bounds();
        for layer in self.layers.iter().filter(|l| l.visible()) {
            // Same format and full bounds, cannot fail.
            let _ = flat.blit(layer.surface(), bounds, bounds, false);
        }
        flat
    }

    /// Bake the palette into every layer and switch the drawing to direct
    /// color.  One-way; palette edits no longer recolor existing pixels.
    pub fn convert_to_rgba(&mut self) -> Result<(), DrawingError> {
        if self.format == PixelFormat::Rgba {
            return Err(DrawingError::AlreadyDirectColor);
        }
        let palette = self.palette.borrow();
        for layer in &mut self.layers {
            let data = layer.surface().to_rgba_pixels(&palette);
            // Expansion preserves dimensions, the length always matches.
            if let Ok(surface) = Surface::from_raw(self.width, self.height, PixelFormat::Rgba, data)
            {
                layer.replace_surface(surface);
            }
        }
        drop(palette);
        self.format = PixelFormat::Rgba;
        Ok(())
    }

    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Rect>) {
        let selection = selection.map(|r| r.intersect(self.bounds()));
        if self.selection != selection {
            self.selection = selection;
            self.events.emit(&EditorEvent::SelectionChanged(selection));
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Layers flagged for flipbook playback.
    pub fn animated_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.animated())
    }
}

impl std::fmt::Debug for Drawing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawing")
            .field("size", &(self.width, self.height))
            .field("format", &self.format)
            .field("layers", &self.layers.len())
            .field("active", &self.active_index)
            .finish()
    }
}
