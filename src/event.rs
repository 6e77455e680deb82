//! Change notifications for external renderers.
//!
//! The engine never draws to a screen; instead every pixel-touching
//! operation reports the affected rect (or palette/layer change) on a bus
//! the viewport and thumbnail views subscribe to, so they can repaint only
//! what changed.

use crate::palette::Rgba8;
use crate::rect::Rect;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Everything the core broadcasts to its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Pixels inside `rect` of the given layer changed.
    SurfaceChanged { layer_id: Uuid, rect: Rect },
    /// One palette entry was edited; carries the resolved color.
    PaletteColorChanged { index: usize, rgba: Rgba8 },
    /// The whole color table was replaced.
    PaletteReplaced,
    ForegroundChanged(u8),
    BackgroundChanged(u8),
    /// The gradient index range selection changed.
    RangeChanged { from: u8, to: u8 },
    LayerAdded { index: usize, layer_id: Uuid },
    LayerRemoved { index: usize, layer_id: Uuid },
    LayerMoved { from: usize, to: usize },
    LayerActivated { index: usize, layer_id: Uuid },
    SelectionChanged(Option<Rect>),
}

/// Receives events from the bus.
pub trait EventHandler {
    fn handle_event(&mut self, event: &EditorEvent);
}

impl<F: FnMut(&EditorEvent)> EventHandler for F {
    fn handle_event(&mut self, event: &EditorEvent) {
        self(event)
    }
}

/// A simple single-threaded broadcast bus.
///
/// Clones share the same handler list, so the palette, every layer and the
/// document can all emit into the bus the host subscribed to.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Rc<RefCell<Vec<Box<dyn EventHandler>>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to receive all subsequent events.
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Emit an event to every registered handler, in subscription order.
    pub fn emit(&self, event: &EditorEvent) {
        for handler in self.handlers.borrow_mut().iter_mut() {
            handler.handle_event(event);
        }
    }
}
