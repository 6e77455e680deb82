//! Core pixel-buffer engine for a raster drawing editor.
//!
//! The crate is a pure in-process library: it owns the in-memory drawing
//! (palette, layers, pixel surfaces), the patch-based backup/restore
//! mechanism behind undo and live preview, the blit compositing primitive,
//! the stateless drawing algorithms (line, shape, fill, brush stamp), and
//! the stroke state machine that turns pointer events into drawing
//! operations with flicker-free preview and atomic commit.
//!
//! Widget rendering, menus, file-format codecs and persistent storage are
//! the host application's business.  The host feeds pointer events into a
//! [`StrokeEngine`], subscribes to the [`EventBus`] for minimal-repaint
//! notifications, and reads raw pixel buffers back out of [`Surface`] when
//! it wants to export.

#![warn(clippy::all, rust_2018_idioms)]

pub mod brush;
pub mod drawing;
pub mod error;
pub mod event;
pub mod layer;
pub mod ops;
pub mod palette;
pub mod patch;
pub mod rect;
pub mod stroke;
pub mod surface;
pub mod tools;

pub use brush::{Brush, BrushShape};
pub use drawing::Drawing;
pub use error::{DrawingError, PaletteError, SurfaceError, ToolError};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use layer::Layer;
pub use palette::{ColorUpdate, Palette, PaletteRef, Rgba8};
pub use patch::Patch;
pub use rect::{Point, Rect};
pub use stroke::{PointerButton, Stroke, StrokeEngine, StrokeState};
pub use surface::{Pixel, PixelFormat, Surface};
pub use tools::{Tool, ToolKind, ToolRegistry};
