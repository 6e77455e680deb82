//! The drawing tools and their registry.
//!
//! Tools are deliberately a closed set: a tool is a small amount of
//! dispatch glue between stroke geometry and the layer's draw methods, and
//! an enum keeps that glue in one match per hook instead of a trait object
//! per tool.  The registry owns activation state and key bindings.

use crate::brush::Brush;
use crate::drawing::Drawing;
use crate::error::ToolError;
use crate::rect::{Point, Rect};
use crate::stroke::Stroke;
use crate::surface::{pixel_from_index, Pixel};
use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    /// Freehand: connects successive pointer positions with lines.
    Pencil,
    /// Stamps the brush at each reported position, unconnected.
    Points,
    Line,
    Rectangle,
    Ellipse,
    FloodFill,
    GradientFill,
    /// Drag a region, get it back as an image brush.
    BrushCapture,
    /// Pick the color under the pointer as the new foreground.
    Picker,
}

/// A tool entry: dispatch kind plus the metadata a host needs to present
/// it (display name, key binding, help line).
#[derive(Clone, Copy, Debug)]
pub struct Tool {
    kind: ToolKind,
    name: &'static str,
    key: char,
    /// Preview tools rubber-band: each redraw first restores the region of
    /// the previous one from the backup.
    preview: bool,
    /// Oneshot tools act on press and ignore pointer movement.
    oneshot: bool,
    help: &'static str,
}

impl Tool {
    pub const fn new(
        kind: ToolKind,
        name: &'static str,
        key: char,
        preview: bool,
        oneshot: bool,
        help: &'static str,
    ) -> Self {
        Self {
            kind,
            name,
            key,
            preview,
            oneshot,
            help,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> char {
        self.key
    }

    pub fn preview(&self) -> bool {
        self.preview
    }

    pub fn oneshot(&self) -> bool {
        self.oneshot
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    /// Stroke setup, before the first draw.
    pub fn before(&self, drawing: &mut Drawing, stroke: &Stroke) {
        if self.kind == ToolKind::BrushCapture {
            drawing.set_selection(Some(Rect::spanning(stroke.start, stroke.start)));
        }
    }

    /// Render this tool's effect for the current stroke geometry.
    ///
    /// Preview tools restore the previously drawn region from the backup
    /// first, then redraw from the stroke anchor, so dragging never
    /// leaves stale shape pixels behind.  Returns the touched rect,
    /// `None` when no pixels changed.
    pub fn draw(&self, drawing: &mut Drawing, stroke: &Stroke, brush: &Brush) -> Option<Rect> {
        let restored = if self.preview {
            restore_preview(drawing)
        } else {
            None
        };
        let drawn = match self.kind {
            ToolKind::Pencil => drawing
                .active_layer_mut()
                .draw_line(brush, stroke.last, stroke.pos),
            ToolKind::Points => drawing.active_layer_mut().draw_brush(brush, stroke.pos),
            ToolKind::Line => drawing
                .active_layer_mut()
                .draw_line(brush, stroke.start, stroke.pos),
            ToolKind::Rectangle => {
                let fill = stroke.shift.then_some(stroke.color);
                drawing
                    .active_layer_mut()
                    .draw_rectangle(brush, stroke.start, stroke.pos, fill)
            }
            ToolKind::Ellipse => {
                let fill = stroke.shift.then_some(stroke.color);
                let rx = (stroke.pos.x - stroke.start.x).abs();
                let ry = (stroke.pos.y - stroke.start.y).abs();
                drawing
                    .active_layer_mut()
                    .draw_ellipse(brush, stroke.start, rx, ry, fill)
            }
            ToolKind::FloodFill => drawing
                .active_layer_mut()
                .draw_fill(stroke.pos, stroke.color),
            ToolKind::GradientFill => {
                let ramp = gradient_ramp(drawing, stroke);
                drawing
                    .active_layer_mut()
                    .draw_gradient_fill(stroke.pos, &ramp)
            }
            ToolKind::BrushCapture => {
                drawing.set_selection(Some(Rect::spanning(stroke.start, stroke.pos)));
                None
            }
            ToolKind::Picker => {
                pick_color(drawing, stroke.pos);
                None
            }
        };
        union_opt(restored, drawn)
    }

    /// Stroke teardown, after the final draw.  Brush capture hands back
    /// the captured brush here.
    pub fn after(&self, drawing: &mut Drawing, _stroke: &Stroke) -> Option<Brush> {
        if self.kind != ToolKind::BrushCapture {
            return None;
        }
        let region = drawing.selection()?;
        drawing.set_selection(None);
        let patch = drawing.active_layer_mut().make_patch(region, false);
        if patch.rect().is_empty() {
            return None;
        }
        Some(Brush::from_patch(&patch))
    }
}

/// Put back the pixels of the previous preview draw, if there is one.
fn restore_preview(drawing: &mut Drawing) -> Option<Rect> {
    let layer = drawing.active_layer_mut();
    let pending = layer.last_change()?;
    layer.restore_backup(Some(pending), None, false)
}

fn union_opt(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// The pixel ramp a gradient fill maps rows through: the palette's
/// selected index range, or just the stroke color when none is selected.
fn gradient_ramp(drawing: &Drawing, stroke: &Stroke) -> Vec<Pixel> {
    let palette = drawing.palette().borrow();
    match palette.range() {
        Some((from, to)) => {
            let (lo, hi) = (from.min(to), from.max(to));
            let mut ramp: Vec<Pixel> = (lo..=hi)
                .map(|index| pixel_from_index(drawing.format(), &palette, index))
                .collect();
            if from > to {
                ramp.reverse();
            }
            ramp
        }
        None => vec![stroke.color],
    }
}

fn pick_color(drawing: &mut Drawing, pos: Point) {
    let Some(pixel) = drawing.get_pixel(pos) else {
        return;
    };
    let index = match pixel {
        Pixel::Indexed(index) => Some(index as usize),
        Pixel::Rgba(color) => drawing.palette().borrow().find(color.0),
    };
    if let Some(index) = index {
        if let Err(err) = drawing.palette().borrow_mut().set_foreground(index as u8) {
            warn!("picked color has no palette entry: {err}");
        }
    }
}

/// The active tool set.  Duplicate names or key bindings are rejected at
/// construction, never discovered mid-stroke.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    active: usize,
    previous: usize,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            active: 0,
            previous: 0,
        }
    }

    /// The standard tool set.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let tools = [
            Tool::new(ToolKind::Pencil, "pencil", 'p', false, false, "freehand drawing"),
            Tool::new(ToolKind::Points, "points", 'd', false, false, "stamp the brush"),
            Tool::new(ToolKind::Line, "line", 'l', true, false, "straight line"),
            Tool::new(
                ToolKind::Rectangle,
                "rectangle",
                'r',
                true,
                false,
                "rectangle, shift for filled",
            ),
            Tool::new(
                ToolKind::Ellipse,
                "ellipse",
                'e',
                true,
                false,
                "ellipse, shift for filled",
            ),
            Tool::new(ToolKind::FloodFill, "fill", 'f', false, true, "flood fill"),
            Tool::new(
                ToolKind::GradientFill,
                "gradient",
                'g',
                false,
                true,
                "gradient fill over the palette range",
            ),
            Tool::new(
                ToolKind::BrushCapture,
                "capture",
                'b',
                false,
                false,
                "capture a region as brush",
            ),
            Tool::new(
                ToolKind::Picker,
                "picker",
                'k',
                false,
                false,
                "pick foreground color",
            ),
        ];
        for tool in tools {
            // The built-in set has no duplicates.
            let _ = registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Tool) -> Result<(), ToolError> {
        if self.tools.iter().any(|t| t.name == tool.name) {
            return Err(ToolError::DuplicateName(tool.name.to_owned()));
        }
        if self.tools.iter().any(|t| t.key == tool.key) {
            return Err(ToolError::DuplicateKey(tool.key));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn active(&self) -> &Tool {
        &self.tools[self.active]
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ToolError> {
        let index = self
            .tools
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        if index != self.active {
            self.previous = self.active;
            self.active = index;
        }
        Ok(())
    }

    /// Key binding lookup, for the host's shortcut handling.
    pub fn by_key(&self, key: char) -> Option<&Tool> {
        self.tools.iter().find(|t| t.key == key)
    }

    /// Swap back to the previously active tool (tap-to-toggle picker).
    pub fn activate_previous(&mut self) {
        std::mem::swap(&mut self.active, &mut self.previous);
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
