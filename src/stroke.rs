//! The stroke state machine.
//!
//! Hosts feed raw pointer events into a [`StrokeEngine`]; the engine
//! resolves them into tool invocations on the active layer, handles the
//! right-button erase convention and canvas panning, throttles move
//! updates, and commits the layer backup when the stroke ends.

use crate::brush::Brush;
use crate::drawing::Drawing;
use crate::rect::{Point, Rect};
use crate::surface::{pixel_from_index, Pixel};
use crate::tools::ToolRegistry;
use log::debug;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Draws with the foreground color.
    Left,
    /// Pans the view.
    Middle,
    /// Draws with the background color (erase, when the background is the
    /// transparent index).
    Right,
}

/// Geometry of the stroke in progress.
#[derive(Clone, Copy, Debug)]
pub struct Stroke {
    pub button: PointerButton,
    /// Where the stroke began; shape tools anchor here.
    pub start: Point,
    /// The last position actually drawn; freehand tools connect from
    /// here.
    pub last: Point,
    /// The current pointer position.
    pub pos: Point,
    pub shift: bool,
    /// The resolved draw color, fixed at stroke start.
    pub color: Pixel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeState {
    Idle,
    /// Inside the tool's setup hook; no pixels drawn yet.
    ToolSetup,
    Drawing,
    Panning,
}

/// Minimum interval between throttled move redraws.
const DEFAULT_THROTTLE: Duration = Duration::from_millis(15);

pub struct StrokeEngine {
    state: StrokeState,
    stroke: Option<Stroke>,
    view_offset: Point,
    pan_anchor: Point,
    throttle: Duration,
    last_update: Option<Instant>,
    captured_brush: Option<Brush>,
    /// Union of everything this stroke has touched so far.
    dirty: Option<Rect>,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self::with_throttle(DEFAULT_THROTTLE)
    }

    pub fn with_throttle(throttle: Duration) -> Self {
        Self {
            state: StrokeState::Idle,
            stroke: None,
            view_offset: Point::default(),
            pan_anchor: Point::default(),
            throttle,
            last_update: None,
            captured_brush: None,
            dirty: None,
        }
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// Accumulated pan offset, in image coordinates.
    pub fn view_offset(&self) -> Point {
        self.view_offset
    }

    /// The brush produced by the most recent capture stroke, if any.
    pub fn take_captured_brush(&mut self) -> Option<Brush> {
        self.captured_brush.take()
    }

    /// Button press.  `pan` is the host's pan modifier (space held).
    /// Presses while a stroke is already in progress are ignored.
    pub fn begin(
        &mut self,
        drawing: &mut Drawing,
        tools: &ToolRegistry,
        brush: &mut Brush,
        pos: Point,
        button: PointerButton,
        shift: bool,
        pan: bool,
    ) {
        if self.state != StrokeState::Idle {
            return;
        }
        if pan || button == PointerButton::Middle {
            self.state = StrokeState::Panning;
            self.pan_anchor = pos;
            return;
        }

        let color = {
            let palette = drawing.palette().borrow();
            let index = match button {
                PointerButton::Right => palette.background(),
                _ => palette.foreground(),
            };
            pixel_from_index(drawing.format(), &palette, index)
        };
        // Right button temporarily recolors the brush to the background;
        // the original pixels come back when the stroke ends.
        if button == PointerButton::Right {
            brush.remember();
            brush.set_color(color);
        } else if brush.paints_with_foreground() {
            brush.set_color(color);
        }

        let stroke = Stroke {
            button,
            start: pos,
            last: pos,
            pos,
            shift,
            color,
        };
        let tool = *tools.active();
        debug!("stroke begin: {} at {:?}", tool.name(), pos);

        self.state = StrokeState::ToolSetup;
        tool.before(drawing, &stroke);
        self.state = StrokeState::Drawing;
        self.stroke = Some(stroke);

        self.accumulate(tool.draw(drawing, &stroke, brush));
        self.last_update = Some(Instant::now());
    }

    /// Pointer move.  Drawing updates are throttled; positions arriving
    /// inside the throttle window move the stroke but do not redraw, and
    /// the final position is always drawn by [`StrokeEngine::end`].
    pub fn update(
        &mut self,
        drawing: &mut Drawing,
        tools: &ToolRegistry,
        brush: &Brush,
        pos: Point,
        shift: bool,
    ) {
        match self.state {
            StrokeState::Panning => {
                self.view_offset = self.view_offset + (pos - self.pan_anchor);
                self.pan_anchor = pos;
            }
            StrokeState::Drawing => {
                let tool = *tools.active();
                let Some(stroke) = self.stroke.as_mut() else {
                    return;
                };
                stroke.pos = pos;
                stroke.shift = shift;
                if tool.oneshot() {
                    return;
                }
                let due = self
                    .last_update
                    .map_or(true, |at| at.elapsed() >= self.throttle);
                if !due {
                    return;
                }
                let snapshot = *stroke;
                self.accumulate(tool.draw(drawing, &snapshot, brush));
                if let Some(stroke) = self.stroke.as_mut() {
                    stroke.last = pos;
                }
                self.last_update = Some(Instant::now());
            }
            _ => {}
        }
    }

    /// Button release.  Non-oneshot tools get one final, unthrottled draw
    /// at the release position, so the committed pixels never lag the
    /// pointer.  Returns the stroke's total dirty rect.
    pub fn end(
        &mut self,
        drawing: &mut Drawing,
        tools: &ToolRegistry,
        brush: &mut Brush,
        pos: Point,
        shift: bool,
    ) -> Option<Rect> {
        match self.state {
            StrokeState::Panning => {
                self.view_offset = self.view_offset + (pos - self.pan_anchor);
                self.state = StrokeState::Idle;
                None
            }
            StrokeState::Drawing => {
                let tool = *tools.active();
                let Some(mut stroke) = self.stroke.take() else {
                    self.state = StrokeState::Idle;
                    return None;
                };
                stroke.pos = pos;
                stroke.shift = shift;
                if !tool.oneshot() {
                    self.accumulate(tool.draw(drawing, &stroke, brush));
                }
                if let Some(captured) = tool.after(drawing, &stroke) {
                    self.captured_brush = Some(captured);
                }
                drawing.active_layer_mut().make_backup();
                if stroke.button == PointerButton::Right {
                    brush.restore();
                }
                debug!("stroke end: {} dirty {:?}", tool.name(), self.dirty);
                self.state = StrokeState::Idle;
                self.last_update = None;
                self.dirty.take()
            }
            _ => None,
        }
    }

    /// Pointer left the canvas.  Outside a stroke this drops any pending
    /// preview pixels (hover cursor); mid-stroke it is a no-op, the
    /// stroke continues when the pointer returns.
    pub fn leave(&mut self, drawing: &mut Drawing) {
        if self.state == StrokeState::Idle {
            drawing.active_layer_mut().clear_preview();
        }
    }

    fn accumulate(&mut self, rect: Option<Rect>) {
        if let Some(rect) = rect {
            self.dirty = Some(match self.dirty {
                Some(dirty) => dirty.union(rect),
                None => rect,
            });
        }
    }
}

impl Default for StrokeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Drawing;
    use crate::surface::PixelFormat;

    fn setup() -> (Drawing, ToolRegistry, Brush, StrokeEngine) {
        let drawing = Drawing::indexed(
            16,
            16,
            vec![[0, 0, 0, 0], [255, 0, 0, 255], [0, 255, 0, 255]],
        );
        let tools = ToolRegistry::builtin();
        let brush = Brush::rectangle(1, 1, Pixel::Indexed(1), PixelFormat::Indexed);
        // Zero throttle so every move draws deterministically
        let engine = StrokeEngine::with_throttle(Duration::ZERO);
        (drawing, tools, brush, engine)
    }

    #[test]
    fn pencil_stroke_draws_and_commits() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(2, 2),
            PointerButton::Left,
            false,
            false,
        );
        assert_eq!(engine.state(), StrokeState::Drawing);
        engine.update(&mut drawing, &tools, &brush, Point::new(6, 2), false);
        let dirty = engine
            .end(&mut drawing, &tools, &mut brush, Point::new(6, 2), false)
            .unwrap();
        assert_eq!(dirty, Rect::new(2, 2, 5, 1));
        assert_eq!(engine.state(), StrokeState::Idle);

        // Committed: a full restore keeps the stroke
        let layer = drawing.active_layer_mut();
        layer.restore_backup(None, None, false);
        assert_eq!(layer.get_pixel(4, 2), Some(Pixel::Indexed(1)));
    }

    #[test]
    fn right_button_erases_and_restores_brush() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        // Paint something first
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(3, 3),
            PointerButton::Left,
            false,
            false,
        );
        engine.end(&mut drawing, &tools, &mut brush, Point::new(3, 3), false);
        assert_eq!(drawing.get_pixel(Point::new(3, 3)), Some(Pixel::Indexed(1)));

        // Erase it with the right button (background is index 0)
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(3, 3),
            PointerButton::Right,
            false,
            false,
        );
        engine.end(&mut drawing, &tools, &mut brush, Point::new(3, 3), false);
        assert_eq!(
            drawing.active_layer_mut().get_pixel(3, 3),
            Some(Pixel::Indexed(0))
        );
        // The brush got its foreground pixels back
        assert_eq!(brush.surface().get_pixel(0, 0), Some(Pixel::Indexed(1)));
    }

    #[test]
    fn panning_never_touches_pixels() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        let before: Vec<u8> = drawing.active_layer_mut().surface().data().to_vec();

        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(0, 0),
            PointerButton::Left,
            false,
            true,
        );
        assert_eq!(engine.state(), StrokeState::Panning);
        engine.update(&mut drawing, &tools, &brush, Point::new(5, 3), false);
        let dirty = engine.end(&mut drawing, &tools, &mut brush, Point::new(7, 4), false);
        assert!(dirty.is_none());
        assert_eq!(engine.view_offset(), Point::new(7, 4));
        assert_eq!(drawing.active_layer_mut().surface().data(), before.as_slice());
    }

    #[test]
    fn middle_button_pans() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(0, 0),
            PointerButton::Middle,
            false,
            false,
        );
        assert_eq!(engine.state(), StrokeState::Panning);
        engine.end(&mut drawing, &tools, &mut brush, Point::new(-3, 2), false);
        assert_eq!(engine.view_offset(), Point::new(-3, 2));
    }

    #[test]
    fn line_preview_leaves_only_final_line() {
        let (mut drawing, mut tools, mut brush, mut engine) = setup();
        tools.set_active("line").unwrap();

        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(2, 2),
            PointerButton::Left,
            false,
            false,
        );
        // Drag through an intermediate position, then settle
        engine.update(&mut drawing, &tools, &brush, Point::new(2, 10), false);
        engine.update(&mut drawing, &tools, &brush, Point::new(10, 2), false);
        engine.end(&mut drawing, &tools, &mut brush, Point::new(10, 2), false);

        // The intermediate vertical line is gone
        assert_eq!(
            drawing.active_layer_mut().get_pixel(2, 10),
            Some(Pixel::Indexed(0))
        );
        for x in 2..=10 {
            assert_eq!(
                drawing.active_layer_mut().get_pixel(x, 2),
                Some(Pixel::Indexed(1))
            );
        }
    }

    #[test]
    fn oneshot_fill_ignores_movement() {
        let (mut drawing, mut tools, mut brush, mut engine) = setup();
        tools.set_active("fill").unwrap();

        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(1, 1),
            PointerButton::Left,
            false,
            false,
        );
        // Whole empty canvas filled on press
        assert_eq!(drawing.get_pixel(Point::new(15, 15)), Some(Pixel::Indexed(1)));

        // Change foreground mid-stroke; movement must not refill
        drawing.palette().borrow_mut().set_foreground(2).unwrap();
        engine.update(&mut drawing, &tools, &brush, Point::new(8, 8), false);
        let dirty = engine
            .end(&mut drawing, &tools, &mut brush, Point::new(8, 8), false)
            .unwrap();
        assert_eq!(dirty, Rect::new(0, 0, 16, 16));
        assert_eq!(drawing.get_pixel(Point::new(8, 8)), Some(Pixel::Indexed(1)));
    }

    #[test]
    fn capture_stroke_yields_a_brush() {
        let (mut drawing, mut tools, mut brush, mut engine) = setup();
        // Paint a dot to capture
        drawing
            .active_layer_mut()
            .draw_brush(&brush, Point::new(4, 4));
        drawing.active_layer_mut().make_backup();

        tools.set_active("capture").unwrap();
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(3, 3),
            PointerButton::Left,
            false,
            false,
        );
        engine.update(&mut drawing, &tools, &brush, Point::new(5, 5), false);
        assert_eq!(drawing.selection(), Some(Rect::new(3, 3, 3, 3)));
        engine.end(&mut drawing, &tools, &mut brush, Point::new(5, 5), false);

        assert_eq!(drawing.selection(), None);
        let captured = engine.take_captured_brush().unwrap();
        assert_eq!(captured.width(), 3);
        assert!(captured.masked(1, 1));
        assert!(!captured.masked(0, 0));
    }

    #[test]
    fn leave_outside_a_stroke_clears_preview() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        // Hover cursor: drawn but not committed
        drawing
            .active_layer_mut()
            .draw_brush(&brush, Point::new(5, 5));
        engine.leave(&mut drawing);
        assert_eq!(
            drawing.active_layer_mut().get_pixel(5, 5),
            Some(Pixel::Indexed(0))
        );

        // Mid-stroke leave keeps the pixels
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(2, 2),
            PointerButton::Left,
            false,
            false,
        );
        engine.leave(&mut drawing);
        assert_eq!(
            drawing.active_layer_mut().get_pixel(2, 2),
            Some(Pixel::Indexed(1))
        );
        engine.end(&mut drawing, &tools, &mut brush, Point::new(2, 2), false);
    }

    #[test]
    fn nested_press_is_ignored() {
        let (mut drawing, tools, mut brush, mut engine) = setup();
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(1, 1),
            PointerButton::Left,
            false,
            false,
        );
        engine.begin(
            &mut drawing,
            &tools,
            &mut brush,
            Point::new(9, 9),
            PointerButton::Right,
            false,
            false,
        );
        // Still the original stroke
        assert_eq!(engine.stroke().map(|s| s.start), Some(Point::new(1, 1)));
        engine.end(&mut drawing, &tools, &mut brush, Point::new(1, 1), false);
    }
}
