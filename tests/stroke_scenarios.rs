//! End-to-end pointer scenarios through the public API.

use pixelpaint::{
    Brush, Drawing, Pixel, PixelFormat, Point, PointerButton, Rect, StrokeEngine, ToolRegistry,
};
use std::time::Duration;

fn setup() -> (Drawing, ToolRegistry, Brush, StrokeEngine) {
    let _ = env_logger::builder().is_test(true).try_init();
    let drawing = Drawing::indexed(
        32,
        32,
        vec![
            [0, 0, 0, 0],
            [255, 255, 255, 255],
            [255, 0, 0, 255],
            [0, 0, 255, 255],
        ],
    );
    let tools = ToolRegistry::builtin();
    let brush = Brush::rectangle(1, 1, Pixel::Indexed(1), PixelFormat::Indexed);
    let engine = StrokeEngine::with_throttle(Duration::ZERO);
    (drawing, tools, brush, engine)
}

#[test]
fn line_stroke_commits_exact_pixels() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    tools.set_active("line").unwrap();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(10, 10),
        PointerButton::Left,
        false,
        false,
    );
    engine.update(&mut drawing, &tools, &brush, Point::new(20, 10), false);
    let dirty = engine
        .end(&mut drawing, &tools, &mut brush, Point::new(20, 10), false)
        .unwrap();
    assert_eq!(dirty, Rect::new(10, 10, 11, 1));

    for x in 10..=20 {
        assert_eq!(drawing.get_pixel(Point::new(x, 10)), Some(Pixel::Indexed(1)));
    }
    assert_eq!(drawing.get_pixel(Point::new(9, 10)), Some(Pixel::Indexed(0)));
    assert_eq!(drawing.get_pixel(Point::new(21, 10)), Some(Pixel::Indexed(0)));

    // Committed: the backup now equals the surface
    let layer = drawing.active_layer_mut();
    layer.restore_backup(None, None, false);
    for x in 10..=20 {
        assert_eq!(layer.get_pixel(x, 10), Some(Pixel::Indexed(1)));
    }
}

#[test]
fn shape_preview_never_leaves_stale_pixels() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    tools.set_active("rectangle").unwrap();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(4, 4),
        PointerButton::Left,
        false,
        false,
    );
    // Wander around before settling
    for pos in [
        Point::new(30, 30),
        Point::new(8, 25),
        Point::new(25, 8),
        Point::new(12, 12),
    ] {
        engine.update(&mut drawing, &tools, &brush, pos, false);
    }
    engine.end(&mut drawing, &tools, &mut brush, Point::new(12, 12), false);

    // Exactly the final outline remains
    let layer = drawing.active_layer_mut();
    let mut painted = 0;
    for y in 0..32 {
        for x in 0..32 {
            let on = layer.get_pixel(x, y) == Some(Pixel::Indexed(1));
            let expected = (4..=12).contains(&x)
                && (4..=12).contains(&y)
                && (x == 4 || x == 12 || y == 4 || y == 12);
            assert_eq!(on, expected, "pixel ({x},{y})");
            painted += on as i32;
        }
    }
    assert_eq!(painted, 32);
}

#[test]
fn filled_shapes_with_shift() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    tools.set_active("rectangle").unwrap();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(2, 2),
        PointerButton::Left,
        true,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(6, 6), true);
    assert_eq!(drawing.get_pixel(Point::new(4, 4)), Some(Pixel::Indexed(1)));
    assert_eq!(drawing.get_pixel(Point::new(2, 6)), Some(Pixel::Indexed(1)));
}

#[test]
fn floodfill_fires_once_per_press() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    tools.set_active("fill").unwrap();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(5, 5),
        PointerButton::Left,
        false,
        false,
    );
    assert_eq!(drawing.get_pixel(Point::new(0, 0)), Some(Pixel::Indexed(1)));

    // A different foreground mid-drag must not trigger a second fill
    drawing.palette().borrow_mut().set_foreground(2).unwrap();
    engine.update(&mut drawing, &tools, &brush, Point::new(9, 9), false);
    engine.end(&mut drawing, &tools, &mut brush, Point::new(9, 9), false);
    assert_eq!(drawing.get_pixel(Point::new(0, 0)), Some(Pixel::Indexed(1)));
}

#[test]
fn gradient_fill_maps_palette_range() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    tools.set_active("gradient").unwrap();
    drawing.palette().borrow_mut().set_range(2, 3).unwrap();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(0, 0),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(0, 0), false);

    // 32 rows over a 2-entry ramp: top half index 2, bottom half index 3
    assert_eq!(drawing.get_pixel(Point::new(5, 0)), Some(Pixel::Indexed(2)));
    assert_eq!(drawing.get_pixel(Point::new(5, 15)), Some(Pixel::Indexed(2)));
    assert_eq!(drawing.get_pixel(Point::new(5, 16)), Some(Pixel::Indexed(3)));
    assert_eq!(drawing.get_pixel(Point::new(5, 31)), Some(Pixel::Indexed(3)));
}

#[test]
fn erase_with_right_button_then_brush_recovers() {
    let (mut drawing, tools, mut brush, mut engine) = setup();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(8, 8),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(12, 8), false);
    assert_eq!(drawing.get_pixel(Point::new(10, 8)), Some(Pixel::Indexed(1)));

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(8, 8),
        PointerButton::Right,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(12, 8), false);
    for x in 8..=12 {
        assert_eq!(
            drawing.active_layer_mut().get_pixel(x, 8),
            Some(Pixel::Indexed(0))
        );
    }

    // Next left stroke paints foreground again
    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(0, 0),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(0, 0), false);
    assert_eq!(drawing.get_pixel(Point::new(0, 0)), Some(Pixel::Indexed(1)));
}

#[test]
fn space_pan_moves_view_only() {
    let (mut drawing, tools, mut brush, mut engine) = setup();
    let before: Vec<u8> = drawing.active_layer_mut().surface().data().to_vec();

    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(10, 10),
        PointerButton::Left,
        false,
        true,
    );
    engine.update(&mut drawing, &tools, &brush, Point::new(14, 12), false);
    engine.update(&mut drawing, &tools, &brush, Point::new(18, 14), false);
    assert!(engine
        .end(&mut drawing, &tools, &mut brush, Point::new(18, 14), false)
        .is_none());

    assert_eq!(engine.view_offset(), Point::new(8, 4));
    assert_eq!(drawing.active_layer_mut().surface().data(), before.as_slice());
}

#[test]
fn captured_brush_stamps_its_own_colors() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();

    // Paint a two-color motif
    drawing
        .active_layer_mut()
        .draw_brush(&Brush::rectangle(1, 1, Pixel::Indexed(2), PixelFormat::Indexed), Point::new(2, 2));
    drawing
        .active_layer_mut()
        .draw_brush(&Brush::rectangle(1, 1, Pixel::Indexed(3), PixelFormat::Indexed), Point::new(3, 2));
    drawing.active_layer_mut().make_backup();

    tools.set_active("capture").unwrap();
    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(2, 2),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(3, 2), false);
    let mut captured = engine.take_captured_brush().unwrap();

    // Stamp it elsewhere: colors survive, a left press does not recolor it
    tools.set_active("points").unwrap();
    engine.begin(
        &mut drawing,
        &tools,
        &mut captured,
        Point::new(20, 20),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut captured, Point::new(20, 20), false);
    assert_eq!(drawing.get_pixel(Point::new(19, 20)), Some(Pixel::Indexed(2)));
    assert_eq!(drawing.get_pixel(Point::new(20, 20)), Some(Pixel::Indexed(3)));
}

#[test]
fn picker_sets_foreground_from_canvas() {
    let (mut drawing, mut tools, mut brush, mut engine) = setup();
    drawing
        .active_layer_mut()
        .draw_brush(&Brush::rectangle(1, 1, Pixel::Indexed(3), PixelFormat::Indexed), Point::new(6, 6));
    drawing.active_layer_mut().make_backup();

    tools.set_active("picker").unwrap();
    engine.begin(
        &mut drawing,
        &tools,
        &mut brush,
        Point::new(6, 6),
        PointerButton::Left,
        false,
        false,
    );
    engine.end(&mut drawing, &tools, &mut brush, Point::new(6, 6), false);
    assert_eq!(drawing.palette().borrow().foreground(), 3);
}
