#![allow(clippy::float_cmp)]

use super::*;
use crate::input::{Key, Modifiers};
use crate::scene::{LineShape, RectShape, ShapeRef, Stroke, TriangleShape};
use crate::style::BrushStyle;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn outline() -> Outline {
    Outline { color: "#222".to_owned(), width: 2.0, dashed: false }
}

fn plain_core() -> EngineCore {
    let mut core = EngineCore::new();
    core.set_viewport(800.0, 600.0, 2.0);
    core.ui.settings.pattern = Pattern::None;
    core
}

fn stroke(points: &[(f64, f64)], brush: BrushStyle) -> Shape {
    Shape::Freehand(Stroke {
        points: points.iter().map(|&(x, y)| pt(x, y)).collect(),
        color: "#00f".to_owned(),
        width: 4.0,
        brush,
    })
}

fn rect() -> Shape {
    Shape::Rect(RectShape { x: 0.0, y: 0.0, width: 100.0, height: 50.0, outline: outline() })
}

fn position(frame: &Frame, pred: impl Fn(&DrawOp) -> bool) -> Option<usize> {
    frame.ops.iter().position(pred)
}

fn count(frame: &Frame, pred: impl Fn(&DrawOp) -> bool) -> usize {
    frame.ops.iter().filter(|op| pred(op)).count()
}

// =============================================================
// Frame prologue
// =============================================================

#[test]
fn frame_starts_with_clear_transform_and_page() {
    let mut core = plain_core();
    core.viewport = Viewport { offset_x: 10.0, offset_y: 20.0, scale: 2.0 };
    let frame = build_frame(&core, 0.0);
    assert_eq!(frame.ops[0], DrawOp::Clear { width: 800.0, height: 600.0, dpr: 2.0 });
    assert_eq!(frame.ops[1], DrawOp::Transform { dpr: 2.0, scale: 2.0, offset_x: 10.0, offset_y: 20.0 });
    assert_eq!(
        frame.ops[2],
        DrawOp::FillRect { x: -5.0, y: -10.0, width: 400.0, height: 300.0, color: "#ffffff".to_owned() }
    );
    assert_eq!(frame.ops.len(), 3);
}

#[test]
fn page_color_is_configurable() {
    let mut core = plain_core();
    core.ui.settings.page_color = Rgb { r: 0x10, g: 0x20, b: 0x30 };
    let frame = build_frame(&core, 0.0);
    assert!(matches!(&frame.ops[2], DrawOp::FillRect { color, .. } if color == "#102030"));
}

#[test]
fn visible_window_inverts_viewport() {
    let vp = Viewport { offset_x: -100.0, offset_y: 40.0, scale: 0.5 };
    let w = visible_window(&vp, 200.0, 100.0);
    assert_eq!(w, Bounds { min_x: 200.0, min_y: -80.0, max_x: 600.0, max_y: 120.0 });
}

// =============================================================
// Background pattern
// =============================================================

fn pattern_frame(pattern: Pattern) -> Frame {
    let mut core = EngineCore::new();
    core.set_viewport(48.0, 24.0, 1.0);
    core.ui.settings.pattern = pattern;
    build_frame(&core, 0.0)
}

#[test]
fn pattern_op_counts() {
    let is_dot = |op: &DrawOp| matches!(op, DrawOp::FillCircle { .. });
    let is_line = |op: &DrawOp| matches!(op, DrawOp::Polyline { .. });
    // x lines at 0, 24, 48 and y lines at 0, 24.
    assert_eq!(count(&pattern_frame(Pattern::Dotted), is_dot), 6);
    assert_eq!(count(&pattern_frame(Pattern::Grid), is_line), 5);
    assert_eq!(count(&pattern_frame(Pattern::Ruled), is_line), 2);
    assert_eq!(count(&pattern_frame(Pattern::Matrix), is_line), 12);
    assert_eq!(pattern_frame(Pattern::None).ops.len(), 3);
}

#[test]
fn pattern_ink_contrasts_with_page() {
    assert_eq!(pattern_color(Rgb::WHITE), "rgba(0, 0, 0, 0.12)");
    assert_eq!(pattern_color(Rgb { r: 0, g: 0, b: 0 }), "rgba(255, 255, 255, 0.12)");
    assert_eq!(pattern_color(Rgb { r: 0x20, g: 0x30, b: 0x60 }), "rgba(255, 255, 255, 0.12)");
}

#[test]
fn empty_viewport_draws_no_pattern() {
    let mut core = EngineCore::new();
    core.ui.settings.pattern = Pattern::Grid;
    assert_eq!(build_frame(&core, 0.0).ops.len(), 3);
}

// =============================================================
// Shapes
// =============================================================

#[test]
fn freehand_draws_above_closed_shapes() {
    let mut core = plain_core();
    core.scene.append(stroke(&[(0.0, 0.0), (5.0, 5.0)], BrushStyle::Round));
    core.scene.append(rect());
    let frame = build_frame(&core, 0.0);
    let rect_at = position(&frame, |op| matches!(op, DrawOp::StrokeRect { .. }));
    let stroke_at = position(&frame, |op| matches!(op, DrawOp::Polyline { .. }));
    assert!(rect_at < stroke_at, "{rect_at:?} vs {stroke_at:?}");
}

#[test]
fn single_point_stroke_is_a_dot() {
    let mut core = plain_core();
    core.scene.append(stroke(&[(3.0, 4.0)], BrushStyle::Round));
    let frame = build_frame(&core, 0.0);
    assert_eq!(
        frame.ops.last(),
        Some(&DrawOp::FillCircle { x: 3.0, y: 4.0, radius: 2.0, color: "#00f".to_owned(), alpha: 1.0 })
    );
}

#[test]
fn brush_controls_cap_and_dash() {
    let mut core = plain_core();
    core.scene.append(stroke(&[(0.0, 0.0), (1.0, 1.0)], BrushStyle::Square));
    core.scene.append(stroke(&[(0.0, 0.0), (1.0, 1.0)], BrushStyle::Dashed));
    let frame = build_frame(&core, 0.0);
    let styles: Vec<&StrokeStyle> = frame
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Polyline { style, .. } => Some(style),
            _ => None,
        })
        .collect();
    assert_eq!(styles[0].cap, "square");
    assert_eq!(styles[0].dash, None);
    assert_eq!(styles[1].dash, Some((12.0, 8.0)));
}

#[test]
fn dash_pattern_has_floor() {
    assert_eq!(dash_pattern(1.0), (6.0, 4.0));
    assert_eq!(dash_pattern(4.0), (12.0, 8.0));
}

#[test]
fn arrow_draws_shaft_then_head() {
    let mut core = plain_core();
    core.scene.append(Shape::Arrow(LineShape { x1: 0.0, y1: 0.0, x2: 50.0, y2: 0.0, outline: outline() }));
    let frame = build_frame(&core, 0.0);
    let n = frame.ops.len();
    assert!(matches!(frame.ops[n - 2], DrawOp::Polyline { closed: false, .. }));
    assert!(matches!(&frame.ops[n - 1], DrawOp::FillPolygon { color, .. } if color == "#222"));
}

#[test]
fn arrowhead_is_symmetric_about_shaft() {
    let [tip, left, right] = arrowhead(pt(0.0, 0.0), pt(10.0, 0.0), 1.0);
    assert_eq!(tip, pt(10.0, 0.0));
    assert!(approx_eq(left.x, right.x));
    assert!(approx_eq(left.y, -right.y));
    assert!(approx_eq(tip.distance(left), 10.0));
}

#[test]
fn arrowhead_grows_with_width() {
    let [tip, left, _] = arrowhead(pt(0.0, 0.0), pt(0.0, 100.0), 8.0);
    assert!(approx_eq(tip.distance(left), 24.0));
}

#[test]
fn triangle_is_closed_polyline() {
    let mut core = plain_core();
    let vertices = [pt(0.0, 0.0), pt(10.0, 10.0), pt(-10.0, 10.0)];
    core.scene.append(Shape::Triangle(TriangleShape { vertices, outline: outline() }));
    let frame = build_frame(&core, 0.0);
    assert!(matches!(frame.ops.last(), Some(DrawOp::Polyline { closed: true, points, .. }) if points == &vertices));
}

#[test]
fn draft_draws_after_scene() {
    let mut core = plain_core();
    core.set_tool(Tool::Rect);
    core.scene.append(stroke(&[(0.0, 0.0), (5.0, 5.0)], BrushStyle::Round));
    core.on_pointer_down(pt(10.0, 10.0), 1, 0.0);
    core.on_pointer_move(pt(30.0, 40.0), 1, 0.0);
    let frame = build_frame(&core, 0.0);
    assert!(matches!(
        frame.ops.last(),
        Some(DrawOp::StrokeRect { x, y, width, height, .. }) if (*x, *y, *width, *height) == (10.0, 10.0, 20.0, 30.0)
    ));
}

// =============================================================
// Overlays
// =============================================================

#[test]
fn selection_box_only_under_select_tool() {
    let mut core = plain_core();
    let at = core.scene.append(rect());
    core.ui.selection = Some(at);
    let is_rect = |op: &DrawOp| matches!(op, DrawOp::StrokeRect { .. });

    assert_eq!(count(&build_frame(&core, 0.0), is_rect), 1);

    core.ui.settings.tool = Tool::Select;
    let frame = build_frame(&core, 0.0);
    // Shape, dashed box, four handle outlines.
    assert_eq!(count(&frame, is_rect), 6);
    assert_eq!(count(&frame, |op| matches!(op, DrawOp::FillRect { color, .. } if color == "#fff")), 4);
    assert!(frame.ops.iter().any(|op| matches!(
        op,
        DrawOp::StrokeRect { style, width, height, .. }
            if style.color == "#1E90FF" && style.dash.is_some() && *width == 100.0 && *height == 50.0
    )));
}

#[test]
fn selection_handles_keep_screen_size() {
    let mut core = plain_core();
    core.set_tool(Tool::Select);
    core.viewport.scale = 2.0;
    core.scene.append(rect());
    core.on_pointer_down(pt(0.0, 50.0), 1, 0.0);
    core.on_pointer_up(pt(0.0, 50.0), 1);
    assert_eq!(core.selection(), Some(ShapeRef::new(crate::scene::ShapeKind::Rect, 0)));
    let frame = build_frame(&core, 0.0);
    let handle = frame.ops.iter().find_map(|op| match op {
        DrawOp::FillRect { width, color, .. } if color == "#fff" => Some(*width),
        _ => None,
    });
    assert_eq!(handle, Some(4.0));
}

#[test]
fn stale_selection_draws_nothing() {
    let mut core = plain_core();
    core.ui.settings.tool = Tool::Select;
    core.ui.selection = Some(ShapeRef::new(crate::scene::ShapeKind::Circle, 3));
    assert_eq!(build_frame(&core, 0.0).ops.len(), 3);
}

#[test]
fn eraser_ring_follows_pointer() {
    let mut core = plain_core();
    core.set_tool(Tool::Eraser);
    assert_eq!(build_frame(&core, 0.0).ops.len(), 3);

    core.on_pointer_move(pt(30.0, 40.0), 1, 0.0);
    let frame = build_frame(&core, 0.0);
    assert!(matches!(
        frame.ops.last(),
        Some(DrawOp::StrokeCircle { x, y, radius, .. }) if (*x, *y, *radius) == (30.0, 40.0, 6.0)
    ));

    core.on_pointer_leave(1);
    assert_eq!(build_frame(&core, 0.0).ops.len(), 3);
}

#[test]
fn eraser_ring_is_a_screen_hairline() {
    let mut core = plain_core();
    core.set_tool(Tool::Eraser);
    core.viewport = Viewport { offset_x: 0.0, offset_y: 0.0, scale: 2.0 };
    core.on_pointer_move(pt(30.0, 40.0), 1, 0.0);
    let frame = build_frame(&core, 0.0);
    assert!(matches!(
        frame.ops.last(),
        Some(DrawOp::StrokeCircle { x, y, radius, style })
            if (*x, *y, *radius, style.width) == (15.0, 20.0, 3.0, 0.5)
    ));
}

#[test]
fn laser_segments_fade_with_age() {
    let mut core = plain_core();
    core.set_tool(Tool::Laser);
    core.on_pointer_down(pt(0.0, 0.0), 1, 0.0);
    core.on_pointer_move(pt(10.0, 0.0), 1, 450.0);

    let fresh = build_frame(&core, 450.0);
    let n = fresh.ops.len();
    assert!(matches!(&fresh.ops[n - 2], DrawOp::Polyline { style, .. } if style.alpha == 1.0));
    assert!(matches!(&fresh.ops[n - 1], DrawOp::FillCircle { x, alpha, .. } if *x == 10.0 && *alpha == 1.0));

    let fading = build_frame(&core, 900.0);
    let n = fading.ops.len();
    assert!(matches!(&fading.ops[n - 2], DrawOp::Polyline { style, .. } if approx_eq(style.alpha, 0.5)));

    assert_eq!(build_frame(&core, 2000.0).ops.len(), 3);
}

#[test]
fn undo_is_reflected_in_next_frame() {
    let mut core = plain_core();
    core.set_tool(Tool::Circle);
    core.on_pointer_down(pt(0.0, 0.0), 1, 0.0);
    core.on_pointer_move(pt(5.0, 0.0), 1, 0.0);
    core.on_pointer_up(pt(5.0, 0.0), 1);
    assert_eq!(build_frame(&core, 0.0).ops.len(), 4);
    core.on_key_down(&Key("z".to_owned()), Modifiers { ctrl: true, ..Default::default() });
    assert_eq!(build_frame(&core, 0.0).ops.len(), 3);
}
