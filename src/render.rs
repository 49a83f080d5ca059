//! Rendering: plans a frame as a display list, then replays it onto a 2D context.
//!
//! [`build_frame`] reads the engine state and produces a [`Frame`], an ordered
//! list of [`DrawOp`]s in world or device coordinates. It is pure and does not
//! touch the browser, so draw order and styling are unit-testable.
//! [`paint`] is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//!
//! Layer order, bottom to top:
//! 1. clear, 2. viewport transform, 3. page fill, 4. background pattern,
//! 5. closed shapes and lines (rect, circle, line, arrow, triangle),
//! 6. freehand strokes, 7. draft, 8. selection box and handles,
//! 9. eraser preview ring, 10. laser trail.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::PATTERN_STEP;
use crate::engine::EngineCore;
use crate::geometry::{Bounds, bounds};
use crate::input::Tool;
use crate::laser::LaserTrail;
use crate::scene::{Outline, Shape, ShapeKind};
use crate::style::{Pattern, Rgb};
use crate::viewport::{Point, Viewport};

/// Arrowhead length in world units for thin arrows.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

/// Selection outline and handle color.
const SELECTION_COLOR: &str = "#1E90FF";

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Drawn half-size of a resize handle in screen pixels.
const HANDLE_DRAW_PX: f64 = 4.0;

/// Eraser preview ring color.
const ERASER_RING_COLOR: &str = "rgba(120, 120, 120, 0.8)";

const LASER_COLOR: &str = "#ff3b30";
const LASER_HEAD_COLOR: &str = "#ffd6d3";
const LASER_WIDTH_PX: f64 = 3.0;
const LASER_HEAD_PX: f64 = 4.0;

const PATTERN_ON_LIGHT: &str = "rgba(0, 0, 0, 0.12)";
const PATTERN_ON_DARK: &str = "rgba(255, 255, 255, 0.12)";
const PATTERN_DOT_PX: f64 = 1.2;

/// How a path is stroked.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    /// Line width in world units.
    pub width: f64,
    /// Dash and gap lengths in world units; `None` for a solid line.
    pub dash: Option<(f64, f64)>,
    /// Canvas `lineCap`.
    pub cap: &'static str,
    /// Global alpha in `[0, 1]`.
    pub alpha: f64,
}

impl StrokeStyle {
    fn solid(color: &str, width: f64) -> Self {
        Self { color: color.to_owned(), width, dash: None, cap: "round", alpha: 1.0 }
    }

    fn from_outline(outline: &Outline) -> Self {
        Self {
            color: outline.color.clone(),
            width: outline.width,
            dash: outline.dashed.then(|| dash_pattern(outline.width)),
            cap: "round",
            alpha: 1.0,
        }
    }
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Reset to device pixels and clear the CSS-pixel viewport.
    Clear { width: f64, height: f64, dpr: f64 },
    /// Map world coordinates to device pixels for every following op.
    Transform { dpr: f64, scale: f64, offset_x: f64, offset_y: f64 },
    FillRect { x: f64, y: f64, width: f64, height: f64, color: String },
    StrokeRect { x: f64, y: f64, width: f64, height: f64, style: StrokeStyle },
    Polyline { points: Vec<Point>, closed: bool, style: StrokeStyle },
    StrokeCircle { x: f64, y: f64, radius: f64, style: StrokeStyle },
    FillCircle { x: f64, y: f64, radius: f64, color: String, alpha: f64 },
    FillPolygon { points: Vec<Point>, color: String },
}

/// An ordered display list for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub ops: Vec<DrawOp>,
}

// =============================================================
// Frame planning
// =============================================================

/// Plan the full frame for the engine's current state at `now_ms`.
#[must_use]
pub fn build_frame(core: &EngineCore, now_ms: f64) -> Frame {
    let vp = core.viewport;
    let settings = &core.ui.settings;
    let mut ops = vec![
        DrawOp::Clear { width: core.viewport_width, height: core.viewport_height, dpr: core.dpr },
        DrawOp::Transform { dpr: core.dpr, scale: vp.scale, offset_x: vp.offset_x, offset_y: vp.offset_y },
    ];

    let window = visible_window(&vp, core.viewport_width, core.viewport_height);
    ops.push(DrawOp::FillRect {
        x: window.min_x,
        y: window.min_y,
        width: window.width(),
        height: window.height(),
        color: settings.page_color.css(),
    });
    pattern_ops(&mut ops, settings.pattern, settings.page_color, &window, vp.scale);

    for kind in ShapeKind::RENDER_ORDER {
        for shape in core.scene.layer(kind) {
            shape_ops(&mut ops, shape);
        }
    }

    if let Some(draft) = core.draft() {
        shape_ops(&mut ops, &draft.to_shape(core.current_outline()));
    }

    if settings.tool == Tool::Select {
        let selected = core.ui.selection.and_then(|sel| core.scene.get(sel)).and_then(bounds);
        if let Some(b) = selected {
            selection_ops(&mut ops, &b, vp.scale);
        }
    }

    if settings.tool == Tool::Eraser {
        if let Some(p) = core.ui.pointer_world {
            ops.push(DrawOp::StrokeCircle {
                x: p.x,
                y: p.y,
                radius: core.eraser_reach(),
                style: StrokeStyle::solid(ERASER_RING_COLOR, vp.screen_dist_to_world(1.0)),
            });
        }
    }

    laser_ops(&mut ops, &core.laser, now_ms, vp.scale);

    Frame { ops }
}

/// World-space rectangle covered by a `width` x `height` CSS-pixel viewport.
#[must_use]
pub fn visible_window(vp: &Viewport, width: f64, height: f64) -> Bounds {
    let tl = vp.screen_to_world(Point::new(0.0, 0.0));
    let br = vp.screen_to_world(Point::new(width, height));
    Bounds { min_x: tl.x, min_y: tl.y, max_x: br.x, max_y: br.y }
}

/// Pattern ink that contrasts with `page`.
#[must_use]
pub fn pattern_color(page: Rgb) -> &'static str {
    if page.luminance() > 0.5 { PATTERN_ON_LIGHT } else { PATTERN_ON_DARK }
}

/// Dash and gap lengths for a dashed outline of the given width.
#[must_use]
pub fn dash_pattern(width: f64) -> (f64, f64) {
    ((width * 3.0).max(6.0), (width * 2.0).max(4.0))
}

/// Arrowhead triangle for a segment ending at `tip`.
#[must_use]
pub fn arrowhead(tail: Point, tip: Point, stroke_width: f64) -> [Point; 3] {
    let size = ARROW_SIZE.max(stroke_width * 3.0);
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    [
        tip,
        Point::new(tip.x - size * (angle - ARROW_ANGLE).cos(), tip.y - size * (angle - ARROW_ANGLE).sin()),
        Point::new(tip.x - size * (angle + ARROW_ANGLE).cos(), tip.y - size * (angle + ARROW_ANGLE).sin()),
    ]
}

/// Multiples of `PATTERN_STEP` covering `[lo, hi]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn grid_range(lo: f64, hi: f64) -> impl Iterator<Item = f64> {
    let first = (lo / PATTERN_STEP).floor() as i64;
    let last = (hi / PATTERN_STEP).ceil() as i64;
    (first..=last).map(|i| i as f64 * PATTERN_STEP)
}

fn pattern_ops(ops: &mut Vec<DrawOp>, pattern: Pattern, page: Rgb, window: &Bounds, scale: f64) {
    if window.width() <= 0.0 || window.height() <= 0.0 {
        return;
    }
    let color = pattern_color(page);
    let line = |a: Point, b: Point| DrawOp::Polyline {
        points: vec![a, b],
        closed: false,
        style: StrokeStyle::solid(color, 1.0 / scale),
    };
    match pattern {
        Pattern::None => {}
        Pattern::Dotted => {
            for x in grid_range(window.min_x, window.max_x) {
                for y in grid_range(window.min_y, window.max_y) {
                    ops.push(DrawOp::FillCircle {
                        x,
                        y,
                        radius: PATTERN_DOT_PX / scale,
                        color: color.to_owned(),
                        alpha: 1.0,
                    });
                }
            }
        }
        Pattern::Grid => {
            for x in grid_range(window.min_x, window.max_x) {
                ops.push(line(Point::new(x, window.min_y), Point::new(x, window.max_y)));
            }
            for y in grid_range(window.min_y, window.max_y) {
                ops.push(line(Point::new(window.min_x, y), Point::new(window.max_x, y)));
            }
        }
        Pattern::Ruled => {
            for y in grid_range(window.min_y, window.max_y) {
                ops.push(line(Point::new(window.min_x, y), Point::new(window.max_x, y)));
            }
        }
        Pattern::Matrix => {
            let arm = PATTERN_STEP * 0.2;
            for x in grid_range(window.min_x, window.max_x) {
                for y in grid_range(window.min_y, window.max_y) {
                    ops.push(line(Point::new(x - arm, y), Point::new(x + arm, y)));
                    ops.push(line(Point::new(x, y - arm), Point::new(x, y + arm)));
                }
            }
        }
    }
}

fn shape_ops(ops: &mut Vec<DrawOp>, shape: &Shape) {
    match shape {
        Shape::Freehand(s) => match s.points.as_slice() {
            [] => {}
            [dot] => ops.push(DrawOp::FillCircle {
                x: dot.x,
                y: dot.y,
                radius: s.width / 2.0,
                color: s.color.clone(),
                alpha: 1.0,
            }),
            points => ops.push(DrawOp::Polyline {
                points: points.to_vec(),
                closed: false,
                style: StrokeStyle {
                    color: s.color.clone(),
                    width: s.width,
                    dash: s.brush.is_dashed().then(|| dash_pattern(s.width)),
                    cap: s.brush.line_cap(),
                    alpha: 1.0,
                },
            }),
        },
        Shape::Rect(r) => ops.push(DrawOp::StrokeRect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            style: StrokeStyle::from_outline(&r.outline),
        }),
        Shape::Circle(c) => ops.push(DrawOp::StrokeCircle {
            x: c.x,
            y: c.y,
            radius: c.radius.max(0.0),
            style: StrokeStyle::from_outline(&c.outline),
        }),
        Shape::Line(l) => ops.push(DrawOp::Polyline {
            points: vec![l.start(), l.end()],
            closed: false,
            style: StrokeStyle::from_outline(&l.outline),
        }),
        Shape::Arrow(l) => {
            ops.push(DrawOp::Polyline {
                points: vec![l.start(), l.end()],
                closed: false,
                style: StrokeStyle::from_outline(&l.outline),
            });
            ops.push(DrawOp::FillPolygon {
                points: arrowhead(l.start(), l.end(), l.outline.width).to_vec(),
                color: l.outline.color.clone(),
            });
        }
        Shape::Triangle(t) => ops.push(DrawOp::Polyline {
            points: t.vertices.to_vec(),
            closed: true,
            style: StrokeStyle::from_outline(&t.outline),
        }),
    }
}

fn selection_ops(ops: &mut Vec<DrawOp>, b: &Bounds, scale: f64) {
    let dash = SELECTION_DASH_PX / scale;
    ops.push(DrawOp::StrokeRect {
        x: b.min_x,
        y: b.min_y,
        width: b.width(),
        height: b.height(),
        style: StrokeStyle { dash: Some((dash, dash)), ..StrokeStyle::solid(SELECTION_COLOR, 1.0 / scale) },
    });
    let half = HANDLE_DRAW_PX / scale;
    for corner in b.corners() {
        ops.push(DrawOp::FillRect {
            x: corner.x - half,
            y: corner.y - half,
            width: half * 2.0,
            height: half * 2.0,
            color: "#fff".to_owned(),
        });
        ops.push(DrawOp::StrokeRect {
            x: corner.x - half,
            y: corner.y - half,
            width: half * 2.0,
            height: half * 2.0,
            style: StrokeStyle::solid(SELECTION_COLOR, 1.0 / scale),
        });
    }
}

fn laser_ops(ops: &mut Vec<DrawOp>, laser: &LaserTrail, now_ms: f64, scale: f64) {
    let samples: Vec<_> = laser.iter().collect();
    for pair in samples.windows(2) {
        let [from, to] = pair else {
            continue;
        };
        let alpha = to.life(now_ms);
        if alpha <= 0.0 {
            continue;
        }
        ops.push(DrawOp::Polyline {
            points: vec![from.point(), to.point()],
            closed: false,
            style: StrokeStyle { alpha, ..StrokeStyle::solid(LASER_COLOR, LASER_WIDTH_PX / scale) },
        });
    }
    if let Some(head) = laser.head() {
        let alpha = head.life(now_ms);
        if alpha > 0.0 {
            ops.push(DrawOp::FillCircle {
                x: head.x,
                y: head.y,
                radius: LASER_HEAD_PX / scale,
                color: LASER_HEAD_COLOR.to_owned(),
                alpha,
            });
        }
    }
}

// =============================================================
// Replay
// =============================================================

/// Replay `frame` onto `ctx`.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn paint(ctx: &CanvasRenderingContext2d, frame: &Frame) -> Result<(), JsValue> {
    for op in &frame.ops {
        paint_op(ctx, op)?;
    }
    Ok(())
}

fn paint_op(ctx: &CanvasRenderingContext2d, op: &DrawOp) -> Result<(), JsValue> {
    match op {
        DrawOp::Clear { width, height, dpr } => {
            ctx.set_transform(*dpr, 0.0, 0.0, *dpr, 0.0, 0.0)?;
            ctx.clear_rect(0.0, 0.0, *width, *height);
        }
        DrawOp::Transform { dpr, scale, offset_x, offset_y } => {
            let s = dpr * scale;
            ctx.set_transform(s, 0.0, 0.0, s, dpr * offset_x, dpr * offset_y)?;
        }
        DrawOp::FillRect { x, y, width, height, color } => {
            ctx.set_global_alpha(1.0);
            ctx.set_fill_style_str(color);
            ctx.fill_rect(*x, *y, *width, *height);
        }
        DrawOp::StrokeRect { x, y, width, height, style } => {
            ctx.save();
            apply_stroke_style(ctx, style)?;
            ctx.stroke_rect(*x, *y, *width, *height);
            ctx.restore();
        }
        DrawOp::Polyline { points, closed, style } => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            ctx.save();
            apply_stroke_style(ctx, style)?;
            ctx.begin_path();
            ctx.move_to(first.x, first.y);
            for p in rest {
                ctx.line_to(p.x, p.y);
            }
            if *closed {
                ctx.close_path();
            }
            ctx.stroke();
            ctx.restore();
        }
        DrawOp::StrokeCircle { x, y, radius, style } => {
            ctx.save();
            apply_stroke_style(ctx, style)?;
            ctx.begin_path();
            ctx.arc(*x, *y, *radius, 0.0, 2.0 * PI)?;
            ctx.stroke();
            ctx.restore();
        }
        DrawOp::FillCircle { x, y, radius, color, alpha } => {
            ctx.save();
            ctx.set_global_alpha(*alpha);
            ctx.set_fill_style_str(color);
            ctx.begin_path();
            ctx.arc(*x, *y, *radius, 0.0, 2.0 * PI)?;
            ctx.fill();
            ctx.restore();
        }
        DrawOp::FillPolygon { points, color } => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            ctx.save();
            ctx.set_fill_style_str(color);
            ctx.begin_path();
            ctx.move_to(first.x, first.y);
            for p in rest {
                ctx.line_to(p.x, p.y);
            }
            ctx.close_path();
            ctx.fill();
            ctx.restore();
        }
    }
    Ok(())
}

/// Apply color, width, cap, dash, and alpha from `style`.
fn apply_stroke_style(ctx: &CanvasRenderingContext2d, style: &StrokeStyle) -> Result<(), JsValue> {
    ctx.set_global_alpha(style.alpha);
    ctx.set_stroke_style_str(&style.color);
    ctx.set_line_width(style.width);
    ctx.set_line_cap(style.cap);
    ctx.set_line_join("round");
    let dash_array = js_sys::Array::new();
    if let Some((dash, gap)) = style.dash {
        dash_array.push(&dash.into());
        dash_array.push(&gap.into());
    }
    ctx.set_line_dash(&dash_array)?;
    Ok(())
}
