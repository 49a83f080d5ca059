//! Eraser: splits freehand strokes around the eraser path and deletes other
//! shapes whose outline it touches.
//!
//! Erasing is applied incrementally. Every pointer-move is broken into small
//! sub-steps and each sub-step is applied to the scene immediately, so strokes
//! visibly shrink while the eraser is dragged.

#[cfg(test)]
#[path = "eraser_test.rs"]
mod eraser_test;

use crate::consts::{ERASER_MIN_PX, ERASER_MIN_STEP, ERASER_STEP_FACTOR};
use crate::geometry::hits_shape;
use crate::scene::{Scene, Shape, ShapeKind, Stroke};
use crate::viewport::Point;

/// Shape kinds erased as a whole rather than split.
const WHOLE_SHAPE_KINDS: [ShapeKind; 5] =
    [ShapeKind::Rect, ShapeKind::Circle, ShapeKind::Line, ShapeKind::Arrow, ShapeKind::Triangle];

/// Eraser reach in world units for the selected tool width at `scale`.
#[must_use]
pub fn eraser_reach(tool_width: f64, scale: f64) -> f64 {
    (ERASER_MIN_PX / scale).max(tool_width / 2.0)
}

/// Distance between interpolated eraser samples for the selected tool width.
#[must_use]
pub fn step_size(tool_width: f64) -> f64 {
    ERASER_MIN_STEP.max(tool_width * ERASER_STEP_FACTOR)
}

/// Points from `from` (exclusive) to `to` (inclusive), no more than `step` apart.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn interpolate(from: Point, to: Point, step: f64) -> Vec<Point> {
    let steps = (from.distance(to) / step).ceil().max(1.0) as usize;
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            Point::new(from.x + dx * t, from.y + dy * t)
        })
        .collect()
}

/// Split a stroke's points around an eraser path.
///
/// A point is erased when any path point lies within `radius` of it. The
/// surviving points are grouped into maximal consecutive runs. Each run is
/// extended to the eraser edge: where a survivor neighbours an erased point,
/// the point at which the segment between them enters the eraser circle is
/// added to the run. Only runs of two or more points are returned, so a
/// fully erased stroke yields nothing.
#[must_use]
pub fn segment_stroke(points: &[Point], eraser_path: &[Point], radius: f64) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut prev: Option<(Point, bool)> = None;
    for &p in points {
        let erased = eraser_path.iter().any(|e| e.distance(p) <= radius);
        match (prev, erased) {
            (Some((survivor, false)), true) => {
                current.extend(eraser_edge(survivor, p, eraser_path, radius));
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            (Some((gone, true)), false) => {
                current.extend(eraser_edge(p, gone, eraser_path, radius));
                current.push(p);
            }
            (_, false) => current.push(p),
            (_, true) => {}
        }
        prev = Some((p, erased));
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

/// First point on the segment `from -> to` that lies within `radius` of an
/// eraser path point. `from` must be outside every eraser circle.
fn eraser_edge(from: Point, to: Point, eraser_path: &[Point], radius: f64) -> Option<Point> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let a = dx * dx + dy * dy;
    if a <= 0.0 {
        return None;
    }
    eraser_path
        .iter()
        .filter_map(|e| {
            // Solve |from + t * d - e| = radius for the entering root.
            let (fx, fy) = (from.x - e.x, from.y - e.y);
            let b = 2.0 * (fx * dx + fy * dy);
            let c = fx * fx + fy * fy - radius * radius;
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                return None;
            }
            let t = (-b - disc.sqrt()) / (2.0 * a);
            (0.0..=1.0).contains(&t).then_some(t)
        })
        .min_by(f64::total_cmp)
        .map(|t| Point::new(from.x + dx * t, from.y + dy * t))
}

/// Apply one eraser sample at `at` with the given `reach` (world units).
///
/// Freehand strokes are split at the erased points; each stroke uses
/// `max(reach, stroke width / 2)` so thick strokes erase where they are
/// painted. Other shapes are deleted whole when `at` is within reach of their
/// outline. Returns `true` if the scene changed.
pub fn erase_at(scene: &mut Scene, at: Point, reach: f64) -> bool {
    let mut changed = erase_strokes(scene, at, reach);
    for kind in WHOLE_SHAPE_KINDS {
        changed |= scene.filter_out(kind, |shape| hits_shape(at, shape, reach)) > 0;
    }
    changed
}

fn erase_strokes(scene: &mut Scene, at: Point, reach: f64) -> bool {
    let touched = |stroke: &Stroke| {
        let radius = reach.max(stroke.width / 2.0);
        stroke.points.iter().any(|p| p.distance(at) <= radius)
    };
    let strokes = scene.layer(ShapeKind::Freehand);
    let any_touched = strokes.iter().any(|shape| matches!(shape, Shape::Freehand(s) if touched(s)));
    if !any_touched {
        return false;
    }

    let mut next = Vec::with_capacity(strokes.len() + 1);
    for shape in strokes {
        match shape {
            Shape::Freehand(stroke) if touched(stroke) => {
                let radius = reach.max(stroke.width / 2.0);
                next.extend(segment_stroke(&stroke.points, &[at], radius).into_iter().map(|points| {
                    Shape::Freehand(Stroke {
                        points,
                        color: stroke.color.clone(),
                        width: stroke.width,
                        brush: stroke.brush,
                    })
                }));
            }
            other => next.push(other.clone()),
        }
    }
    scene.replace_layer(ShapeKind::Freehand, next);
    true
}
