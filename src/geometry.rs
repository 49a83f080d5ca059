//! Geometry and hit-testing against scene shapes.
//!
//! Everything here is a pure function of its inputs. Distances are in world
//! units; callers convert screen-space tolerances with the viewport scale
//! before testing so that picking feels the same at every zoom level.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{HANDLE_HIT_PX, HANDLE_MIN_PX, HIT_THRESHOLD_PX, MIN_RECT_SIZE};
use crate::scene::{CircleShape, LineShape, RectShape, Scene, Shape, ShapeKind, ShapeRef, Stroke, TriangleShape};
use crate::viewport::Point;

/// Corner resize handle of a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Handle {
    /// Handles in hit-test and draw order.
    pub const ALL: [Handle; 4] = [Handle::TopLeft, Handle::TopRight, Handle::BottomRight, Handle::BottomLeft];
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        Some(points.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Position of a corner handle.
    #[must_use]
    pub fn corner(&self, handle: Handle) -> Point {
        match handle {
            Handle::TopLeft => Point::new(self.min_x, self.min_y),
            Handle::TopRight => Point::new(self.max_x, self.min_y),
            Handle::BottomRight => Point::new(self.max_x, self.max_y),
            Handle::BottomLeft => Point::new(self.min_x, self.max_y),
        }
    }

    /// All four corners in [`Handle::ALL`] order.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        Handle::ALL.map(|h| self.corner(h))
    }
}

// =============================================================
// Distances
// =============================================================

/// Distance from `p` to the segment `a`-`b`, clamped to the segment.
///
/// A degenerate segment (`a == b`) reduces to the distance between points.
#[must_use]
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Smallest distance from `p` to any segment of an open polyline.
///
/// A single-point polyline is treated as a dot; an empty one is infinitely far.
#[must_use]
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => points
            .windows(2)
            .filter_map(|w| match w {
                [a, b] => Some(distance_point_to_segment(p, *a, *b)),
                _ => None,
            })
            .fold(f64::INFINITY, f64::min),
    }
}

/// Smallest distance from `p` to the edges of a closed polygon.
fn distance_to_closed(p: Point, vertices: &[Point]) -> f64 {
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| distance_point_to_segment(p, *a, *b))
        .fold(f64::INFINITY, f64::min)
}

fn rect_corners(r: &RectShape) -> [Point; 4] {
    [
        Point::new(r.x, r.y),
        Point::new(r.x + r.width, r.y),
        Point::new(r.x + r.width, r.y + r.height),
        Point::new(r.x, r.y + r.height),
    ]
}

/// Distance from `p` to the drawn outline of `shape`. Fills are not considered.
#[must_use]
pub fn distance_to_shape(p: Point, shape: &Shape) -> f64 {
    match shape {
        Shape::Freehand(s) => distance_to_polyline(p, &s.points),
        Shape::Rect(r) => distance_to_closed(p, &rect_corners(r)),
        Shape::Circle(c) => (p.distance(Point::new(c.x, c.y)) - c.radius).abs(),
        Shape::Line(l) | Shape::Arrow(l) => distance_point_to_segment(p, l.start(), l.end()),
        Shape::Triangle(t) => distance_to_closed(p, &t.vertices),
    }
}

/// Hit tolerance for `shape` given a base tolerance in world units.
///
/// Freehand strokes, lines, and arrows grow the tolerance to half their
/// stroke width so thick strokes can be picked anywhere they are painted.
#[must_use]
pub fn hit_slop(shape: &Shape, base: f64) -> f64 {
    match shape {
        Shape::Freehand(_) | Shape::Line(_) | Shape::Arrow(_) => base.max(shape.stroke_width() / 2.0),
        Shape::Rect(_) | Shape::Circle(_) | Shape::Triangle(_) => base,
    }
}

/// Whether `p` lies within the hit tolerance of `shape`'s outline.
#[must_use]
pub fn hits_shape(p: Point, shape: &Shape, base: f64) -> bool {
    distance_to_shape(p, shape) <= hit_slop(shape, base)
}

/// The topmost shape under `p`, if any.
///
/// Kind groups are scanned in [`ShapeKind::HIT_ORDER`] and, within a group,
/// from the last-inserted shape to the first. The first group with a hit
/// wins, so a freehand stroke always beats a closed shape at the same point.
#[must_use]
pub fn shape_under_pointer(scene: &Scene, p: Point, scale: f64) -> Option<ShapeRef> {
    let base = HIT_THRESHOLD_PX / scale;
    ShapeKind::HIT_ORDER.iter().find_map(|&kind| {
        scene
            .layer(kind)
            .iter()
            .rposition(|shape| hits_shape(p, shape, base))
            .map(|index| ShapeRef::new(kind, index))
    })
}

// =============================================================
// Bounds and handles
// =============================================================

/// Axis-aligned bounding box of a shape's defining coordinates.
///
/// `None` only for a freehand stroke with no points.
#[must_use]
pub fn bounds(shape: &Shape) -> Option<Bounds> {
    match shape {
        Shape::Freehand(s) => Bounds::from_points(&s.points),
        Shape::Rect(r) => Bounds::from_points(&rect_corners(r)),
        Shape::Circle(c) => Some(Bounds {
            min_x: c.x - c.radius,
            min_y: c.y - c.radius,
            max_x: c.x + c.radius,
            max_y: c.y + c.radius,
        }),
        Shape::Line(l) | Shape::Arrow(l) => Bounds::from_points(&[l.start(), l.end()]),
        Shape::Triangle(t) => Bounds::from_points(&t.vertices),
    }
}

/// Half-size of a handle's hit box in world units; constant on screen.
#[must_use]
pub fn handle_size(scale: f64) -> f64 {
    (HANDLE_HIT_PX / scale).max(HANDLE_MIN_PX / scale)
}

/// The corner handle of `bounds` under `p`, checked in [`Handle::ALL`] order.
#[must_use]
pub fn handle_at(p: Point, bounds: &Bounds, scale: f64) -> Option<Handle> {
    let size = handle_size(scale);
    Handle::ALL.into_iter().find(|&h| {
        let c = bounds.corner(h);
        (p.x - c.x).abs() <= size && (p.y - c.y).abs() <= size
    })
}

// =============================================================
// Transforms
// =============================================================

/// `shape` moved by `(dx, dy)`; every defining coordinate shifts.
#[must_use]
pub fn translate(shape: &Shape, dx: f64, dy: f64) -> Shape {
    match shape {
        Shape::Freehand(s) => Shape::Freehand(Stroke {
            points: s.points.iter().map(|p| p.offset(dx, dy)).collect(),
            ..s.clone()
        }),
        Shape::Rect(r) => Shape::Rect(RectShape { x: r.x + dx, y: r.y + dy, ..r.clone() }),
        Shape::Circle(c) => Shape::Circle(CircleShape { x: c.x + dx, y: c.y + dy, ..c.clone() }),
        Shape::Line(l) => Shape::Line(translate_line(l, dx, dy)),
        Shape::Arrow(l) => Shape::Arrow(translate_line(l, dx, dy)),
        Shape::Triangle(t) => Shape::Triangle(TriangleShape {
            vertices: t.vertices.map(|v| v.offset(dx, dy)),
            outline: t.outline.clone(),
        }),
    }
}

fn translate_line(l: &LineShape, dx: f64, dy: f64) -> LineShape {
    LineShape { x1: l.x1 + dx, y1: l.y1 + dy, x2: l.x2 + dx, y2: l.y2 + dy, outline: l.outline.clone() }
}

/// Move the dragged corner of `b` to `current` without letting opposite
/// edges cross; the box never gets thinner than `MIN_RECT_SIZE`.
#[must_use]
pub fn resize_bounds(b: &Bounds, handle: Handle, current: Point) -> Bounds {
    let mut out = *b;
    match handle {
        Handle::TopLeft | Handle::BottomLeft => out.min_x = current.x.min(b.max_x - MIN_RECT_SIZE),
        Handle::TopRight | Handle::BottomRight => out.max_x = current.x.max(b.min_x + MIN_RECT_SIZE),
    }
    match handle {
        Handle::TopLeft | Handle::TopRight => out.min_y = current.y.min(b.max_y - MIN_RECT_SIZE),
        Handle::BottomLeft | Handle::BottomRight => out.max_y = current.y.max(b.min_y + MIN_RECT_SIZE),
    }
    out
}

/// Resize `baseline` by dragging `handle` from `start` to `current`.
///
/// * Rectangle: the dragged corner follows the pointer, clamped so the box
///   stays at least `MIN_RECT_SIZE` on each axis. The result is normalized.
/// * Circle: the radius becomes the distance from the center to the pointer.
/// * Line / arrow: the endpoint nearest the dragged handle follows the pointer.
/// * Triangle: the vertex nearest `start` follows the pointer.
/// * Freehand: points are rescaled from the corner opposite the handle.
#[must_use]
pub fn resize(baseline: &Shape, handle: Handle, start: Point, current: Point) -> Shape {
    let Some(b) = bounds(baseline) else {
        return baseline.clone();
    };
    match baseline {
        Shape::Rect(r) => {
            let nb = resize_bounds(&b, handle, current);
            Shape::Rect(RectShape {
                x: nb.min_x,
                y: nb.min_y,
                width: nb.width(),
                height: nb.height(),
                outline: r.outline.clone(),
            })
        }
        Shape::Circle(c) => Shape::Circle(CircleShape {
            radius: Point::new(c.x, c.y).distance(current),
            ..c.clone()
        }),
        Shape::Line(l) => Shape::Line(drag_nearest_endpoint(l, b.corner(handle), current)),
        Shape::Arrow(l) => Shape::Arrow(drag_nearest_endpoint(l, b.corner(handle), current)),
        Shape::Triangle(t) => {
            let mut vertices = t.vertices;
            if let Some(vertex) = nearest_mut(&mut vertices, start) {
                *vertex = current;
            }
            Shape::Triangle(TriangleShape { vertices, outline: t.outline.clone() })
        }
        Shape::Freehand(s) => {
            let nb = resize_bounds(&b, handle, current);
            Shape::Freehand(Stroke { points: remap(&s.points, &b, &nb), ..s.clone() })
        }
    }
}

fn drag_nearest_endpoint(l: &LineShape, handle_pos: Point, current: Point) -> LineShape {
    let mut out = l.clone();
    if handle_pos.distance(l.start()) <= handle_pos.distance(l.end()) {
        out.x1 = current.x;
        out.y1 = current.y;
    } else {
        out.x2 = current.x;
        out.y2 = current.y;
    }
    out
}

fn nearest_mut(points: &mut [Point], target: Point) -> Option<&mut Point> {
    points.iter_mut().min_by(|a, b| a.distance(target).total_cmp(&b.distance(target)))
}

/// Map points linearly from box `from` into box `to`. A zero-extent axis is
/// translated instead of scaled.
fn remap(points: &[Point], from: &Bounds, to: &Bounds) -> Vec<Point> {
    let axis = |v: f64, lo: f64, span: f64, new_lo: f64, new_span: f64| {
        if span == 0.0 { new_lo + (v - lo) } else { new_lo + (v - lo) / span * new_span }
    };
    points
        .iter()
        .map(|p| {
            Point::new(
                axis(p.x, from.min_x, from.width(), to.min_x, to.width()),
                axis(p.y, from.min_y, from.height(), to.min_y, to.height()),
            )
        })
        .collect()
}
