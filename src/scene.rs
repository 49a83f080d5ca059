//! Scene model: shape records, kinds, and the in-memory store.
//!
//! The scene keeps one ordered sequence per [`ShapeKind`]. Insertion order is
//! z-order within a kind: later shapes draw on top and are hit-tested first.
//! A shape is addressed by a [`ShapeRef`] (kind plus index into its
//! sequence). There are no persistent ids, so any held `ShapeRef` must be
//! treated as invalid after a deletion or an undo.
//!
//! The interaction engine is the only writer. The renderer and the hit-tester
//! read through [`Scene::layer`].

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use crate::style::BrushStyle;
use crate::viewport::Point;

/// The kind of a shape. Each kind has its own sequence in the [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Freehand pen stroke.
    Freehand,
    /// Axis-aligned rectangle outline.
    Rect,
    /// Circle outline.
    Circle,
    /// Straight line segment.
    Line,
    /// Line segment with an arrowhead at its second endpoint.
    Arrow,
    /// Three-vertex outline.
    Triangle,
}

impl ShapeKind {
    /// Every kind, in storage order.
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Freehand,
        ShapeKind::Rect,
        ShapeKind::Circle,
        ShapeKind::Line,
        ShapeKind::Arrow,
        ShapeKind::Triangle,
    ];

    /// Group order for "what is under the pointer". The first group with a hit wins.
    pub const HIT_ORDER: [ShapeKind; 6] = [
        ShapeKind::Freehand,
        ShapeKind::Triangle,
        ShapeKind::Arrow,
        ShapeKind::Line,
        ShapeKind::Circle,
        ShapeKind::Rect,
    ];

    /// Group order for drawing, bottom group first.
    pub const RENDER_ORDER: [ShapeKind; 6] = [
        ShapeKind::Rect,
        ShapeKind::Circle,
        ShapeKind::Line,
        ShapeKind::Arrow,
        ShapeKind::Triangle,
        ShapeKind::Freehand,
    ];

    fn slot(self) -> usize {
        match self {
            ShapeKind::Freehand => 0,
            ShapeKind::Rect => 1,
            ShapeKind::Circle => 2,
            ShapeKind::Line => 3,
            ShapeKind::Arrow => 4,
            ShapeKind::Triangle => 5,
        }
    }
}

/// Address of a shape: its kind and its index within that kind's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeRef {
    pub kind: ShapeKind,
    pub index: usize,
}

impl ShapeRef {
    #[must_use]
    pub fn new(kind: ShapeKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// Stroke appearance shared by the closed shapes and line kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// CSS color string.
    pub color: String,
    /// Stroke width in world units.
    pub width: f64,
    /// Draw with a dash pattern instead of a solid line.
    pub dashed: bool,
}

/// A freehand pen stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Polyline vertices in world coordinates, in drawing order.
    pub points: Vec<Point>,
    /// CSS color string.
    pub color: String,
    /// Stroke width in world units.
    pub width: f64,
    /// Cap/dash style.
    pub brush: BrushStyle,
}

/// Rectangle with a signed extent; negative width or height means flipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub outline: Outline,
}

/// Circle given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleShape {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub outline: Outline,
}

/// Segment from `(x1, y1)` to `(x2, y2)`. Used for both lines and arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShape {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub outline: Outline,
}

impl LineShape {
    /// First endpoint.
    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Second endpoint (the arrow tip for arrows).
    #[must_use]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

/// Triangle given by three independent vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleShape {
    pub vertices: [Point; 3],
    pub outline: Outline,
}

/// Any shape the scene can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Freehand(Stroke),
    Rect(RectShape),
    Circle(CircleShape),
    Line(LineShape),
    Arrow(LineShape),
    Triangle(TriangleShape),
}

impl Shape {
    /// The sequence this shape belongs to.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Freehand(_) => ShapeKind::Freehand,
            Shape::Rect(_) => ShapeKind::Rect,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Triangle(_) => ShapeKind::Triangle,
        }
    }

    /// Stroke width in world units.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        match self {
            Shape::Freehand(s) => s.width,
            Shape::Rect(r) => r.outline.width,
            Shape::Circle(c) => c.outline.width,
            Shape::Line(l) | Shape::Arrow(l) => l.outline.width,
            Shape::Triangle(t) => t.outline.width,
        }
    }
}

/// In-memory store: one ordered sequence per shape kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    layers: [Vec<Shape>; 6],
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shape on top of its kind's sequence and return its address.
    pub fn append(&mut self, shape: Shape) -> ShapeRef {
        let kind = shape.kind();
        let layer = &mut self.layers[kind.slot()];
        layer.push(shape);
        ShapeRef::new(kind, layer.len() - 1)
    }

    /// Replace the shape at `at`. Returns false if the index is out of range
    /// or `shape` is not of the addressed kind; the scene is left unchanged.
    pub fn replace_at(&mut self, at: ShapeRef, shape: Shape) -> bool {
        if shape.kind() != at.kind {
            return false;
        }
        let Some(slot) = self.layers[at.kind.slot()].get_mut(at.index) else {
            return false;
        };
        *slot = shape;
        true
    }

    /// Remove every shape of `kind` for which `remove` returns true.
    /// Returns the number of shapes removed.
    pub fn filter_out<F>(&mut self, kind: ShapeKind, mut remove: F) -> usize
    where
        F: FnMut(&Shape) -> bool,
    {
        let layer = &mut self.layers[kind.slot()];
        let before = layer.len();
        layer.retain(|shape| !remove(shape));
        before - layer.len()
    }

    /// Remove the shape at `at`, returning it if it was present.
    pub fn remove_at(&mut self, at: ShapeRef) -> Option<Shape> {
        let layer = &mut self.layers[at.kind.slot()];
        if at.index < layer.len() {
            Some(layer.remove(at.index))
        } else {
            None
        }
    }

    /// Swap in a whole new sequence for `kind`. Shapes of another kind are dropped.
    pub fn replace_layer(&mut self, kind: ShapeKind, mut shapes: Vec<Shape>) {
        shapes.retain(|shape| shape.kind() == kind);
        self.layers[kind.slot()] = shapes;
    }

    /// Replace the whole scene with a snapshot.
    pub fn restore(&mut self, snapshot: Scene) {
        *self = snapshot;
    }

    /// The shape at `at`, if the reference is still valid.
    #[must_use]
    pub fn get(&self, at: ShapeRef) -> Option<&Shape> {
        self.layers[at.kind.slot()].get(at.index)
    }

    /// Mutable access to a freehand stroke by index.
    pub fn stroke_mut(&mut self, index: usize) -> Option<&mut Stroke> {
        match self.layers[ShapeKind::Freehand.slot()].get_mut(index) {
            Some(Shape::Freehand(stroke)) => Some(stroke),
            _ => None,
        }
    }

    /// All shapes of `kind` in insertion order (bottom first).
    #[must_use]
    pub fn layer(&self, kind: ShapeKind) -> &[Shape] {
        &self.layers[kind.slot()]
    }

    /// Number of shapes of `kind`.
    #[must_use]
    pub fn count(&self, kind: ShapeKind) -> usize {
        self.layers[kind.slot()].len()
    }

    /// Total number of shapes across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Returns `true` if the scene holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }
}
