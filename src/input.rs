//! Input model: tools, modifier keys, drafts, and the gesture state machine.
//!
//! This module defines the types consumed by the interaction engine. `Tool`
//! and `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying all context needed to apply incremental updates.
//! `Draft` is the uncommitted shape a closed-shape tool is sizing.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::Deserialize;

use crate::geometry::Handle;
use crate::scene::{CircleShape, LineShape, Outline, RectShape, Shape, ShapeRef, TriangleShape};
use crate::style::Settings;
use crate::viewport::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand pen (default).
    #[default]
    Pen,
    /// Stroke-splitting eraser.
    Eraser,
    /// Drag to pan the view.
    Pan,
    /// Draw a rectangle.
    Rect,
    /// Draw a circle from its center.
    Circle,
    /// Draw a straight line.
    Line,
    /// Draw an arrow.
    Arrow,
    /// Draw an isosceles triangle.
    Triangle,
    /// Select, move, and resize shapes.
    Select,
    /// Ephemeral pointer trail.
    Laser,
}

impl Tool {
    /// CSS cursor the host should show while this tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Pan => "grab",
            Self::Select => "default",
            Self::Laser => "none",
            Self::Pen | Self::Eraser | Self::Rect | Self::Circle | Self::Line | Self::Arrow | Self::Triangle => {
                "crosshair"
            }
        }
    }
}

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"z"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Toolbar selections: tool, stroke style, page appearance.
    pub settings: Settings,
    /// The selected shape, if any. Only meaningful under the select tool.
    pub selection: Option<ShapeRef>,
    /// Last known pointer position in world space; `None` once the pointer leaves.
    pub pointer_world: Option<Point>,
}

/// A shape under construction by one of the closed-shape tools.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Circle { x: f64, y: f64, radius: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Arrow { x1: f64, y1: f64, x2: f64, y2: f64 },
    Triangle { vertices: [Point; 3] },
}

impl Draft {
    /// Start a zero-extent draft at `anchor`, or `None` if `tool` does not draft shapes.
    #[must_use]
    pub fn start(tool: Tool, anchor: Point) -> Option<Self> {
        let Point { x, y } = anchor;
        let draft = match tool {
            Tool::Rect => Self::Rect { x, y, width: 0.0, height: 0.0 },
            Tool::Circle => Self::Circle { x, y, radius: 0.0 },
            Tool::Line => Self::Line { x1: x, y1: y, x2: x, y2: y },
            Tool::Arrow => Self::Arrow { x1: x, y1: y, x2: x, y2: y },
            Tool::Triangle => Self::Triangle { vertices: [anchor; 3] },
            _ => return None,
        };
        Some(draft)
    }

    /// Stretch the draft from `anchor` to `current`.
    ///
    /// Triangles are isosceles while drafting: the second vertex follows the
    /// pointer and the third mirrors it horizontally about the anchor.
    pub fn update(&mut self, anchor: Point, current: Point) {
        match self {
            Self::Rect { width, height, .. } => {
                *width = current.x - anchor.x;
                *height = current.y - anchor.y;
            }
            Self::Circle { radius, .. } => *radius = anchor.distance(current),
            Self::Line { x2, y2, .. } | Self::Arrow { x2, y2, .. } => {
                *x2 = current.x;
                *y2 = current.y;
            }
            Self::Triangle { vertices } => {
                vertices[1] = current;
                vertices[2] = Point::new(2.0 * anchor.x - current.x, current.y);
            }
        }
    }

    /// Build the scene shape this draft becomes, styled with `outline`.
    #[must_use]
    pub fn to_shape(&self, outline: Outline) -> Shape {
        match *self {
            Self::Rect { x, y, width, height } => Shape::Rect(RectShape { x, y, width, height, outline }),
            Self::Circle { x, y, radius } => Shape::Circle(CircleShape { x, y, radius, outline }),
            Self::Line { x1, y1, x2, y2 } => Shape::Line(LineShape { x1, y1, x2, y2, outline }),
            Self::Arrow { x1, y1, x2, y2 } => Shape::Arrow(LineShape { x1, y1, x2, y2, outline }),
            Self::Triangle { vertices } => Shape::Triangle(TriangleShape { vertices, outline }),
        }
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to apply updates on
/// pointer-move and to finish on pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The pen is appending points to the stroke at `index`.
    Drawing {
        /// Index of the in-progress stroke in the freehand sequence.
        index: usize,
    },
    /// The eraser is being dragged.
    Erasing {
        /// World-space position of the previous eraser sample.
        last_world: Point,
    },
    /// A closed-shape tool is sizing a draft.
    Drafting {
        /// World-space point where the drag started.
        anchor: Point,
        /// The shape being sized.
        draft: Draft,
    },
    /// The selected shape is being dragged.
    Moving {
        /// Shape being moved.
        target: ShapeRef,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// The shape as it was at pointer-down.
        baseline: Shape,
    },
    /// The selected shape is being resized by one of its corner handles.
    Resizing {
        /// Shape being resized.
        target: ShapeRef,
        /// Which corner handle is being dragged.
        handle: Handle,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// The shape as it was at pointer-down.
        baseline: Shape,
    },
    /// The view is being dragged.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// The laser is sampling the pointer.
    Lasering,
}

impl InputState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
