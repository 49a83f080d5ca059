//! Shared numeric constants for the drawing engine.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.5;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 3.0;

/// Multiplicative scale step applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.05;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space tolerance in pixels for picking a shape.
pub const HIT_THRESHOLD_PX: f64 = 6.0;

/// Screen-space half-size in pixels of a resize handle's hit box.
pub const HANDLE_HIT_PX: f64 = 6.0;

/// Floor for the handle hit box, in screen pixels.
pub const HANDLE_MIN_PX: f64 = 4.0;

/// Smallest width/height a rectangle may be resized to, in world units.
pub const MIN_RECT_SIZE: f64 = 1.0;

// ── Eraser ──────────────────────────────────────────────────────

/// Minimum eraser reach in screen pixels, regardless of stroke width.
pub const ERASER_MIN_PX: f64 = 6.0;

/// Minimum interpolation step between eraser samples, in world units.
pub const ERASER_MIN_STEP: f64 = 0.8;

/// Interpolation step as a fraction of the eraser width.
pub const ERASER_STEP_FACTOR: f64 = 0.4;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo snapshots retained.
pub const HISTORY_LIMIT: usize = 100;

// ── Laser ───────────────────────────────────────────────────────

/// Lifetime of a laser sample in milliseconds.
pub const LASER_TTL_MS: f64 = 900.0;

/// Minimum screen-space movement (pixels) before a new laser sample is taken.
pub const LASER_MIN_STEP_PX: f64 = 0.5;

/// Trail length that triggers trimming.
pub const LASER_MAX_POINTS: usize = 1200;

/// Number of oldest samples dropped when the trail is trimmed.
pub const LASER_TRIM: usize = 200;

// ── Style ───────────────────────────────────────────────────────

/// Thinnest selectable stroke width.
pub const MIN_STROKE_WIDTH: f64 = 1.0;

/// Thickest selectable stroke width.
pub const MAX_STROKE_WIDTH: f64 = 24.0;

/// Spacing of the background pattern in world units.
pub const PATTERN_STEP: f64 = 24.0;
