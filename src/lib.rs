//! Scene engine for an infinite, pannable and zoomable drawing surface.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! full lifecycle of the drawing: translating raw pointer, wheel, and keyboard
//! events into scene mutations, maintaining the viewport for pan/zoom,
//! hit-testing shapes, splitting strokes under the eraser, keeping undo
//! snapshots, and rendering each frame. The host JavaScript layer is
//! responsible only for wiring DOM events and toolbar choices to the engine
//! and calling [`engine::Engine::render`] on each animation frame.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] (the interaction state machine) |
//! | [`scene`] | Shape records and the per-kind scene store |
//! | [`viewport`] | Pan/zoom transform and coordinate conversions |
//! | [`geometry`] | Distances, hit-testing, bounds, resize handles |
//! | [`eraser`] | Stroke segmentation and incremental erasing |
//! | [`history`] | Bounded undo snapshots |
//! | [`laser`] | Fading laser-pointer trail |
//! | [`input`] | Tools, input event types, drafts, and gesture states |
//! | [`style`] | Toolbar configuration: stroke style, pattern, page color |
//! | [`render`] | Frame planning and replay onto a 2D canvas |
//! | [`consts`] | Shared numeric constants (zoom limits, thresholds, etc.) |

pub mod consts;
pub mod engine;
pub mod eraser;
pub mod geometry;
pub mod history;
pub mod input;
pub mod laser;
pub mod render;
pub mod scene;
pub mod style;
pub mod viewport;
