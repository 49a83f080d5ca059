use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::eraser::{erase_at, eraser_reach, interpolate, step_size};
use crate::geometry::{bounds, handle_at, resize, shape_under_pointer, translate};
use crate::history::History;
use crate::input::{Draft, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::laser::LaserTrail;
use crate::render;
use crate::scene::{Outline, Scene, Shape, ShapeRef, Stroke};
use crate::style::{Settings, SettingsPatch, StyleError};
use crate::viewport::{Point, Viewport, ZoomDirection};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// State visible in the next frame changed; schedule a render.
    RenderNeeded,
    /// Show this CSS cursor over the canvas.
    SetCursor(&'static str),
}

/// Core engine state — all logic that doesn't depend on the canvas element.
///
/// This is the interaction state machine: the only writer of the scene,
/// viewport, history, selection, draft, and laser trail. Separated from
/// `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub scene: Scene,
    pub viewport: Viewport,
    pub ui: UiState,
    pub input: InputState,
    pub history: History,
    pub laser: LaserTrail,
    /// Pointer that owns the active gesture.
    pub active_pointer: Option<i32>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            scene: Scene::new(),
            viewport: Viewport::default(),
            ui: UiState::default(),
            input: InputState::default(),
            history: History::new(),
            laser: LaserTrail::new(),
            active_pointer: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Configuration ---

    /// Set the active tool. Any gesture in progress ends as if the pointer
    /// left the canvas, and the selection is dropped unless the new tool is
    /// `Select`.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        if self.ui.settings.tool == tool {
            return Vec::new();
        }
        self.abort_gesture();
        self.ui.settings.tool = tool;
        if tool != Tool::Select {
            self.ui.selection = None;
        }
        tracing::debug!(?tool, "tool changed");
        vec![Action::SetCursor(tool.cursor()), Action::RenderNeeded]
    }

    /// Merge a settings patch from the toolbar.
    pub fn apply_settings(&mut self, patch: &SettingsPatch) -> Vec<Action> {
        let mut actions = match patch.tool {
            Some(tool) => self.set_tool(tool),
            None => Vec::new(),
        };
        self.ui.settings.apply(patch);
        tracing::debug!(?patch, "settings updated");
        if !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Parse and merge a JSON settings patch from the toolbar.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError`] if the payload is malformed; settings are unchanged.
    pub fn apply_settings_json(&mut self, raw: &str) -> Result<Vec<Action>, StyleError> {
        match SettingsPatch::from_json(raw) {
            Ok(patch) => Ok(self.apply_settings(&patch)),
            Err(e) => {
                tracing::warn!(error = %e, "rejected settings payload");
                Err(e)
            }
        }
    }

    /// Record the CSS-pixel viewport size and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css.max(0.0);
        self.viewport_height = height_css.max(0.0);
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    }

    // --- Input events ---

    /// Pointer pressed at `screen_pt` (CSS pixels).
    pub fn on_pointer_down(&mut self, screen_pt: Point, pointer_id: i32, now_ms: f64) -> Vec<Action> {
        if self.input.is_active() {
            return Vec::new();
        }
        let world = self.viewport.screen_to_world(screen_pt);
        self.ui.pointer_world = Some(world);
        self.active_pointer = Some(pointer_id);

        let settings = &self.ui.settings;
        let tool = settings.tool;
        let mut actions = vec![Action::RenderNeeded];
        match tool {
            Tool::Pen => {
                let stroke = Stroke {
                    points: vec![world],
                    color: settings.color.clone(),
                    width: settings.width,
                    brush: settings.brush,
                };
                self.history.push_snapshot(&self.scene);
                let at = self.scene.append(Shape::Freehand(stroke));
                self.input = InputState::Drawing { index: at.index };
            }
            Tool::Eraser => {
                self.history.push_snapshot(&self.scene);
                self.erase_sample(world);
                self.input = InputState::Erasing { last_world: world };
            }
            Tool::Pan => {
                self.input = InputState::Panning { last_screen: screen_pt };
                actions.push(Action::SetCursor("grabbing"));
            }
            Tool::Rect | Tool::Circle | Tool::Line | Tool::Arrow | Tool::Triangle => {
                if let Some(draft) = Draft::start(tool, world) {
                    self.history.push_snapshot(&self.scene);
                    self.input = InputState::Drafting { anchor: world, draft };
                }
            }
            Tool::Select => self.begin_select(world),
            Tool::Laser => {
                self.laser.start(world, now_ms);
                self.input = InputState::Lasering;
            }
        }

        if !self.input.is_active() {
            self.active_pointer = None;
        }
        tracing::debug!(?tool, x = world.x, y = world.y, "pointer down");
        actions
    }

    /// Pointer moved to `screen_pt`. Moves from pointers other than the one
    /// that started the active gesture are ignored.
    pub fn on_pointer_move(&mut self, screen_pt: Point, pointer_id: i32, now_ms: f64) -> Vec<Action> {
        if self.input.is_active() && self.active_pointer != Some(pointer_id) {
            return Vec::new();
        }
        let world = self.viewport.screen_to_world(screen_pt);
        self.ui.pointer_world = Some(world);

        let state = std::mem::take(&mut self.input);
        if !state.is_active() {
            return if self.ui.settings.tool == Tool::Eraser { vec![Action::RenderNeeded] } else { Vec::new() };
        }
        self.input = self.advance(state, world, screen_pt, now_ms);
        vec![Action::RenderNeeded]
    }

    /// Pointer released. Commits an in-progress draft.
    pub fn on_pointer_up(&mut self, screen_pt: Point, pointer_id: i32) -> Vec<Action> {
        if !self.input.is_active() || self.active_pointer != Some(pointer_id) {
            return Vec::new();
        }
        self.ui.pointer_world = Some(self.viewport.screen_to_world(screen_pt));
        self.finish_gesture(true)
    }

    /// Pointer left the drawing surface. Ends the gesture like pointer-up,
    /// except an in-progress draft is discarded instead of committed.
    pub fn on_pointer_leave(&mut self, pointer_id: i32) -> Vec<Action> {
        self.ui.pointer_world = None;
        if !self.input.is_active() || self.active_pointer != Some(pointer_id) {
            return vec![Action::RenderNeeded];
        }
        self.finish_gesture(false)
    }

    /// Wheel / pinch: zoom one step around the pointer.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        let direction = if delta.dy < 0.0 {
            ZoomDirection::In
        } else if delta.dy > 0.0 {
            ZoomDirection::Out
        } else {
            return Vec::new();
        };
        self.viewport.zoom_at(screen_pt, direction);
        vec![Action::RenderNeeded]
    }

    /// Keyboard shortcuts: Ctrl/Cmd+Z undo, Escape cancel, Delete/Backspace
    /// remove the selected shape.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "z" | "Z" if modifiers.command() && !modifiers.shift => {
                if self.undo() {
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            "Escape" => {
                if matches!(self.input, InputState::Drafting { .. }) {
                    self.abort_gesture();
                }
                self.ui.selection = None;
                vec![Action::RenderNeeded]
            }
            "Delete" | "Backspace" => self.delete_selection(),
            _ => Vec::new(),
        }
    }

    // --- History ---

    /// Restore the most recent snapshot. Clears the selection and any
    /// scene-bound gesture. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.scene.restore(snapshot);
        self.ui.selection = None;
        if matches!(
            self.input,
            InputState::Drawing { .. }
                | InputState::Erasing { .. }
                | InputState::Drafting { .. }
                | InputState::Moving { .. }
                | InputState::Resizing { .. }
        ) {
            self.input = InputState::Idle;
            self.active_pointer = None;
        }
        tracing::debug!(remaining = self.history.len(), "undo");
        true
    }

    // --- Frame ---

    /// Per-frame housekeeping. Expires old laser samples and reports whether
    /// the trail is still animating.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.laser.prune(now_ms);
        !self.laser.is_empty()
    }

    // --- Queries ---

    /// The currently selected shape, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ShapeRef> {
        self.ui.selection
    }

    /// The current viewport state.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The current toolbar selections.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.ui.settings
    }

    /// The draft being sized, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        match &self.input {
            InputState::Drafting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Outline style for shapes committed with the current settings.
    #[must_use]
    pub fn current_outline(&self) -> Outline {
        let s = &self.ui.settings;
        Outline { color: s.color.clone(), width: s.width, dashed: s.brush.is_dashed() }
    }

    /// Eraser reach in world units at the current zoom.
    #[must_use]
    pub fn eraser_reach(&self) -> f64 {
        eraser_reach(self.ui.settings.width, self.viewport.scale)
    }

    // --- Gesture internals ---

    fn begin_select(&mut self, world: Point) {
        let scale = self.viewport.scale;
        if let Some(sel) = self.ui.selection {
            let grabbed = self
                .scene
                .get(sel)
                .and_then(|shape| bounds(shape).and_then(|b| handle_at(world, &b, scale)).map(|h| (h, shape.clone())));
            if let Some((handle, baseline)) = grabbed {
                self.history.push_snapshot(&self.scene);
                self.input = InputState::Resizing { target: sel, handle, start_world: world, baseline };
                return;
            }
        }

        let hit = shape_under_pointer(&self.scene, world, scale)
            .and_then(|target| self.scene.get(target).map(|shape| (target, shape.clone())));
        match hit {
            Some((target, baseline)) => {
                self.history.push_snapshot(&self.scene);
                self.ui.selection = Some(target);
                self.input = InputState::Moving { target, start_world: world, baseline };
            }
            None => self.ui.selection = None,
        }
    }

    fn advance(&mut self, state: InputState, world: Point, screen_pt: Point, now_ms: f64) -> InputState {
        match state {
            InputState::Idle => InputState::Idle,
            InputState::Drawing { index } => match self.scene.stroke_mut(index) {
                Some(stroke) => {
                    stroke.points.push(world);
                    InputState::Drawing { index }
                }
                None => {
                    tracing::warn!(index, "stroke vanished mid-gesture; abandoning");
                    InputState::Idle
                }
            },
            InputState::Erasing { last_world } => {
                for sample in interpolate(last_world, world, step_size(self.ui.settings.width)) {
                    self.erase_sample(sample);
                }
                InputState::Erasing { last_world: world }
            }
            InputState::Drafting { anchor, mut draft } => {
                draft.update(anchor, world);
                InputState::Drafting { anchor, draft }
            }
            InputState::Moving { target, start_world, baseline } => {
                let moved = translate(&baseline, world.x - start_world.x, world.y - start_world.y);
                if self.write_selected(target, moved) {
                    InputState::Moving { target, start_world, baseline }
                } else {
                    InputState::Idle
                }
            }
            InputState::Resizing { target, handle, start_world, baseline } => {
                let resized = resize(&baseline, handle, start_world, world);
                if self.write_selected(target, resized) {
                    InputState::Resizing { target, handle, start_world, baseline }
                } else {
                    InputState::Idle
                }
            }
            InputState::Panning { last_screen } => {
                self.viewport.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                InputState::Panning { last_screen: screen_pt }
            }
            InputState::Lasering => {
                self.laser.sample(world, now_ms, self.viewport.scale);
                InputState::Lasering
            }
        }
    }

    /// Write `shape` over the selected shape. If the selection no longer
    /// points at `target`, or `target` is out of range, the selection is
    /// cleared and nothing is written.
    fn write_selected(&mut self, target: ShapeRef, shape: Shape) -> bool {
        if self.ui.selection == Some(target) && self.scene.replace_at(target, shape) {
            return true;
        }
        tracing::warn!(?target, "selection went stale mid-gesture; abandoning");
        self.ui.selection = None;
        self.active_pointer = None;
        false
    }

    fn erase_sample(&mut self, at: Point) {
        let reach = self.eraser_reach();
        if erase_at(&mut self.scene, at, reach) {
            self.ui.selection = None;
        }
    }

    /// End the active gesture. A draft is committed when `commit` is true and
    /// discarded (along with its snapshot) otherwise.
    fn finish_gesture(&mut self, commit: bool) -> Vec<Action> {
        let mut actions = vec![Action::RenderNeeded];
        match std::mem::take(&mut self.input) {
            InputState::Drafting { draft, .. } => {
                if commit {
                    let shape = draft.to_shape(self.current_outline());
                    let at = self.scene.append(shape);
                    tracing::debug!(?at, "shape committed");
                } else {
                    self.history.discard_last();
                    tracing::debug!("draft discarded");
                }
            }
            InputState::Panning { .. } => actions.push(Action::SetCursor(Tool::Pan.cursor())),
            _ => {}
        }
        self.active_pointer = None;
        actions
    }

    fn abort_gesture(&mut self) {
        if self.input.is_active() {
            self.finish_gesture(false);
        }
    }

    fn delete_selection(&mut self) -> Vec<Action> {
        if self.input.is_active() {
            return Vec::new();
        }
        let Some(sel) = self.ui.selection.take() else {
            return Vec::new();
        };
        if self.scene.get(sel).is_none() {
            return vec![Action::RenderNeeded];
        }
        self.history.push_snapshot(&self.scene);
        self.scene.remove_at(sel);
        tracing::debug!(?sel, "shape deleted");
        vec![Action::RenderNeeded]
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    // --- Delegated configuration ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_tool(tool)
    }

    /// # Errors
    ///
    /// Returns [`StyleError`] if the payload is malformed.
    pub fn apply_settings_json(&mut self, raw: &str) -> Result<Vec<Action>, StyleError> {
        self.core.apply_settings_json(raw)
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the
    /// backing store to match. Scene and view state are untouched.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width((self.core.viewport_width * self.core.dpr).round() as u32);
        self.canvas.set_height((self.core.viewport_height * self.core.dpr).round() as u32);
    }

    // --- Delegated input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, pointer_id: i32, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, pointer_id, now_ms)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, pointer_id: i32, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, pointer_id, now_ms)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, pointer_id: i32) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, pointer_id)
    }

    pub fn on_pointer_leave(&mut self, pointer_id: i32) -> Vec<Action> {
        self.core.on_pointer_leave(pointer_id)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas. Returns whether another frame
    /// is needed to keep the laser trail fading.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        let animating = self.core.tick(now_ms);
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let frame = render::build_frame(&self.core, now_ms);
        render::paint(&ctx, &frame)?;
        Ok(animating)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Option<ShapeRef> {
        self.core.selection()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.core.viewport()
    }
}
