//! Laser pointer trail: timestamped samples that fade out and are never
//! written to the scene or the undo history.

#[cfg(test)]
#[path = "laser_test.rs"]
mod laser_test;

use std::collections::VecDeque;

use crate::consts::{LASER_MAX_POINTS, LASER_MIN_STEP_PX, LASER_TRIM, LASER_TTL_MS};
use crate::viewport::Point;

/// One trail sample in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserPoint {
    pub x: f64,
    pub y: f64,
    /// Host clock in milliseconds when the sample was taken.
    pub t: f64,
}

impl LaserPoint {
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Remaining life in `[0, 1]` at `now_ms`; 1 when fresh, 0 when expired.
    #[must_use]
    pub fn life(&self, now_ms: f64) -> f64 {
        (1.0 - (now_ms - self.t) / LASER_TTL_MS).clamp(0.0, 1.0)
    }
}

/// Ephemeral, decaying laser trail.
#[derive(Debug, Clone, Default)]
pub struct LaserTrail {
    points: VecDeque<LaserPoint>,
}

impl LaserTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally record a sample (pointer-down).
    pub fn start(&mut self, at: Point, now_ms: f64) {
        self.push(at, now_ms);
    }

    /// Record a sample if the pointer moved more than `LASER_MIN_STEP_PX`
    /// screen pixels since the last one. Returns whether a sample was added.
    pub fn sample(&mut self, at: Point, now_ms: f64, scale: f64) -> bool {
        let min_step = LASER_MIN_STEP_PX / scale;
        if let Some(last) = self.points.back() {
            if last.point().distance(at) <= min_step {
                return false;
            }
        }
        self.push(at, now_ms);
        true
    }

    fn push(&mut self, at: Point, now_ms: f64) {
        self.points.push_back(LaserPoint { x: at.x, y: at.y, t: now_ms });
        if self.points.len() > LASER_MAX_POINTS {
            self.points.drain(..LASER_TRIM);
        }
    }

    /// Drop samples older than the time-to-live.
    pub fn prune(&mut self, now_ms: f64) {
        while self.points.front().is_some_and(|p| now_ms - p.t > LASER_TTL_MS) {
            self.points.pop_front();
        }
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LaserPoint> + ExactSizeIterator {
        self.points.iter()
    }

    /// The newest sample.
    #[must_use]
    pub fn head(&self) -> Option<&LaserPoint> {
        self.points.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
