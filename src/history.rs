//! Bounded undo stack of full scene snapshots.
//!
//! A snapshot is pushed right before a scene-mutating gesture begins, so one
//! undo reverts one whole gesture no matter how many pointer-moves it took.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::HISTORY_LIMIT;
use crate::scene::Scene;

/// Undo stack. The oldest snapshot is evicted once more than `limit` are held.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Scene>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// An empty stack holding at most `HISTORY_LIMIT` snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    /// An empty stack holding at most `limit` snapshots.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { snapshots: VecDeque::new(), limit }
    }

    /// Push a deep copy of `scene`.
    pub fn push_snapshot(&mut self, scene: &Scene) {
        self.snapshots.push_back(scene.clone());
        while self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        }
    }

    /// Pop the most recent snapshot, or `None` when the stack is empty.
    pub fn pop(&mut self) -> Option<Scene> {
        self.snapshots.pop_back()
    }

    /// Drop the most recent snapshot without restoring it. Used when a gesture
    /// that pushed a snapshot ends without changing the scene.
    pub fn discard_last(&mut self) {
        self.snapshots.pop_back();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
