//! Snapshot undo/redo history.

use crate::model::TimelineState;

/// Past/future stacks of selection-free timeline snapshots.
#[derive(Debug, Clone)]
pub struct History {
    past: Vec<TimelineState>,
    future: Vec<TimelineState>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state as it was before a mutation.
    ///
    /// Starts a new branch: the redo stack is dropped.
    pub fn record(&mut self, before: TimelineState) {
        self.past.push(before.without_selection());
        self.future.clear();
        if self.past.len() > self.limit {
            self.past.remove(0);
        }
    }

    /// Pop the last snapshot, parking `current` for redo.
    pub fn undo(&mut self, current: TimelineState) -> Option<TimelineState> {
        let previous = self.past.pop()?;
        self.future.push(current.without_selection());
        Some(previous)
    }

    pub fn redo(&mut self, current: TimelineState) -> Option<TimelineState> {
        let next = self.future.pop()?;
        self.past.push(current.without_selection());
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        let excess = self.past.len().saturating_sub(self.limit);
        self.past.drain(..excess);
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}
