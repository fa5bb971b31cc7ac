use std::collections::VecDeque;

use crate::canvas::Snapshot;

/// Default number of snapshots kept for undo.
pub const MAX_HISTORY: usize = 50;

// ============================================================================
// HISTORY MANAGER - Linear snapshot timeline with a cursor
// ============================================================================

/// Undo/redo over full-surface snapshots.
///
/// `entries[pos]` is always what the surface should show after an undo or
/// redo. Committing while the cursor is mid-timeline discards the redo branch,
/// so the timeline never forks.
pub struct HistoryManager {
    entries: VecDeque<Snapshot>,
    pos: usize,
    /// Set when an edit happened after the last undo; blocks redo.
    at_latest_change: bool,
    max_entries: usize,
    /// Running byte total of all held snapshots.
    total_memory: usize,
}

impl HistoryManager {
    /// Seed the timeline with the surface's initial state.
    pub fn new(initial: Snapshot, max_entries: usize) -> Self {
        let mut history = Self {
            entries: VecDeque::new(),
            pos: 0,
            at_latest_change: true,
            max_entries: max_entries.max(1),
            total_memory: 0,
        };
        history.reset(initial);
        history
    }

    /// Append a new state, dropping any redo branch and the oldest entry when
    /// the timeline is full.
    pub fn commit(&mut self, snapshot: Snapshot) {
        if self.pos + 1 < self.entries.len() {
            for dropped in self.entries.drain(self.pos + 1..) {
                self.total_memory = self.total_memory.saturating_sub(dropped.memory_bytes());
            }
        }

        self.total_memory += snapshot.memory_bytes();
        self.entries.push_back(snapshot);
        self.prune();

        self.pos = self.entries.len() - 1;
        self.at_latest_change = true;
    }

    /// Step back one entry. Returns the snapshot to display, or `None` at the
    /// start of the timeline.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        self.at_latest_change = false;
        self.entries.get(self.pos)
    }

    /// Step forward one entry. Returns `None` at the tip or after an edit
    /// followed the last undo.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.pos += 1;
        self.entries.get(self.pos)
    }

    /// Mark the start of an edit gesture. From here on redo is unavailable,
    /// even before the gesture commits.
    pub fn begin_edit(&mut self) {
        self.at_latest_change = true;
    }

    /// Replace the whole timeline with a single entry.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.total_memory = snapshot.memory_bytes();
        self.entries.push_back(snapshot);
        self.pos = 0;
        self.at_latest_change = true;
    }

    pub fn can_undo(&self) -> bool {
        self.pos > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.at_latest_change && self.pos + 1 < self.entries.len()
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> &Snapshot {
        &self.entries[self.pos]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn at_latest_change(&self) -> bool {
        self.at_latest_change
    }

    /// Number of steps available for undo / redo, for UI labels.
    pub fn undo_count(&self) -> usize {
        self.pos
    }

    pub fn redo_count(&self) -> usize {
        if self.at_latest_change {
            0
        } else {
            self.entries.len() - 1 - self.pos
        }
    }

    /// Bytes held by all snapshots (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    fn prune(&mut self) {
        while self.entries.len() > self.max_entries {
            if let Some(removed) = self.entries.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_bytes());
            }
        }
    }
}
