//! Linear undo/redo over whole-document snapshots.

use std::collections::VecDeque;

use log::debug;

/// Bounded sequence of document snapshots with a cursor.
///
/// Empty means no cursor. Otherwise the cursor always indexes a stored
/// snapshot and neighbouring snapshots are never textually identical.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<String>,
    cursor: Option<usize>,
    max: usize,
}

impl History {
    pub fn new(max: usize) -> Self {
        History {
            snapshots: VecDeque::with_capacity(max.min(64)),
            cursor: None,
            max: max.max(1),
        }
    }

    /// Stores `snapshot` after the cursor, pruning any redo branch.
    ///
    /// Returns false, leaving history untouched, when the snapshot equals the
    /// one at the cursor.
    pub fn record(&mut self, snapshot: String) -> bool {
        if self.current() == Some(snapshot.as_str()) {
            return false;
        }
        if let Some(cursor) = self.cursor {
            self.snapshots.truncate(cursor + 1);
        }
        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.max {
            self.snapshots.pop_front();
        }
        self.cursor = Some(self.snapshots.len() - 1);
        debug!(
            "recorded snapshot {}/{}",
            self.snapshots.len(),
            self.max
        );
        true
    }

    /// Steps back and returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&str> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.current()
    }

    /// Steps forward and returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&str> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.snapshots.get(c))
            .map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.snapshots.len())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cursor position, `None` while empty.
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_snapshot_is_not_recorded() {
        let mut history = History::new(50);
        assert!(history.record("a".into()));
        assert!(!history.record("a".into()));
        assert_eq!(history.len(), 1);
        assert_eq!(history.position(), Some(0));
    }

    #[test]
    fn undo_redo_walk_the_sequence() {
        let mut history = History::new(50);
        for s in ["a", "b", "c"] {
            history.record(s.into());
        }
        assert_eq!(history.undo(), Some("b"));
        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.position(), Some(0));
        assert_eq!(history.redo(), Some("b"));
        assert_eq!(history.redo(), Some("c"));
        assert_eq!(history.redo(), None);
        assert!(!history.can_redo());
    }

    #[test]
    fn recording_after_undo_prunes_redo_branch() {
        let mut history = History::new(50);
        for s in ["a", "b", "c"] {
            history.record(s.into());
        }
        history.undo();
        history.undo();
        assert!(history.record("x".into()));
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some("x"));
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some("a"));
    }

    #[test]
    fn cap_evicts_oldest_and_keeps_cursor_on_newest() {
        let mut history = History::new(50);
        for i in 0..50 {
            history.record(format!("s{}", i));
        }
        assert_eq!(history.len(), 50);
        history.record("s50".into());
        assert_eq!(history.len(), 50);
        assert_eq!(history.position(), Some(49));
        assert_eq!(history.current(), Some("s50"));
        for _ in 0..49 {
            history.undo();
        }
        assert_eq!(history.current(), Some("s1"));
    }

    #[test]
    fn empty_history_has_no_cursor() {
        let mut history = History::new(5);
        assert!(history.is_empty());
        assert_eq!(history.position(), None);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert!(!history.can_undo());
    }
}
