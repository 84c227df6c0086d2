use crate::{Document, Selection};
use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub doc: Document,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
pub enum HistoryEntry {
    Snapshot(Snapshot),
    /// A run of consecutive text insertions collapsed into one step.
    Typing {
        before: Snapshot,
        caret_after: Selection,
    },
}

impl HistoryEntry {
    fn into_snapshot(self) -> Snapshot {
        match self {
            HistoryEntry::Snapshot(snapshot) => snapshot,
            HistoryEntry::Typing { before, .. } => before,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_depth: usize,
    merge_window: Duration,
    last_merge_at: Option<DateTime<Utc>>,
}

impl CommandHistory {
    pub fn new(max_depth: usize, merge_window: Duration) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
            merge_window,
            last_merge_at: None,
        }
    }

    pub fn push_entry(&mut self, entry: HistoryEntry) {
        self.push_undo(entry);
        self.redo_stack.clear();
        self.last_merge_at = None;
    }

    /// Records a text insertion, folding it into the previous typing step when
    /// the caret continues where that step left it.
    pub fn push_typing(&mut self, before: Snapshot, caret_after: Selection) {
        let now = Utc::now();
        if let Some(HistoryEntry::Typing { caret_after: last_after, .. }) = self.undo_stack.back_mut() {
            if *last_after == before.selection
                && self.last_merge_at.is_some_and(|t| {
                    now.signed_duration_since(t).to_std().is_ok_and(|elapsed| elapsed <= self.merge_window)
                })
            {
                *last_after = caret_after;
                self.redo_stack.clear();
                self.last_merge_at = Some(now);
                return;
            }
        }
        self.push_entry(HistoryEntry::Typing { before, caret_after });
        self.last_merge_at = Some(now);
    }

    /// Swaps `current` for the most recent undo state.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(HistoryEntry::Snapshot(current));
        self.last_merge_at = None;
        Some(entry.into_snapshot())
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.redo_stack.pop_back()?;
        self.push_undo(HistoryEntry::Snapshot(current));
        self.last_merge_at = None;
        Some(entry.into_snapshot())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_merge_at = None;
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }
}
