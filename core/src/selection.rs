use serde::{Deserialize, Serialize};

/// Range over the flat position space; `anchor == focus` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub focus: usize,
}

impl Selection {
    pub fn collapsed(pos: usize) -> Self {
        Self { anchor: pos, focus: pos }
    }

    pub fn range(from: usize, to: usize) -> Self {
        Self { anchor: from, focus: to }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.focus)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.focus)
    }

    pub fn clamp(self, size: usize) -> Self {
        Self { anchor: self.anchor.min(size), focus: self.focus.min(size) }
    }
}
