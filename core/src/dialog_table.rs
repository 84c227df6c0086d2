use crate::EditorCommand;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("tables need at least one row and one column")]
    Empty,
    #[error("{rows}x{cols} exceeds the {max}x{max} limit")]
    TooLarge { rows: usize, cols: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableDialogState {
    Editing,
    Confirming,
}

/// Hover grid plus steppers. Confirming locks the dialog so a burst of clicks
/// inserts a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDialog {
    grid_size: usize,
    max_dimension: usize,
    rows: usize,
    cols: usize,
    hover: Option<(usize, usize)>,
    with_header_row: bool,
    state: TableDialogState,
}

impl Default for TableDialog {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl TableDialog {
    pub fn new(grid_size: usize, max_dimension: usize) -> Self {
        let max_dimension = max_dimension.max(1);
        Self {
            grid_size: grid_size.clamp(1, max_dimension),
            max_dimension,
            rows: 3.min(max_dimension),
            cols: 3.min(max_dimension),
            hover: None,
            with_header_row: true,
            state: TableDialogState::Editing,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn state(&self) -> TableDialogState {
        self.state
    }

    pub fn is_confirming(&self) -> bool {
        self.state == TableDialogState::Confirming
    }

    pub fn with_header_row(&self) -> bool {
        self.with_header_row
    }

    /// Dimensions the dialog would insert right now.
    pub fn preview(&self) -> (usize, usize) {
        self.hover.unwrap_or((self.rows, self.cols))
    }

    pub fn hover(&mut self, row: usize, col: usize) {
        if self.is_confirming() {
            return;
        }
        if self.in_grid(row, col) {
            self.hover = Some((row, col));
        }
    }

    fn in_grid(&self, row: usize, col: usize) -> bool {
        (1..=self.grid_size).contains(&row) && (1..=self.grid_size).contains(&col)
    }

    pub fn leave_grid(&mut self) {
        if !self.is_confirming() {
            self.hover = None;
        }
    }

    pub fn set_rows(&mut self, rows: usize) {
        if !self.is_confirming() {
            self.rows = rows.clamp(1, self.max_dimension);
        }
    }

    pub fn set_cols(&mut self, cols: usize) {
        if !self.is_confirming() {
            self.cols = cols.clamp(1, self.max_dimension);
        }
    }

    pub fn step_rows(&mut self, delta: isize) {
        self.set_rows(self.rows.saturating_add_signed(delta));
    }

    pub fn step_cols(&mut self, delta: isize) {
        self.set_cols(self.cols.saturating_add_signed(delta));
    }

    pub fn toggle_header(&mut self) {
        if !self.is_confirming() {
            self.with_header_row = !self.with_header_row;
        }
    }

    pub fn validate(&self, rows: usize, cols: usize) -> Result<(), TableError> {
        if rows == 0 || cols == 0 {
            return Err(TableError::Empty);
        }
        if rows > self.max_dimension || cols > self.max_dimension {
            return Err(TableError::TooLarge { rows, cols, max: self.max_dimension });
        }
        Ok(())
    }

    /// Grid click; confirms the clicked dimensions. Cells outside the grid
    /// are ignored.
    pub fn click_cell(&mut self, row: usize, col: usize) -> Option<EditorCommand> {
        if self.is_confirming() || !self.in_grid(row, col) {
            return None;
        }
        self.hover(row, col);
        self.confirm(row, col)
    }

    /// Submit button; confirms the stepper values.
    pub fn submit(&mut self) -> Option<EditorCommand> {
        if self.is_confirming() {
            return None;
        }
        self.confirm(self.rows, self.cols)
    }

    fn confirm(&mut self, rows: usize, cols: usize) -> Option<EditorCommand> {
        self.validate(rows, cols).ok()?;
        self.state = TableDialogState::Confirming;
        Some(EditorCommand::InsertTable { rows, cols, with_header_row: self.with_header_row })
    }
}
