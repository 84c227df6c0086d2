use crate::Block;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TableEditor;

fn empty_row(cols: usize, header: bool) -> Block {
    Block::TableRow {
        id: Uuid::new_v4(),
        children: (0..cols).map(|_| Block::table_cell(header, vec![Block::empty_paragraph()])).collect(),
    }
}

fn row_is_header(row: &Block) -> bool {
    row.children()
        .map(|cells| !cells.is_empty() && cells.iter().all(|c| matches!(c, Block::TableCell { header: true, .. })))
        .unwrap_or(false)
}

impl TableEditor {
    /// New table of empty cells; the first row becomes header cells when asked.
    pub fn build(rows: usize, cols: usize, header_row: bool) -> Block {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Block::Table {
            id: Uuid::new_v4(),
            children: (0..rows).map(|r| empty_row(cols, header_row && r == 0)).collect(),
        }
    }

    /// (rows, columns) of a table block; columns are read from the widest row.
    pub fn dimensions(block: &Block) -> Option<(usize, usize)> {
        match block {
            Block::Table { children, .. } => {
                let cols = children
                    .iter()
                    .map(|row| row.children().map_or(0, Vec::len))
                    .max()
                    .unwrap_or(0);
                Some((children.len(), cols))
            }
            _ => None,
        }
    }

    pub fn insert_row(block: &mut Block, index: usize) -> bool {
        let Some((_, cols)) = Self::dimensions(block) else { return false };
        if let Block::Table { children, .. } = block {
            let idx = index.min(children.len());
            children.insert(idx, empty_row(cols.max(1), false));
            return true;
        }
        false
    }

    pub fn delete_row(block: &mut Block, index: usize) -> bool {
        if let Block::Table { children, .. } = block {
            if index < children.len() {
                children.remove(index);
                return true;
            }
        }
        false
    }

    pub fn insert_column(block: &mut Block, index: usize) -> bool {
        if let Block::Table { children, .. } = block {
            for row in children.iter_mut() {
                let header = row_is_header(row);
                if let Some(cells) = row.children_mut() {
                    let idx = index.min(cells.len());
                    cells.insert(idx, Block::table_cell(header, vec![Block::empty_paragraph()]));
                }
            }
            return true;
        }
        false
    }

    pub fn delete_column(block: &mut Block, index: usize) -> bool {
        if let Block::Table { children, .. } = block {
            for row in children.iter_mut() {
                if let Some(cells) = row.children_mut() {
                    if index < cells.len() {
                        cells.remove(index);
                    }
                }
            }
            children.retain(|row| row.children().map_or(false, |cells| !cells.is_empty()));
            return true;
        }
        false
    }
}
