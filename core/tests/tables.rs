use pe_core::{Block, TableEditor};

fn header_flags(table: &Block) -> Vec<Vec<bool>> {
    table
        .children()
        .unwrap()
        .iter()
        .map(|row| {
            row.children()
                .unwrap()
                .iter()
                .map(|cell| matches!(cell, Block::TableCell { header: true, .. }))
                .collect()
        })
        .collect()
}

#[test]
fn build_clamps_to_one_cell() {
    let table = TableEditor::build(0, 0, false);
    assert_eq!(TableEditor::dimensions(&table), Some((1, 1)));
    assert_eq!(TableEditor::dimensions(&Block::empty_paragraph()), None);
}

#[test]
fn rows_and_columns_follow_header_row() {
    let mut table = TableEditor::build(2, 2, true);
    assert!(TableEditor::insert_row(&mut table, 1));
    assert!(TableEditor::insert_column(&mut table, 0));
    assert_eq!(TableEditor::dimensions(&table), Some((3, 3)));
    assert_eq!(
        header_flags(&table),
        vec![vec![true, true, true], vec![false, false, false], vec![false, false, false]]
    );

    assert!(TableEditor::delete_row(&mut table, 0));
    assert!(!TableEditor::delete_row(&mut table, 5));
    assert!(TableEditor::delete_column(&mut table, 2));
    assert_eq!(TableEditor::dimensions(&table), Some((2, 2)));
}

#[test]
fn deleting_last_column_empties_table() {
    let mut table = TableEditor::build(2, 1, false);
    assert!(TableEditor::delete_column(&mut table, 0));
    assert_eq!(TableEditor::dimensions(&table), Some((0, 0)));

    let mut paragraph = Block::empty_paragraph();
    assert!(!TableEditor::insert_row(&mut paragraph, 0));
    assert!(!TableEditor::insert_column(&mut paragraph, 0));
}
