use pe_core::{
    find_autolinks, normalize_font_size, parse_html, slugify, to_html, Block, Document, DocumentCommands, DocumentQuery, Editor,
    Mark, Selection, TableDialog, TableEditor,
};
use proptest::prelude::*;

fn escaped_paragraph(text: &str) -> String {
    let escaped = text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    format!("<p>{escaped}</p>")
}

proptest! {
    #[test]
    fn inserted_table_has_requested_shape(rows in 1usize..=20, cols in 1usize..=20, header in any::<bool>()) {
        let mut editor = Editor::new(Document::new());
        prop_assert!(editor.insert_table(rows, cols, header));
        let dims: Vec<_> = editor.doc().blocks.iter().filter_map(TableEditor::dimensions).collect();
        prop_assert_eq!(dims, vec![(rows, cols)]);
    }

    #[test]
    fn table_dialog_never_exceeds_limits(rows in 0usize..100, cols in 0usize..100, delta in -50isize..50) {
        let mut dialog = TableDialog::default();
        dialog.set_rows(rows);
        dialog.set_cols(cols);
        dialog.step_rows(delta);
        let (r, c) = dialog.preview();
        prop_assert!((1..=20).contains(&r));
        prop_assert!((1..=20).contains(&c));
    }

    #[test]
    fn bold_toggle_twice_is_identity(text in "[a-z]{1,8}( [a-z]{1,8}){0,2}", a in 0usize..27, b in 0usize..27) {
        let mut editor = Editor::from_html(&escaped_paragraph(&text));
        let original = editor.html();
        let len = text.chars().count();
        let (from, to) = (a.min(len), b.min(len));
        prop_assume!(from != to);
        editor.set_selection(Selection::range(from, to));
        editor.toggle_mark(Mark::Bold);
        editor.toggle_mark(Mark::Bold);
        prop_assert_eq!(editor.html(), original);
    }

    #[test]
    fn serialized_html_is_a_fixed_point(text in "[A-Za-z0-9 <>&]{0,40}") {
        let once = to_html(&Document::from_blocks(parse_html(&escaped_paragraph(&text))));
        let twice = to_html(&Document::from_blocks(parse_html(&once)));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn undo_restores_every_intermediate_state(steps in proptest::collection::vec(0u8..4, 1..8)) {
        let mut editor = Editor::from_html("<p>alpha beta</p>");
        editor.set_selection(Selection::range(0, 5));
        let mut states = vec![editor.html()];
        for step in steps {
            let mark = match step {
                0 => Mark::Bold,
                1 => Mark::Italic,
                2 => Mark::Underline,
                _ => Mark::Strike,
            };
            if editor.toggle_mark(mark) {
                states.push(editor.html());
            }
        }
        while states.len() > 1 {
            states.pop();
            prop_assert!(editor.undo());
            let html = editor.html();
            prop_assert_eq!(Some(&html), states.last());
        }
        prop_assert!(!editor.can_undo());
    }

    #[test]
    fn slug_is_url_safe(title in "\\PC{0,40}") {
        let slug = slugify(&title);
        prop_assert!(!slug.is_empty());
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    }

    #[test]
    fn bare_numbers_become_pixels(n in 1u32..200) {
        prop_assert_eq!(normalize_font_size(&n.to_string()), Some(format!("{n}px")));
    }

    #[test]
    fn autolinks_stay_inside_their_textblock(word in "[a-z]{1,10}") {
        let doc = Document::from_blocks(parse_html(&format!("<p>{word} https://{word}.com</p><p>{word}@mail.com</p>")));
        let found = find_autolinks(&doc);
        prop_assert_eq!(found.len(), 2);
        let blocks = doc.textblocks();
        for link in &found {
            prop_assert!(blocks.iter().any(|tb| tb.start <= link.from && link.to <= tb.end()));
        }
        prop_assert!(matches!(doc.blocks[0], Block::Paragraph { .. }), "expected first block to be a paragraph");
    }
}
