use pe_core::{
    Block, Document, DocumentCommands, DocumentQuery, Editor, EditorCommand, Inline, LinkAttrs, Mark, MarkKind, Query,
    Selection, TextAlign,
};
use std::cell::RefCell;
use std::rc::Rc;

fn first_link(editor: &Editor) -> Option<(String, LinkAttrs)> {
    for tb in editor.doc().textblocks() {
        let content = editor.doc().block_at(&tb.path).and_then(Block::inline_content)?;
        for inline in content {
            if let Inline::Text { value, marks } = inline {
                if let Some(link) = &marks.link {
                    return Some((value.to_string(), link.clone()));
                }
            }
        }
    }
    None
}

#[test]
fn bold_toggle_twice_restores_state() {
    let mut editor = Editor::from_html("<p>Hello world</p>");
    let original = editor.html();
    editor.set_selection(Selection::range(0, 5));
    assert!(!editor.is_active(&Query::Mark(MarkKind::Bold)));

    assert!(editor.toggle_mark(Mark::Bold));
    assert!(editor.is_active(&Query::Mark(MarkKind::Bold)));
    assert_eq!(editor.html(), "<p><strong>Hello</strong> world</p>");

    assert!(editor.toggle_mark(Mark::Bold));
    assert!(!editor.is_active(&Query::Mark(MarkKind::Bold)));
    assert_eq!(editor.html(), original);
}

#[test]
fn toggle_with_new_attrs_updates_instead_of_removing() {
    let mut editor = Editor::from_html("<p>Colored</p>");
    editor.set_selection(Selection::range(0, 7));
    editor.toggle_mark(Mark::color("#ff0000"));
    editor.toggle_mark(Mark::color("#00ff00"));
    assert_eq!(editor.get_attributes(MarkKind::Color), Some(Mark::color("#00ff00")));
    editor.toggle_mark(Mark::color("#00ff00"));
    assert_eq!(editor.get_attributes(MarkKind::Color), None);
}

#[test]
fn set_link_with_text_on_empty_selection() {
    let mut editor = Editor::new(Document::new());
    assert!(editor.set_link(LinkAttrs::new("example.com", Some("_blank")), Some("Click".to_string())));

    let (text, link) = first_link(&editor).expect("link inserted");
    assert_eq!(text, "Click");
    assert_eq!(link.href.as_ref(), "https://example.com");
    assert_eq!(link.target.as_deref(), Some("_blank"));
    assert!(link.rel.as_deref().unwrap_or_default().contains("noopener"));
    assert_eq!(editor.selection(), Selection::collapsed(5));
    assert!(editor.html().contains(">Click</a>"));
}

#[test]
fn empty_href_removes_existing_link() {
    let mut editor = Editor::from_html(r#"<p><a href="https://x.com">link</a> text</p>"#);
    editor.set_selection(Selection::collapsed(2));
    assert!(editor.is_active(&Query::Mark(MarkKind::Link)));

    assert!(editor.set_link(LinkAttrs::new("", None), None));
    assert!(first_link(&editor).is_none());
    assert_eq!(editor.doc().plain_text(), "link text");
    assert!(!editor.html().contains("<a"));
}

#[test]
fn set_image_inserts_at_caret() {
    let mut editor = Editor::from_html("<p>ab</p>");
    editor.set_selection(Selection::collapsed(1));
    assert!(editor.set_image("https://cdn.example.com/cat.png", Some("cat")));
    assert_eq!(editor.html(), r#"<p>a<img src="https://cdn.example.com/cat.png" alt="cat">b</p>"#);
    assert_eq!(editor.selection(), Selection::collapsed(2));
}

#[test]
fn insert_table_shape_and_header() {
    let mut editor = Editor::new(Document::new());
    assert!(editor.insert_table(3, 4, true));
    let table = editor
        .doc()
        .blocks
        .iter()
        .find(|b| matches!(b, Block::Table { .. }))
        .expect("table inserted");
    let rows = table.children().unwrap();
    assert_eq!(rows.len(), 3);
    for (r, row) in rows.iter().enumerate() {
        let cells = row.children().unwrap();
        assert_eq!(cells.len(), 4);
        for cell in cells {
            match cell {
                Block::TableCell { header, .. } => assert_eq!(*header, r == 0),
                other => panic!("expected cell, got {other:?}"),
            }
        }
    }
    assert!(editor.is_active(&Query::Node(pe_core::NodeType::Table)));
}

#[test]
fn zero_sized_table_is_a_noop() {
    let mut editor = Editor::new(Document::new());
    assert!(!editor.insert_table(0, 3, false));
    assert!(!editor.can_undo());
}

#[test]
fn heading_reports_level_font_size() {
    let mut editor = Editor::from_html("<h2>Title</h2>");
    editor.set_selection(Selection::collapsed(2));
    assert_eq!(editor.font_size(), "32px");

    assert!(editor.execute(EditorCommand::SetParagraph));
    assert_eq!(editor.font_size(), "14px");

    editor.set_selection(Selection::range(0, 5));
    assert!(editor.set_font_size("18px"));
    assert_eq!(editor.font_size(), "18px");
    assert!(editor.html().contains(r#"<span style="font-size: 18px">Title</span>"#));

    assert!(editor.unset_font_size());
    assert_eq!(editor.html(), "<p>Title</p>");
}

#[test]
fn font_size_is_independent_of_family() {
    let mut editor = Editor::from_html("<p>Text</p>");
    editor.set_selection(Selection::range(0, 4));
    editor.execute(EditorCommand::SetMark(Mark::font_family("Georgia, serif")));
    editor.set_font_size("20px");
    editor.unset_font_size();
    assert_eq!(
        editor.get_attributes(MarkKind::FontFamily),
        Some(Mark::font_family("Georgia, serif"))
    );
    assert!(editor.html().contains("font-family: Georgia, serif"));
    assert!(!editor.html().contains("font-size"));
}

#[test]
fn clear_formatting_keeps_text() {
    let mut editor = Editor::from_html("<h1><strong>Big</strong></h1><blockquote><p><em>quiet</em></p></blockquote>");
    editor.select_all();
    assert!(editor.execute(EditorCommand::ClearFormatting));
    assert_eq!(editor.doc().plain_text(), "Big\nquiet");
    assert!(editor.doc().blocks.iter().all(|b| matches!(b, Block::Paragraph { .. })));
    assert!(!editor.html().contains("<strong>"));
}

#[test]
fn undo_redo_one_step_per_command() {
    let mut editor = Editor::from_html("<p>Hello</p>");
    assert!(!editor.can_undo());
    editor.set_selection(Selection::range(0, 5));
    editor.toggle_mark(Mark::Italic);
    editor.execute(EditorCommand::SetTextAlign(TextAlign::Center));
    assert!(editor.can_undo());

    assert!(editor.undo());
    assert_eq!(editor.html(), "<p><em>Hello</em></p>");
    assert!(editor.can_redo());
    assert!(editor.undo());
    assert_eq!(editor.html(), "<p>Hello</p>");
    assert!(!editor.undo());

    assert!(editor.redo());
    assert!(editor.redo());
    assert_eq!(editor.html(), r#"<p style="text-align: center"><em>Hello</em></p>"#);
    assert!(!editor.can_redo());
}

#[test]
fn typing_merges_into_one_undo_step() {
    let mut editor = Editor::new(Document::new());
    for c in ["H", "e", "y"] {
        editor.execute(EditorCommand::InsertText(c.to_string()));
    }
    assert_eq!(editor.doc().plain_text(), "Hey");
    assert_eq!(editor.history().undo_depth(), 1);
    editor.undo();
    assert_eq!(editor.doc().plain_text(), "");
}

#[test]
fn on_change_fires_once_per_committed_command() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut editor = Editor::new(Document::new());
    editor.set_on_change(move |html| sink.borrow_mut().push(html.to_string()));

    editor.execute(EditorCommand::InsertText("Hi".into()));
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0], "<p>Hi</p>");

    editor.set_selection(Selection::range(0, 2));
    editor.toggle_mark(Mark::Bold);
    assert_eq!(seen.borrow().len(), 2);
    assert!(seen.borrow()[1].contains("<strong>Hi</strong>"));

    editor.set_selection(Selection::collapsed(2));
    editor.execute(EditorCommand::ToggleMark(Mark::Underline));
    editor.execute(EditorCommand::AddRowAfter);
    assert_eq!(seen.borrow().len(), 2);

    editor.undo();
    assert_eq!(seen.borrow().len(), 3);
    assert!(!seen.borrow()[2].contains("<strong>"));
}

#[test]
fn read_only_editor_ignores_commands() {
    let mut editor = Editor::from_html("<p>Locked</p>");
    editor.set_editable(false);
    editor.select_all();
    assert!(!editor.toggle_mark(Mark::Bold));
    assert!(!editor.execute(EditorCommand::InsertText("x".into())));
    assert_eq!(editor.html(), "<p>Locked</p>");
    editor.set_editable(true);
    assert!(editor.toggle_mark(Mark::Bold));
}

#[test]
fn lists_toggle_and_nest() {
    let mut editor = Editor::from_html("<p>one</p><p>two</p>");
    editor.select_all();
    assert!(editor.execute(EditorCommand::ToggleBulletList));
    assert_eq!(editor.html(), "<ul><li><p>one</p></li><li><p>two</p></li></ul>");

    editor.set_selection(Selection::collapsed(5));
    assert!(editor.execute(EditorCommand::SinkListItem));
    assert_eq!(editor.html(), "<ul><li><p>one</p><ul><li><p>two</p></li></ul></li></ul>");

    assert!(editor.execute(EditorCommand::LiftListItem));
    assert_eq!(editor.html(), "<ul><li><p>one</p></li><li><p>two</p></li></ul>");

    editor.select_all();
    assert!(editor.execute(EditorCommand::ToggleBulletList));
    assert_eq!(editor.html(), "<p>one</p><p>two</p>");
}

#[test]
fn code_block_language_round_trip() {
    let mut editor = Editor::from_html("<p>let x = 1;</p>");
    assert!(editor.execute(EditorCommand::ToggleCodeBlock { language: Some("rust".into()) }));
    assert_eq!(editor.code_block_language().as_deref(), Some("rust"));
    assert_eq!(editor.html(), r#"<pre><code class="language-rust">let x = 1;</code></pre>"#);

    assert!(editor.execute(EditorCommand::SetCodeBlockLanguage(Some("python".into()))));
    assert!(editor.is_active(&Query::CodeLanguage("python".into())));

    assert!(editor.execute(EditorCommand::ToggleCodeBlock { language: None }));
    assert_eq!(editor.code_block_language(), None);
}

#[test]
fn table_row_and_column_commands() {
    let mut editor = Editor::new(Document::new());
    editor.insert_table(2, 2, false);
    assert!(editor.execute(EditorCommand::AddRowAfter));
    assert!(editor.execute(EditorCommand::AddColumnBefore));
    let dims = |e: &Editor| {
        e.doc()
            .blocks
            .iter()
            .find_map(pe_core::TableEditor::dimensions)
    };
    assert_eq!(dims(&editor), Some((3, 3)));
    assert!(editor.execute(EditorCommand::DeleteColumn));
    assert!(editor.execute(EditorCommand::DeleteRow));
    assert_eq!(dims(&editor), Some((2, 2)));
    assert!(editor.execute(EditorCommand::DeleteTable));
    assert_eq!(dims(&editor), None);
    assert_eq!(editor.html(), "<p></p>");
}

#[test]
fn counts_follow_content() {
    let mut editor = Editor::from_html("<p>two words</p>");
    assert_eq!(editor.word_count(), 2);
    assert_eq!(editor.character_count(), 9);
    editor.set_selection(Selection::collapsed(9));
    editor.execute(EditorCommand::InsertText(" more".into()));
    assert_eq!(editor.word_count(), 3);
}
