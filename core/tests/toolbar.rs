use pe_core::{
    dispatch, is_css_color, ButtonVariant, ColorChoice, ColorPicker, DocumentCommands, Dropdown, Editor, EditorCommand,
    EditorUiState, MarkKind, PostEditor, Selection, TextAlign, ToolbarAction, ToolbarState,
};

fn state(editor: &Editor) -> ToolbarState {
    ToolbarState::derive(editor, &EditorUiState::default())
}

#[test]
fn code_language_select_only_inside_code_block() {
    let mut editor = Editor::from_html(r#"<p>text</p><pre><code class="language-rust">x</code></pre>"#);
    let outside = state(&editor);
    assert_eq!(outside.code_language, None);
    assert!(!outside.is_visible(&ToolbarAction::CodeLanguage(None)));
    assert!(outside.button(&ToolbarAction::Paragraph).active);

    editor.set_selection(Selection::collapsed(5));
    let inside = state(&editor);
    assert_eq!(inside.code_language.as_deref(), Some("rust"));
    assert!(inside.is_visible(&ToolbarAction::CodeLanguage(None)));
    let button = inside.button(&ToolbarAction::CodeBlock);
    assert!(button.active);
    assert_eq!(button.variant, ButtonVariant::Active);
    assert!(!inside.button(&ToolbarAction::Paragraph).active);
}

#[test]
fn table_controls_only_inside_table() {
    let mut editor = Editor::from_html("<p>a</p><table><tbody><tr><td><p>x</p></td></tr></tbody></table>");
    let outside = state(&editor);
    assert!(!outside.in_table);
    assert!(!outside.is_visible(&ToolbarAction::AddRowAfter));
    assert!(outside.button(&ToolbarAction::DeleteTable).disabled);

    editor.set_selection(Selection::collapsed(2));
    let inside = state(&editor);
    assert!(inside.in_table);
    let delete = inside.button(&ToolbarAction::DeleteTable);
    assert!(!delete.disabled);
    assert_eq!(delete.variant, ButtonVariant::Danger);
}

#[test]
fn undo_redo_buttons_follow_history() {
    let mut editor = Editor::from_html("<p>x</p>");
    assert!(state(&editor).button(&ToolbarAction::Undo).disabled);

    editor.select_all();
    assert!(dispatch(&mut editor, &ToolbarAction::ToggleMark(MarkKind::Bold)));
    let after_edit = state(&editor);
    assert!(!after_edit.button(&ToolbarAction::Undo).disabled);
    assert!(after_edit.button(&ToolbarAction::Redo).disabled);
    assert!(after_edit.button(&ToolbarAction::ToggleMark(MarkKind::Bold)).active);

    assert!(dispatch(&mut editor, &ToolbarAction::Undo));
    assert!(!state(&editor).button(&ToolbarAction::Redo).disabled);
}

#[test]
fn heading_and_alignment_state() {
    let mut editor = Editor::from_html("<h2><strong>T</strong>itle</h2>");
    editor.set_selection(Selection::range(0, 1));
    let toolbar = state(&editor);
    assert_eq!(toolbar.heading_level, Some(2));
    assert_eq!(toolbar.font_size, "32px");
    assert!(toolbar.button(&ToolbarAction::Heading(2)).active);
    assert!(!toolbar.button(&ToolbarAction::Paragraph).active);
    assert_eq!(toolbar.align, Some(TextAlign::Left));
    assert!(toolbar.active_marks.contains(&MarkKind::Bold));

    dispatch(&mut editor, &ToolbarAction::Align(TextAlign::Center));
    assert!(state(&editor).button(&ToolbarAction::Align(TextAlign::Center)).active);
}

#[test]
fn style_actions_reach_the_document() {
    let mut editor = Editor::from_html("<p>paint</p>");
    editor.select_all();
    dispatch(&mut editor, &ToolbarAction::TextColor(ColorChoice::Color("#ef4444".into())));
    dispatch(&mut editor, &ToolbarAction::Highlight(ColorChoice::Color("#bbf7d0".into())));
    dispatch(&mut editor, &ToolbarAction::FontSize(Some("18".into())));
    let toolbar = state(&editor);
    assert_eq!(toolbar.text_color.as_deref(), Some("#ef4444"));
    assert_eq!(toolbar.highlight.as_deref(), Some("#bbf7d0"));
    assert_eq!(toolbar.font_size, "18px");

    dispatch(&mut editor, &ToolbarAction::TextColor(ColorChoice::Remove));
    dispatch(&mut editor, &ToolbarAction::FontSize(None));
    let toolbar = state(&editor);
    assert_eq!(toolbar.text_color, None);
    assert_eq!(toolbar.font_size, "14px");
}

#[test]
fn action_command_mapping() {
    assert_eq!(ToolbarAction::OpenLinkDialog.command(), None);
    assert_eq!(ToolbarAction::ToggleMark(MarkKind::Link).command(), None);
    assert_eq!(
        ToolbarAction::CodeLanguage(Some(String::new())).command(),
        Some(EditorCommand::SetCodeBlockLanguage(None))
    );
    assert_eq!(
        ToolbarAction::FontFamily(Some(String::new())).command(),
        Some(EditorCommand::UnsetMark(MarkKind::FontFamily))
    );
    assert_eq!(
        ToolbarAction::FontSize(Some("huge".into())).command(),
        Some(EditorCommand::UnsetMark(MarkKind::FontSize))
    );
}

#[test]
fn preview_disables_editing_controls() {
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.set_selection(Selection::range(0, 2));
    assert!(post.perform(ToolbarAction::TogglePreview));

    let toolbar = post.toolbar();
    assert!(toolbar.preview);
    assert!(!toolbar.editable);
    assert!(toolbar.button(&ToolbarAction::ToggleMark(MarkKind::Bold)).disabled);
    let preview = toolbar.button(&ToolbarAction::TogglePreview);
    assert!(preview.active && !preview.disabled);
    assert!(!toolbar.button(&ToolbarAction::ToggleFullScreen).disabled);

    assert!(!post.perform(ToolbarAction::ToggleMark(MarkKind::Bold)));
    assert!(!post.perform(ToolbarAction::OpenLinkDialog));
    assert_eq!(post.ui().dialog, None);
    assert_eq!(post.preview_html().as_deref(), Some("<p>Hi</p>"));

    assert!(post.perform(ToolbarAction::ToggleFullScreen));
    assert!(post.ui().is_full_screen);
    assert!(post.perform(ToolbarAction::TogglePreview));
    assert!(post.toolbar().editable);
    assert_eq!(post.preview_html(), None);
    assert!(post.perform(ToolbarAction::ToggleMark(MarkKind::Bold)));
    assert_eq!(post.html(), "<p><strong>Hi</strong></p>");
}

#[test]
fn dropdown_closes_on_outside_press_and_select() {
    let mut dropdown = Dropdown::default();
    dropdown.toggle();
    dropdown.pointer_down(true);
    assert!(dropdown.is_open());
    dropdown.pointer_down(false);
    assert!(!dropdown.is_open());

    dropdown.toggle();
    assert_eq!(dropdown.select("h2"), "h2");
    assert!(!dropdown.is_open());
}

#[test]
fn color_picker_palette_and_custom() {
    let mut picker = ColorPicker::text_color();
    picker.dropdown().toggle();
    assert!(picker.is_open());
    assert_eq!(picker.pick(2), Some(ColorChoice::Color("#ef4444".into())));
    assert!(!picker.is_open());
    assert_eq!(picker.pick(99), None);

    picker.set_custom("nope!");
    assert_eq!(picker.apply_custom(), None);
    picker.set_custom(" #abc ");
    assert_eq!(picker.apply_custom(), Some(ColorChoice::Color("#abc".into())));
    assert_eq!(picker.remove(), ColorChoice::Remove);
    assert_eq!(ColorPicker::highlight().palette().len(), 6);

    assert!(is_css_color("rgb(1, 2, 3)"));
    assert!(is_css_color("rebeccapurple"));
    assert!(!is_css_color("#12"));
    assert!(!is_css_color("url(x)"));
}
