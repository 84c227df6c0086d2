use pe_core::{
    slugify, AutolinkKind, Block, ConfigError, DocumentCommands, EditorCommand, EditorConfig, ExportFormat,
    PostEditor, Selection, Template, ToolbarAction,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn titled(content: &str, title: &str) -> PostEditor {
    PostEditor::new(EditorConfig {
        initial_content: content.to_string(),
        document_title: title.to_string(),
        ..EditorConfig::default()
    })
    .unwrap()
}

#[test]
fn config_is_validated() {
    assert!(matches!(
        EditorConfig::from_json(r#"{"document_title":"T","history_depth":0}"#),
        Err(ConfigError::ZeroHistoryDepth)
    ));
    assert!(matches!(EditorConfig::from_json("{oops"), Err(ConfigError::Json(_))));
    let config = EditorConfig::from_json(r#"{"is_full_screen":true}"#).unwrap();
    assert_eq!(config.print_delay_ms, 250);

    let post = PostEditor::new(config).unwrap();
    assert!(post.ui().is_full_screen);

    let too_wide = EditorConfig { table_grid_size: 30, ..EditorConfig::default() };
    assert!(matches!(PostEditor::new(too_wide), Err(ConfigError::GridTooLarge { grid: 30, max: 20 })));
}

#[test]
fn export_names_types_and_bodies() {
    let post = titled("<h1>Title</h1><p>Body</p>", "My First Post!");

    let html = post.export(ExportFormat::Html);
    assert_eq!(html.file_name, "my-first-post.html");
    assert_eq!(html.mime_type, "text/html");
    assert!(html.contents.starts_with("<!DOCTYPE html>"));
    assert!(html.contents.contains("<title>My First Post!</title>"));
    assert!(html.contents.contains("<h1>Title</h1><p>Body</p>"));

    let md = post.export(ExportFormat::Markdown);
    assert_eq!(md.file_name, "my-first-post.md");
    assert_eq!(md.mime_type, "text/markdown");
    assert_eq!(md.contents, "# Title\n\nBody");

    let word = post.export(ExportFormat::Word);
    assert_eq!(word.file_name, "my-first-post.doc");
    assert_eq!(word.mime_type, "application/msword");
    assert!(word.contents.contains("urn:schemas-microsoft-com:office:word"));
    assert!(word.contents.contains("<h1>Title</h1>"));
}

#[test]
fn slugs_fall_back_to_post() {
    assert_eq!(slugify("  Hello,  World  "), "hello-world");
    assert_eq!(slugify("!!!"), "post");
    assert_eq!(slugify(""), "post");
}

#[test]
fn print_waits_before_opening_dialog() {
    let mut post = titled("<p>Body</p>", "Draft");
    post.set_title("Final <draft>");
    let job = post.print();
    assert_eq!(job.delay, Duration::from_millis(250));
    assert!(job.html.contains("@media print"));
    assert!(job.html.contains("<title>Final &lt;draft&gt;</title>"));
    assert!(job.html.contains("<p>Body</p>"));
}

#[test]
fn import_replaces_content_and_is_undoable() {
    let mut post = PostEditor::from_html("<p>old</p>");
    assert!(post.import("notes.txt", "a\nb"));
    assert_eq!(post.html(), "<p>a</p><p>b</p>");

    assert!(!post.import("scan.pdf", "%PDF-1.7"));
    assert_eq!(post.html(), "<p>a</p><p>b</p>");

    assert!(post.perform(ToolbarAction::Undo));
    assert_eq!(post.html(), "<p>old</p>");
}

#[test]
fn templates_load_as_content() {
    let mut post = PostEditor::from_html("");
    assert!(post.apply_template(Template::BasicArticle));
    assert_eq!(post.html(), Template::BasicArticle.html());

    for template in Template::ALL {
        assert!(!template.label().is_empty());
        post.apply_template(template);
        assert!(post.editor().word_count() > 0, "{template:?} is empty");
    }

    post.apply_template(Template::MeetingNotes);
    assert!(post.editor().doc().blocks.iter().any(|b| matches!(b, Block::TaskList { .. })));
    post.apply_template(Template::Report);
    assert!(post.html().contains("<table><tbody><tr><th><p>Metric</p></th>"));
}

#[test]
fn autolinks_are_found_and_promoted_on_click() {
    let mut post = PostEditor::from_html("<p>see www.example.com, or mail me@ex.io</p>");
    let found = post.autolinks();
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].from, found[0].to), (4, 19));
    assert_eq!(found[0].kind, AutolinkKind::Url);
    assert_eq!(found[0].href(), "https://www.example.com");
    assert_eq!(found[1].text, "me@ex.io");
    assert_eq!(found[1].kind, AutolinkKind::Email);
    assert_eq!(found[1].href(), "mailto:me@ex.io");

    assert_eq!(post.click_autolink(6).as_deref(), Some("https://www.example.com"));
    assert!(post.html().contains(
        r#"<a href="https://www.example.com" target="_blank" rel="noopener noreferrer nofollow">www.example.com</a>"#
    ));
    assert_eq!(post.autolinks().len(), 1);
    assert_eq!(post.click_autolink(0), None);

    post.toggle_preview();
    let before = post.html();
    assert_eq!(post.click_autolink(30).as_deref(), Some("mailto:me@ex.io"));
    assert_eq!(post.html(), before);
}

#[test]
fn autolinks_skip_code_and_existing_links() {
    let post = PostEditor::from_html(
        r#"<p><code>http://a.io</code> and <a href="https://b.io">https://b.io</a></p><pre><code>https://c.io</code></pre>"#,
    );
    assert!(post.autolinks().is_empty());
}

#[test]
fn bare_domains_are_autolinked() {
    let post = PostEditor::from_html("<p>visit example.com today, or docs.example.org/guide. See notes.txt</p>");
    let found = post.autolinks();
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].from, found[0].to), (6, 17));
    assert_eq!(found[0].kind, AutolinkKind::Url);
    assert_eq!(found[0].href(), "https://example.com");
    assert_eq!(found[1].text, "docs.example.org/guide");
    assert_eq!(found[1].href(), "https://docs.example.org/guide");
}

#[test]
fn urls_next_to_images_are_autolinked() {
    let post = PostEditor::from_html(r#"<p>https://a.io<img src="https://a.io/x.png">www.b.io</p>"#);
    let found = post.autolinks();
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].from, found[0].to), (0, 12));
    assert_eq!(found[0].text, "https://a.io");
    assert_eq!((found[1].from, found[1].to), (13, 21));
}

#[test]
fn status_bar_tracks_counts_and_last_change() {
    let mut post = PostEditor::from_html("<p>two words</p>");
    let status = post.status();
    assert_eq!((status.words, status.characters), (2, 9));
    assert_eq!(status.last_change, None);

    post.set_selection(Selection::collapsed(9));
    assert!(post.execute(EditorCommand::InsertText(" more".into())));
    let status = post.status();
    assert_eq!(status.words, 3);
    assert!(status.last_change.is_some());
}

#[test]
fn container_forwards_changes_to_listener() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.set_on_change(move |html| sink.borrow_mut().push(html.to_string()));

    post.set_selection(Selection::range(0, 2));
    post.perform(ToolbarAction::ToggleMark(pe_core::MarkKind::Italic));
    post.perform(ToolbarAction::ToggleFullScreen);
    assert_eq!(*seen.borrow(), vec!["<p><em>Hi</em></p>".to_string()]);
}
