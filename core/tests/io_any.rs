use pe_core::{export_json, import_any, import_file, import_json, import_plaintext, parse_html, to_html, Document, ImportError, ImportKind};

#[test]
fn plaintext_becomes_one_paragraph_per_line() {
    assert_eq!(import_plaintext("a\nb"), "<p>a</p><p>b</p>");
    assert_eq!(import_plaintext("x\r\n\r\n<y>"), "<p>x</p><p></p><p>&lt;y&gt;</p>");
}

#[test]
fn import_dispatches_on_extension() {
    assert_eq!(ImportKind::from_file_name("Post.HTM"), Some(ImportKind::Html));
    assert_eq!(ImportKind::from_file_name("readme.markdown"), Some(ImportKind::Markdown));
    assert_eq!(import_file("notes.txt", "a\nb").as_deref(), Some("<p>a</p><p>b</p>"));
    assert_eq!(import_file("page.html", "<h2>Hi</h2>").as_deref(), Some("<h2>Hi</h2>"));
    assert_eq!(import_file("post.md", "# Hi").as_deref(), Some("<h1>Hi</h1>"));
    assert_eq!(import_file("scan.pdf", "%PDF"), None);
}

#[test]
fn import_any_reads_from_disk() {
    let mut tmp = std::env::temp_dir();
    tmp.push(format!("pe_import_{}.md", uuid::Uuid::new_v4()));
    std::fs::write(&tmp, "Intro\n\n- item").unwrap();
    let html = import_any(&tmp).unwrap();
    let _ = std::fs::remove_file(&tmp);
    assert_eq!(html, "<p>Intro</p><ul><li><p>item</p></li></ul>");
}

#[test]
fn import_any_reports_errors() {
    let mut missing = std::env::temp_dir();
    missing.push(format!("pe_missing_{}.txt", uuid::Uuid::new_v4()));
    assert!(matches!(import_any(&missing), Err(ImportError::Io { .. })));

    let other = std::env::temp_dir().join("slides.pptx");
    match import_any(&other) {
        Err(ImportError::Unsupported(ext)) => assert_eq!(ext, "pptx"),
        other => panic!("expected unsupported, got {other:?}"),
    }
}

#[test]
fn json_round_trip_keeps_content() {
    let doc = Document::from_blocks(parse_html(
        "<h2>Plan</h2><ul data-type=\"taskList\"><li data-type=\"taskItem\" data-checked=\"false\"><p>write</p></li></ul>",
    ));
    let json = export_json(&doc).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(restored.id, doc.id);
    assert_eq!(to_html(&restored), to_html(&doc));
    assert!(import_json("{not json").is_err());
}
