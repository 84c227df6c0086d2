use pe_core::{
    validate_url, DialogKind, DocumentCommands, ImageDialog, ImageError, ImageFile, ImageTab, ImageUploader,
    LinkAttrs, LinkDialog, LinkError, LinkOutcome, LinkTarget, PostEditor, Selection, TableDialog, TableError,
    ToolbarAction, UploadError, UploadFuture, UploadStatus, UploadedImage,
};
use std::cell::Cell;

struct MockUploader {
    calls: Cell<usize>,
    fail: bool,
}

impl MockUploader {
    fn ok() -> Self {
        Self { calls: Cell::new(0), fail: false }
    }

    fn failing() -> Self {
        Self { calls: Cell::new(0), fail: true }
    }
}

impl ImageUploader for MockUploader {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> UploadFuture<'a> {
        self.calls.set(self.calls.get() + 1);
        let fail = self.fail;
        let name = file.name.clone();
        Box::pin(async move {
            if fail {
                Err(UploadError::Failed("503 Service Unavailable".into()))
            } else {
                Ok(UploadedImage {
                    url: format!("https://cdn.example.com/{name}"),
                    filename: Some(name),
                    width: None,
                    height: None,
                    size: None,
                })
            }
        })
    }
}

fn png(name: &str, bytes: usize) -> ImageFile {
    ImageFile::new(name, "image/png", vec![0u8; bytes])
}

fn uploaded(url: &str) -> UploadedImage {
    UploadedImage { url: url.to_string(), filename: None, width: None, height: None, size: None }
}

#[tokio::test]
async fn oversized_and_non_image_files_never_upload() {
    let uploader = MockUploader::ok();
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.open_image_dialog();

    let big = post.upload_image(&uploader, png("big.png", 15 * 1024 * 1024)).await;
    assert!(matches!(big, Err(ImageError::TooLarge { .. })));

    let text = post.upload_image(&uploader, ImageFile::new("notes.txt", "text/plain", b"hi".to_vec())).await;
    assert_eq!(text, Err(ImageError::NotAnImage("text/plain".into())));

    assert_eq!(uploader.calls.get(), 0);
    assert_eq!(post.html(), "<p>Hi</p>");
    let dialog = post.image_dialog().expect("dialog stays open");
    assert!(dialog.pending().is_none());
    assert!(dialog.error().is_some());
}

#[tokio::test]
async fn valid_image_uploads_once_and_inserts() {
    let uploader = MockUploader::ok();
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.set_selection(Selection::collapsed(2));
    post.open_image_dialog();

    let inserted = post.upload_image(&uploader, png("photo.png", 2 * 1024 * 1024)).await;
    assert_eq!(inserted, Ok(true));
    assert_eq!(uploader.calls.get(), 1);
    assert_eq!(post.html(), r#"<p>Hi<img src="https://cdn.example.com/photo.png" alt="photo.png"></p>"#);
    assert_eq!(post.ui().dialog, None);
}

#[tokio::test]
async fn failed_upload_keeps_dialog_open() {
    let uploader = MockUploader::failing();
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.open_image_dialog();

    let result = post.upload_image(&uploader, png("photo.png", 1024)).await;
    assert!(matches!(result, Err(ImageError::Upload(UploadError::Failed(_)))));
    assert_eq!(uploader.calls.get(), 1);
    assert_eq!(post.ui().dialog, Some(DialogKind::Image));
    let pending = post.image_dialog().and_then(ImageDialog::pending).expect("preview kept");
    assert_eq!(pending.status, UploadStatus::Error);
    assert!(pending.preview_data_url.starts_with("data:image/png;base64,"));
    assert!(!post.html().contains("<img"));
}

#[test]
fn stale_upload_results_are_ignored() {
    let mut post = PostEditor::from_html("<p></p>");
    let first = post.begin_image_upload(png("first.png", 10)).unwrap();
    let second = post.begin_image_upload(png("second.png", 10)).unwrap();

    assert!(!post.finish_image_upload(&first, Ok(uploaded("https://cdn.example.com/first.png"))));
    assert!(!post.html().contains("first.png"));
    assert!(post.finish_image_upload(&second, Ok(uploaded("https://cdn.example.com/second.png"))));
    assert!(post.html().contains(r#"alt="second.png""#));

    let late = post.begin_image_upload(png("late.png", 10)).unwrap();
    post.close_dialog();
    post.open_image_dialog();
    assert!(!post.finish_image_upload(&late, Ok(uploaded("https://cdn.example.com/late.png"))));
    assert!(!post.html().contains("late.png"));
}

#[test]
fn image_url_tab_validates_before_inserting() {
    let mut post = PostEditor::from_html("<p></p>");
    post.open_image_dialog();
    let dialog = post.image_dialog_mut().unwrap();
    dialog.set_tab(ImageTab::Url);
    assert_eq!(post.insert_image_url(), Err(ImageError::MissingUrl));

    let dialog = post.image_dialog_mut().unwrap();
    dialog.set_url("not a url");
    assert!(matches!(post.insert_image_url(), Err(ImageError::InvalidUrl(_))));

    let dialog = post.image_dialog_mut().unwrap();
    dialog.set_url("https://x.com/a.png");
    assert_eq!(dialog.url_preview(), Some("https://x.com/a.png"));
    dialog.mark_preview_broken();
    assert_eq!(dialog.url_preview(), None);
    dialog.set_alt("A chart");
    assert_eq!(post.insert_image_url(), Ok(true));
    assert_eq!(post.html(), r#"<p><img src="https://x.com/a.png" alt="A chart"></p>"#);
    assert!(post.image_dialog().is_none());
}

#[test]
fn table_dialog_locks_after_first_click() {
    let mut dialog = TableDialog::default();
    let commands: Vec<_> = (0..10).filter_map(|_| dialog.click_cell(2, 3)).collect();
    assert_eq!(commands.len(), 1);
    assert!(dialog.is_confirming());
    assert_eq!(dialog.submit(), None);
}

#[test]
fn table_dialog_preview_and_steppers() {
    let mut dialog = TableDialog::default();
    assert_eq!(dialog.preview(), (3, 3));
    dialog.hover(4, 5);
    assert_eq!(dialog.preview(), (4, 5));
    dialog.hover(11, 1);
    assert_eq!(dialog.preview(), (4, 5));
    dialog.leave_grid();
    assert_eq!(dialog.preview(), (3, 3));

    dialog.set_rows(50);
    dialog.step_cols(-10);
    assert_eq!(dialog.preview(), (20, 1));
    dialog.toggle_header();
    assert_eq!(
        dialog.submit(),
        Some(pe_core::EditorCommand::InsertTable { rows: 20, cols: 1, with_header_row: false })
    );
    assert_eq!(dialog.validate(0, 2), Err(TableError::Empty));
    assert!(matches!(dialog.validate(21, 2), Err(TableError::TooLarge { .. })));
}

#[test]
fn rapid_grid_clicks_insert_one_table() {
    let mut post = PostEditor::from_html("<p>Intro</p>");
    post.set_selection(Selection::collapsed(5));
    post.open_table_dialog();
    let inserted = (0..10).filter(|_| post.table_grid_click(2, 3)).count();
    assert_eq!(inserted, 1);

    let tables: Vec<_> = post.editor().doc().blocks.iter().filter_map(pe_core::TableEditor::dimensions).collect();
    assert_eq!(tables, vec![(2, 3)]);
    assert_eq!(post.ui().dialog, None);
}

#[test]
fn url_validation_rules() {
    assert_eq!(validate_url("example.com").as_deref(), Ok("https://example.com"));
    assert_eq!(validate_url(" https://a.org/x?y=1 ").as_deref(), Ok("https://a.org/x?y=1"));
    assert_eq!(validate_url("/docs/intro").as_deref(), Ok("/docs/intro"));
    assert_eq!(validate_url("mailto:me@example.com").as_deref(), Ok("mailto:me@example.com"));
    assert_eq!(validate_url("   "), Err(LinkError::Empty));
    for bad in ["http://", "//evil.com", "mailto:", "javascript:alert(1)", "two words", "plainword"] {
        assert!(matches!(validate_url(bad), Err(LinkError::Invalid(_))), "accepted {bad}");
    }
}

#[test]
fn link_dialog_draft_and_enter() {
    let mut dialog = LinkDialog::open(Some("https://a.com"), "A", Some("_self"));
    assert!(dialog.is_editing_existing());
    assert_eq!(dialog.target(), LinkTarget::Current);

    dialog.set_url("bad url");
    assert_eq!(dialog.key_enter(), None);
    assert!(dialog.error().is_none());
    assert!(dialog.save().is_err());
    assert!(dialog.error().is_some());

    dialog.set_url("b.com");
    assert!(dialog.error().is_none());
    dialog.set_target(LinkTarget::Blank);
    assert_eq!(
        dialog.key_enter(),
        Some(LinkOutcome::Set { href: "https://b.com".into(), text: Some("A".into()), target: LinkTarget::Blank })
    );

    dialog.set_url("");
    assert_eq!(dialog.save(), Ok(LinkOutcome::Clear));
    assert_eq!(LinkDialog::open(None, "", None).save(), Err(LinkError::Empty));
}

#[test]
fn link_dialog_sets_and_clears_through_container() {
    let mut post = PostEditor::from_html("<p>Hello world</p>");
    post.set_selection(Selection::range(6, 11));
    post.open_link_dialog();

    let dialog = post.link_dialog_mut().unwrap();
    assert_eq!(dialog.text(), "world");
    assert!(!dialog.is_editing_existing());
    dialog.set_url("not a url");
    assert!(post.save_link().is_err());
    assert_eq!(post.ui().dialog, Some(DialogKind::Link));

    post.link_dialog_mut().unwrap().set_url("example.com");
    assert_eq!(post.save_link(), Ok(true));
    assert_eq!(
        post.html(),
        r#"<p>Hello <a href="https://example.com" target="_blank" rel="noopener noreferrer nofollow">world</a></p>"#
    );
    assert_eq!(post.ui().dialog, None);

    post.set_selection(Selection::collapsed(8));
    post.open_link_dialog();
    let dialog = post.link_dialog_mut().unwrap();
    assert!(dialog.is_editing_existing());
    assert_eq!(dialog.url(), "https://example.com");
    dialog.set_url("");
    assert_eq!(post.save_link(), Ok(true));
    assert_eq!(post.html(), "<p>Hello world</p>");
}

#[tokio::test]
async fn preview_rejects_uploads_before_sending() {
    let uploader = MockUploader::ok();
    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.toggle_preview();

    let result = post.upload_image(&uploader, png("photo.png", 1024)).await;
    assert_eq!(result, Err(ImageError::ReadOnly));
    assert_eq!(uploader.calls.get(), 0);
    assert_eq!(post.ui().dialog, None);
    assert!(post.begin_image_upload(png("late.png", 10)).is_err());

    post.toggle_preview();
    assert_eq!(post.upload_image(&uploader, png("photo.png", 1024)).await, Ok(true));
    assert_eq!(uploader.calls.get(), 1);
}

#[test]
fn links_are_refused_inside_code_blocks() {
    let mut post = PostEditor::from_html("<p>Hi</p><pre><code>let x</code></pre>");
    let before = post.html();
    post.set_selection(Selection::collapsed(5));

    assert!(post.toolbar().button(&ToolbarAction::OpenLinkDialog).disabled);
    assert!(!post.perform(ToolbarAction::OpenLinkDialog));
    assert_eq!(post.ui().dialog, None);

    let attrs = LinkAttrs::new("https://example.com", Some("_blank"));
    assert!(!post.set_link(attrs.clone(), Some("docs".into())));
    post.set_selection(Selection::range(3, 6));
    assert!(!post.set_link(attrs, None));
    assert_eq!(post.html(), before);
}

#[test]
fn link_dialog_save_fails_once_caret_moves_into_code() {
    let mut post = PostEditor::from_html("<p>Hi</p><pre><code>let x</code></pre>");
    post.set_selection(Selection::collapsed(1));
    assert!(!post.toolbar().button(&ToolbarAction::OpenLinkDialog).disabled);
    assert!(post.open_link_dialog());

    post.set_selection(Selection::collapsed(5));
    post.link_dialog_mut().unwrap().set_url("example.com");
    assert_eq!(post.save_link(), Err(LinkError::InCodeBlock));
    assert!(!post.html().contains("<a "));
    assert_eq!(post.ui().dialog, Some(DialogKind::Link));
}

#[test]
fn clicks_outside_the_grid_are_ignored() {
    let mut dialog = TableDialog::default();
    assert_eq!(dialog.click_cell(15, 15), None);
    assert_eq!(dialog.click_cell(0, 2), None);
    assert_eq!(dialog.click_cell(3, 11), None);
    assert!(!dialog.is_confirming());
    assert!(dialog.click_cell(10, 10).is_some());

    let mut post = PostEditor::from_html("<p>Hi</p>");
    post.open_table_dialog();
    assert!(!post.table_grid_click(11, 1));
    assert!(!post.html().contains("<table>"));
    assert!(post.table_grid_click(2, 2));
}
