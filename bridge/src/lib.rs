mod changes;

pub use changes::ChangeQueue;

use pe_core::{
    export_json, ColorChoice, DocumentCommands, EditorConfig, ExportFormat, ExportedFile, ImageFile, ImageTab,
    ImageUploader, LinkTarget, MarkKind, PostEditor, Selection, Template, TextAlign, ToolbarAction, UploadError,
    UploadFuture, UploadedImage,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("window is not available"))
}

/// Calls the host's `upload(bytes, name, mimeType)` function and awaits the
/// promise it returns.
struct JsUploader {
    upload: js_sys::Function,
}

impl ImageUploader for JsUploader {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> UploadFuture<'a> {
        Box::pin(async move {
            let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
            let returned = self
                .upload
                .call3(
                    &JsValue::NULL,
                    &bytes,
                    &JsValue::from_str(&file.name),
                    &JsValue::from_str(&file.mime_type),
                )
                .map_err(|e| UploadError::Failed(format!("{e:?}")))?;
            let promise: js_sys::Promise = returned
                .dyn_into()
                .map_err(|_| UploadError::InvalidResponse("upload did not return a promise".into()))?;
            let value = JsFuture::from(promise)
                .await
                .map_err(|e| UploadError::Failed(e.as_string().unwrap_or_else(|| format!("{e:?}"))))?;
            let image: UploadedImage =
                serde_wasm_bindgen::from_value(value).map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
            if image.url.trim().is_empty() {
                return Err(UploadError::InvalidResponse("missing url".into()));
            }
            Ok(image)
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolbarView {
    preview: bool,
    full_screen: bool,
    editable: bool,
    can_undo: bool,
    can_redo: bool,
    active_marks: Vec<MarkKind>,
    heading_level: Option<u8>,
    bullet_list: bool,
    ordered_list: bool,
    task_list: bool,
    blockquote: bool,
    code_block: bool,
    align: Option<&'static str>,
    font_family: Option<String>,
    font_size: String,
    text_color: Option<String>,
    highlight: Option<String>,
    link: bool,
    code_language: Option<String>,
    in_table: bool,
    dialog: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileView<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    contents: &'a str,
}

impl<'a> From<&'a ExportedFile> for FileView<'a> {
    fn from(file: &'a ExportedFile) -> Self {
        Self { file_name: &file.file_name, mime_type: &file.mime_type, contents: &file.contents }
    }
}

type HostCallback = Rc<RefCell<Option<js_sys::Function>>>;

fn notify(changes: &ChangeQueue, callback: &HostCallback) {
    changes.drain(|html| {
        let Some(callback) = callback.borrow().clone() else { return };
        if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&html)) {
            web_sys::console::error_1(&err);
        }
    });
}

#[wasm_bindgen]
pub struct WasmPostEditor {
    inner: Rc<RefCell<PostEditor>>,
    changes: ChangeQueue,
    on_change: HostCallback,
}

impl WasmPostEditor {
    /// Runs `f` on the editor, then delivers its changes once the borrow is
    /// released.
    fn mutate<R>(&self, f: impl FnOnce(&mut PostEditor) -> R) -> R {
        let out = f(&mut self.inner.borrow_mut());
        notify(&self.changes, &self.on_change);
        out
    }

    fn perform(&self, action: ToolbarAction) -> bool {
        self.mutate(|post| post.perform(action))
    }
}

#[wasm_bindgen]
impl WasmPostEditor {
    /// `config` is the JSON form of the editor settings; omitted fields take
    /// their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<WasmPostEditor, JsValue> {
        console_error_panic_hook::set_once();
        let config = match config.as_deref() {
            Some(raw) if !raw.trim().is_empty() => EditorConfig::from_json(raw).map_err(js_err)?,
            _ => EditorConfig::default(),
        };
        let mut editor = PostEditor::new(config).map_err(js_err)?;
        let changes = ChangeQueue::new();
        editor.set_on_change(changes.sink());
        Ok(Self { inner: Rc::new(RefCell::new(editor)), changes, on_change: Rc::new(RefCell::new(None)) })
    }

    /// Registers `callback(html)`, fired after every committed change. The
    /// editor is not borrowed while it runs.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: js_sys::Function) {
        *self.on_change.borrow_mut() = Some(callback);
    }

    pub fn html(&self) -> String {
        self.inner.borrow().html()
    }

    #[wasm_bindgen(js_name = previewHtml)]
    pub fn preview_html(&self) -> Option<String> {
        self.inner.borrow().preview_html()
    }

    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        export_json(self.inner.borrow().editor().doc()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&self, anchor: usize, focus: usize) {
        self.mutate(|post| post.set_selection(Selection::range(anchor, focus)));
    }

    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&self, text: &str) -> bool {
        self.mutate(|post| post.execute(pe_core::EditorCommand::InsertText(text.to_string())))
    }

    #[wasm_bindgen(js_name = setTitle)]
    pub fn set_title(&self, title: &str) {
        self.mutate(|post| post.set_title(title));
    }

    /// `kind` is a snake_case mark name such as `"bold"` or `"superscript"`.
    #[wasm_bindgen(js_name = toggleMark)]
    pub fn toggle_mark(&self, kind: JsValue) -> Result<bool, JsValue> {
        let kind: MarkKind = serde_wasm_bindgen::from_value(kind).map_err(js_err)?;
        Ok(self.perform(ToolbarAction::ToggleMark(kind)))
    }

    #[wasm_bindgen(js_name = setParagraph)]
    pub fn set_paragraph(&self) -> bool {
        self.perform(ToolbarAction::Paragraph)
    }

    #[wasm_bindgen(js_name = toggleHeading)]
    pub fn toggle_heading(&self, level: u8) -> bool {
        self.perform(ToolbarAction::Heading(level))
    }

    #[wasm_bindgen(js_name = toggleBulletList)]
    pub fn toggle_bullet_list(&self) -> bool {
        self.perform(ToolbarAction::BulletList)
    }

    #[wasm_bindgen(js_name = toggleOrderedList)]
    pub fn toggle_ordered_list(&self) -> bool {
        self.perform(ToolbarAction::OrderedList)
    }

    #[wasm_bindgen(js_name = toggleTaskList)]
    pub fn toggle_task_list(&self) -> bool {
        self.perform(ToolbarAction::TaskList)
    }

    #[wasm_bindgen(js_name = sinkListItem)]
    pub fn sink_list_item(&self) -> bool {
        self.perform(ToolbarAction::SinkListItem)
    }

    #[wasm_bindgen(js_name = liftListItem)]
    pub fn lift_list_item(&self) -> bool {
        self.perform(ToolbarAction::LiftListItem)
    }

    #[wasm_bindgen(js_name = toggleBlockquote)]
    pub fn toggle_blockquote(&self) -> bool {
        self.perform(ToolbarAction::Blockquote)
    }

    #[wasm_bindgen(js_name = toggleCodeBlock)]
    pub fn toggle_code_block(&self) -> bool {
        self.perform(ToolbarAction::CodeBlock)
    }

    #[wasm_bindgen(js_name = setCodeLanguage)]
    pub fn set_code_language(&self, language: Option<String>) -> bool {
        self.perform(ToolbarAction::CodeLanguage(language))
    }

    #[wasm_bindgen(js_name = setTextAlign)]
    pub fn set_text_align(&self, align: &str) -> Result<bool, JsValue> {
        let align = TextAlign::parse(align).ok_or_else(|| JsValue::from_str("unknown alignment"))?;
        Ok(self.perform(ToolbarAction::Align(align)))
    }

    #[wasm_bindgen(js_name = setFontFamily)]
    pub fn set_font_family(&self, family: Option<String>) -> bool {
        self.perform(ToolbarAction::FontFamily(family))
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&self, size: Option<String>) -> bool {
        self.perform(ToolbarAction::FontSize(size))
    }

    #[wasm_bindgen(js_name = setTextColor)]
    pub fn set_text_color(&self, color: Option<String>) -> bool {
        self.perform(ToolbarAction::TextColor(color.map_or(ColorChoice::Remove, ColorChoice::Color)))
    }

    #[wasm_bindgen(js_name = setHighlight)]
    pub fn set_highlight(&self, color: Option<String>) -> bool {
        self.perform(ToolbarAction::Highlight(color.map_or(ColorChoice::Remove, ColorChoice::Color)))
    }

    #[wasm_bindgen(js_name = insertHorizontalRule)]
    pub fn insert_horizontal_rule(&self) -> bool {
        self.perform(ToolbarAction::HorizontalRule)
    }

    pub fn unlink(&self) -> bool {
        self.perform(ToolbarAction::Unlink)
    }

    #[wasm_bindgen(js_name = clearFormatting)]
    pub fn clear_formatting(&self) -> bool {
        self.perform(ToolbarAction::ClearFormatting)
    }

    /// Row/column operation by name: `addRowBefore`, `addRowAfter`,
    /// `deleteRow`, `addColumnBefore`, `addColumnAfter`, `deleteColumn`,
    /// `deleteTable`.
    #[wasm_bindgen(js_name = tableCommand)]
    pub fn table_command(&self, name: &str) -> Result<bool, JsValue> {
        let action = match name {
            "addRowBefore" => ToolbarAction::AddRowBefore,
            "addRowAfter" => ToolbarAction::AddRowAfter,
            "deleteRow" => ToolbarAction::DeleteRow,
            "addColumnBefore" => ToolbarAction::AddColumnBefore,
            "addColumnAfter" => ToolbarAction::AddColumnAfter,
            "deleteColumn" => ToolbarAction::DeleteColumn,
            "deleteTable" => ToolbarAction::DeleteTable,
            other => return Err(JsValue::from_str(&format!("unknown table command: {other}"))),
        };
        Ok(self.perform(action))
    }

    pub fn undo(&self) -> bool {
        self.perform(ToolbarAction::Undo)
    }

    pub fn redo(&self) -> bool {
        self.perform(ToolbarAction::Redo)
    }

    #[wasm_bindgen(js_name = togglePreview)]
    pub fn toggle_preview(&self) -> bool {
        self.perform(ToolbarAction::TogglePreview)
    }

    #[wasm_bindgen(js_name = toggleFullScreen)]
    pub fn toggle_full_screen(&self) -> bool {
        self.perform(ToolbarAction::ToggleFullScreen)
    }

    #[wasm_bindgen(js_name = toolbarState)]
    pub fn toolbar_state(&self) -> Result<JsValue, JsValue> {
        let post = self.inner.borrow();
        let state = post.toolbar();
        let view = ToolbarView {
            preview: state.preview,
            full_screen: state.full_screen,
            editable: state.editable,
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            active_marks: state.active_marks,
            heading_level: state.heading_level,
            bullet_list: state.bullet_list,
            ordered_list: state.ordered_list,
            task_list: state.task_list,
            blockquote: state.blockquote,
            code_block: state.code_block,
            align: state.align.map(|a| a.as_str()),
            font_family: state.font_family,
            font_size: state.font_size,
            text_color: state.text_color,
            highlight: state.highlight,
            link: state.link,
            code_language: state.code_language,
            in_table: state.in_table,
            dialog: post.ui().dialog.map(|d| match d {
                pe_core::DialogKind::Link => "link",
                pe_core::DialogKind::Image => "image",
                pe_core::DialogKind::Table => "table",
            }),
        };
        serde_wasm_bindgen::to_value(&view).map_err(js_err)
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> JsValue {
        let status = self.inner.borrow().status();
        serde_wasm_bindgen::to_value(&serde_json::json!({
            "words": status.words,
            "characters": status.characters,
            "lastChange": status.last_change.map(|t| t.to_rfc3339()),
        }))
        .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = closeDialog)]
    pub fn close_dialog(&self) {
        self.mutate(PostEditor::close_dialog);
    }

    /// Opens the link dialog and returns its prefilled draft.
    #[wasm_bindgen(js_name = openLinkDialog)]
    pub fn open_link_dialog(&self) -> JsValue {
        self.mutate(|post| {
            if !post.perform(ToolbarAction::OpenLinkDialog) {
                return JsValue::NULL;
            }
            match post.link_dialog_mut() {
                Some(dialog) => serde_wasm_bindgen::to_value(&serde_json::json!({
                    "url": dialog.url(),
                    "text": dialog.text(),
                    "target": dialog.target().as_str(),
                    "editingExisting": dialog.is_editing_existing(),
                }))
                .unwrap_or(JsValue::NULL),
                None => JsValue::NULL,
            }
        })
    }

    /// Saves the link draft. Validation errors come back as rejections and
    /// leave the dialog open.
    #[wasm_bindgen(js_name = saveLink)]
    pub fn save_link(&self, url: &str, text: &str, target: &str) -> Result<bool, JsValue> {
        self.mutate(|post| {
            let Some(dialog) = post.link_dialog_mut() else { return Ok(false) };
            dialog.set_url(url);
            dialog.set_text(text);
            dialog.set_target(LinkTarget::parse(target));
            post.save_link().map_err(js_err)
        })
    }

    #[wasm_bindgen(js_name = openImageDialog)]
    pub fn open_image_dialog(&self) -> bool {
        self.perform(ToolbarAction::OpenImageDialog)
    }

    #[wasm_bindgen(js_name = insertImageUrl)]
    pub fn insert_image_url(&self, url: &str, alt: &str) -> Result<bool, JsValue> {
        self.mutate(|post| {
            if post.image_dialog().is_none() && !post.perform(ToolbarAction::OpenImageDialog) {
                return Ok(false);
            }
            if let Some(dialog) = post.image_dialog_mut() {
                dialog.set_tab(ImageTab::Url);
                dialog.set_url(url);
                dialog.set_alt(alt);
            }
            post.insert_image_url().map_err(js_err)
        })
    }

    /// Validates the file, runs `upload(bytes, name, mimeType)` and inserts
    /// the returned image. The editor is not borrowed while the upload runs,
    /// so a newer selection or a closed dialog wins over a late result.
    #[wasm_bindgen(js_name = uploadImage)]
    pub fn upload_image(&self, name: String, mime_type: String, bytes: Vec<u8>, upload: js_sys::Function) -> js_sys::Promise {
        let inner = self.inner.clone();
        let changes = self.changes.clone();
        let on_change = self.on_change.clone();
        future_to_promise(async move {
            let ticket = inner
                .borrow_mut()
                .begin_image_upload(ImageFile::new(name, mime_type, bytes))
                .map_err(js_err)?;
            let uploader = JsUploader { upload };
            let result = uploader.upload(&ticket.file).await;
            let failure = result.as_ref().err().map(js_err);
            let inserted = inner.borrow_mut().finish_image_upload(&ticket, result);
            notify(&changes, &on_change);
            match failure {
                Some(err) => Err(err),
                None => Ok(JsValue::from_bool(inserted)),
            }
        })
    }

    #[wasm_bindgen(js_name = openTableDialog)]
    pub fn open_table_dialog(&self) -> bool {
        self.perform(ToolbarAction::OpenTableDialog)
    }

    #[wasm_bindgen(js_name = tableGridClick)]
    pub fn table_grid_click(&self, row: usize, col: usize) -> bool {
        self.mutate(|post| post.table_grid_click(row, col))
    }

    /// Stepper form of the table dialog.
    #[wasm_bindgen(js_name = submitTable)]
    pub fn submit_table(&self, rows: usize, cols: usize, with_header_row: bool) -> bool {
        self.mutate(|post| {
            let Some(dialog) = post.table_dialog_mut() else { return false };
            dialog.set_rows(rows);
            dialog.set_cols(cols);
            if dialog.with_header_row() != with_header_row {
                dialog.toggle_header();
            }
            post.submit_table()
        })
    }

    /// `format` is `"html"`, `"markdown"` or `"word"`.
    pub fn export(&self, format: JsValue) -> Result<JsValue, JsValue> {
        let format: ExportFormat = serde_wasm_bindgen::from_value(format).map_err(js_err)?;
        let file = self.inner.borrow().export(format);
        serde_wasm_bindgen::to_value(&FileView::from(&file)).map_err(js_err)
    }

    /// Exports and triggers a browser download.
    pub fn download(&self, format: JsValue) -> Result<(), JsValue> {
        let format: ExportFormat = serde_wasm_bindgen::from_value(format).map_err(js_err)?;
        let file = self.inner.borrow().export(format);
        let document = window()?.document().ok_or_else(|| JsValue::from_str("document is not available"))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(&file.mime_type);
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into().map_err(JsValue::from)?;
        anchor.set_href(&url);
        anchor.set_download(&file.file_name);
        anchor.click();
        web_sys::Url::revoke_object_url(&url)
    }

    /// Opens the print view in a new window and prints it once images have
    /// had time to load.
    pub fn print(&self) -> Result<(), JsValue> {
        let job = self.inner.borrow().print();
        let window = window()?;
        let popup = window
            .open_with_url_and_target("", "_blank")?
            .ok_or_else(|| JsValue::from_str("print window was blocked"))?;
        let document: web_sys::HtmlDocument = popup
            .document()
            .ok_or_else(|| JsValue::from_str("print window has no document"))?
            .dyn_into()
            .map_err(JsValue::from)?;
        document.open()?;
        document.write(&js_sys::Array::of1(&JsValue::from_str(&job.html)))?;
        document.close()?;

        let print = Closure::once_into_js(move || {
            if let Err(err) = popup.print() {
                web_sys::console::error_1(&err);
            }
        });
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            print.unchecked_ref(),
            i32::try_from(job.delay.as_millis()).unwrap_or(i32::MAX),
        )?;
        Ok(())
    }

    /// Replaces the content with an `.html`, `.txt` or `.md` file's text.
    #[wasm_bindgen(js_name = importFile)]
    pub fn import_file(&self, name: &str, contents: &str) -> bool {
        self.mutate(|post| post.import(name, contents))
    }

    /// `template` is a snake_case template name such as `"meeting_notes"`.
    #[wasm_bindgen(js_name = applyTemplate)]
    pub fn apply_template(&self, template: JsValue) -> Result<bool, JsValue> {
        let template: Template = serde_wasm_bindgen::from_value(template).map_err(js_err)?;
        Ok(self.mutate(|post| post.apply_template(template)))
    }

    #[wasm_bindgen(js_name = templateNames)]
    pub fn template_names() -> Result<JsValue, JsValue> {
        let names: Vec<(Template, &str)> = Template::ALL.iter().map(|t| (*t, t.label())).collect();
        serde_wasm_bindgen::to_value(&names).map_err(js_err)
    }

    /// Decorated URL and email ranges, for the host to underline.
    pub fn autolinks(&self) -> Result<JsValue, JsValue> {
        let found: Vec<serde_json::Value> = self
            .inner
            .borrow()
            .autolinks()
            .into_iter()
            .map(|link| serde_json::json!({ "from": link.from, "to": link.to, "href": link.href() }))
            .collect();
        serde_wasm_bindgen::to_value(&found).map_err(js_err)
    }

    /// Click on a decorated URL; returns the href the host should open.
    #[wasm_bindgen(js_name = clickAutolink)]
    pub fn click_autolink(&self, pos: usize) -> Option<String> {
        self.mutate(|post| post.click_autolink(pos))
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}
