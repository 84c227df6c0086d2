use crate::{
    autolink_at, dispatch, export_file, find_autolinks, import_file, print_document, Autolink, ConfigError,
    DocumentCommands, DocumentQuery, Editor, EditorCommand, EditorConfig, ExportFormat, ExportedFile, ImageDialog,
    ImageError, ImageFile, ImageUploader, LinkDialog, LinkError, LinkOutcome, Mark, MarkKind, NodeType, PrintJob, Query,
    Selection, TableDialog, Template, ToolbarAction, ToolbarState, UploadError, UploadTicket, UploadedImage,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    Editing,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Link,
    Image,
    Table,
}

/// All container-level UI flags in one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorUiState {
    pub mode: EditorMode,
    pub is_full_screen: bool,
    pub dialog: Option<DialogKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBar {
    pub words: usize,
    pub characters: usize,
    pub last_change: Option<DateTime<Utc>>,
}

/// The editor as hosts embed it: document, toolbar, dialogs and status bar.
pub struct PostEditor {
    editor: Editor,
    config: EditorConfig,
    ui: EditorUiState,
    link_dialog: Option<LinkDialog>,
    image_dialog: ImageDialog,
    table_dialog: Option<TableDialog>,
    last_change: Option<DateTime<Utc>>,
}

impl PostEditor {
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let editor = Editor::with_config(&config);
        info!(words = editor.word_count(), "post editor created");
        Ok(Self {
            editor,
            ui: EditorUiState { is_full_screen: config.is_full_screen, ..EditorUiState::default() },
            image_dialog: ImageDialog::new(config.max_image_bytes),
            link_dialog: None,
            table_dialog: None,
            last_change: None,
            config,
        })
    }

    pub fn from_html(html: &str) -> Self {
        let config = EditorConfig { initial_content: html.to_string(), ..EditorConfig::default() };
        let editor = Editor::with_config(&config);
        Self {
            editor,
            ui: EditorUiState::default(),
            image_dialog: ImageDialog::new(config.max_image_bytes),
            link_dialog: None,
            table_dialog: None,
            last_change: None,
            config,
        }
    }

    pub fn set_on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.editor.set_on_change(listener);
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn ui(&self) -> EditorUiState {
        self.ui
    }

    pub fn html(&self) -> String {
        self.editor.html()
    }

    pub fn set_title(&mut self, title: &str) {
        self.config.document_title = title.to_string();
    }

    pub fn status(&self) -> StatusBar {
        StatusBar {
            words: self.editor.word_count(),
            characters: self.editor.character_count(),
            last_change: self.last_change,
        }
    }

    pub fn toolbar(&self) -> ToolbarState {
        ToolbarState::derive(&self.editor, &self.ui)
    }

    /// Routes a toolbar action to the container or to the document.
    pub fn perform(&mut self, action: ToolbarAction) -> bool {
        match action {
            ToolbarAction::TogglePreview => {
                self.toggle_preview();
                true
            }
            ToolbarAction::ToggleFullScreen => {
                self.ui.is_full_screen = !self.ui.is_full_screen;
                true
            }
            _ if self.ui.mode == EditorMode::Preview => false,
            ToolbarAction::OpenLinkDialog => self.open_link_dialog(),
            ToolbarAction::OpenImageDialog => {
                self.open_image_dialog();
                true
            }
            ToolbarAction::OpenTableDialog => {
                self.open_table_dialog();
                true
            }
            action => dispatch(self, &action),
        }
    }

    pub fn toggle_preview(&mut self) {
        self.close_dialog();
        self.ui.mode = match self.ui.mode {
            EditorMode::Editing => EditorMode::Preview,
            EditorMode::Preview => EditorMode::Editing,
        };
        self.editor.set_editable(self.ui.mode == EditorMode::Editing);
        debug!(mode = ?self.ui.mode, "editor mode changed");
    }

    /// Read-only HTML shown while previewing.
    pub fn preview_html(&self) -> Option<String> {
        (self.ui.mode == EditorMode::Preview).then(|| self.editor.html())
    }

    pub fn close_dialog(&mut self) {
        match self.ui.dialog.take() {
            Some(DialogKind::Link) => self.link_dialog = None,
            Some(DialogKind::Image) => self.image_dialog.close(),
            Some(DialogKind::Table) => self.table_dialog = None,
            None => {}
        }
    }

    fn open(&mut self, kind: DialogKind) {
        self.close_dialog();
        self.ui.dialog = Some(kind);
    }

    fn in_code_block(&self) -> bool {
        self.editor.is_active(&Query::Node(NodeType::CodeBlock))
    }

    /// Returns false inside code blocks, where links are not allowed.
    pub fn open_link_dialog(&mut self) -> bool {
        if self.in_code_block() {
            debug!("link dialog refused inside code block");
            return false;
        }
        let existing = self.editor.link_at_selection();
        let dialog = LinkDialog::open(
            existing.as_ref().map(|l| l.href.as_ref()),
            &self.editor.selected_text(),
            existing.as_ref().and_then(|l| l.target.as_deref()),
        );
        self.open(DialogKind::Link);
        self.link_dialog = Some(dialog);
        true
    }

    pub fn link_dialog_mut(&mut self) -> Option<&mut LinkDialog> {
        self.link_dialog.as_mut()
    }

    /// Save button. A validation error keeps the dialog open.
    pub fn save_link(&mut self) -> Result<bool, LinkError> {
        let Some(dialog) = self.link_dialog.as_mut() else { return Ok(false) };
        let outcome = dialog.save()?;
        if self.in_code_block() && matches!(outcome, LinkOutcome::Set { .. }) {
            return Err(LinkError::InCodeBlock);
        }
        self.close_dialog();
        Ok(self.apply_link(outcome))
    }

    /// Enter inside the URL field.
    pub fn link_key_enter(&mut self) -> bool {
        let Some(outcome) = self.link_dialog.as_mut().and_then(LinkDialog::key_enter) else { return false };
        self.close_dialog();
        self.apply_link(outcome)
    }

    fn apply_link(&mut self, outcome: LinkOutcome) -> bool {
        match outcome {
            LinkOutcome::Set { ref text, .. } => {
                let Some(attrs) = outcome.attrs() else { return false };
                self.execute(EditorCommand::SetLink { attrs, text: text.clone() })
            }
            LinkOutcome::Clear => self.execute(EditorCommand::UnsetLink),
        }
    }

    pub fn open_image_dialog(&mut self) {
        self.open(DialogKind::Image);
    }

    pub fn image_dialog(&self) -> Option<&ImageDialog> {
        (self.ui.dialog == Some(DialogKind::Image)).then_some(&self.image_dialog)
    }

    pub fn image_dialog_mut(&mut self) -> Option<&mut ImageDialog> {
        (self.ui.dialog == Some(DialogKind::Image)).then_some(&mut self.image_dialog)
    }

    /// First half of an upload: validates and previews the file. The caller
    /// runs the upload without holding the editor and reports back through
    /// [`PostEditor::finish_image_upload`].
    pub fn begin_image_upload(&mut self, file: ImageFile) -> Result<UploadTicket, ImageError> {
        if self.ui.mode == EditorMode::Preview {
            debug!(file = %file.name, "upload refused in preview");
            return Err(ImageError::ReadOnly);
        }
        if self.ui.dialog != Some(DialogKind::Image) {
            self.open_image_dialog();
        }
        self.image_dialog.select_file(file)
    }

    /// Inserts the uploaded image and closes the dialog. Stale results and
    /// failures leave the document untouched.
    pub fn finish_image_upload(&mut self, ticket: &UploadTicket, result: Result<UploadedImage, UploadError>) -> bool {
        if self.ui.dialog != Some(DialogKind::Image) {
            debug!(file = %ticket.file.name, "upload finished after dialog closed");
            return false;
        }
        let Some(image) = self.image_dialog.finish_upload(ticket, result) else { return false };
        let alt = image.filename.as_deref().or(Some(ticket.file.name.as_str()));
        let inserted = self.execute(EditorCommand::SetImage {
            src: image.url.clone(),
            alt: alt.map(str::to_string),
        });
        self.close_dialog();
        inserted
    }

    pub async fn upload_image(&mut self, uploader: &dyn ImageUploader, file: ImageFile) -> Result<bool, ImageError> {
        let ticket = self.begin_image_upload(file)?;
        let result = uploader.upload(&ticket.file).await;
        if self.finish_image_upload(&ticket, result) {
            return Ok(true);
        }
        match self.image_dialog().and_then(ImageDialog::error) {
            Some(err) => Err(err.clone()),
            None => Ok(false),
        }
    }

    /// URL tab submit.
    pub fn insert_image_url(&mut self) -> Result<bool, ImageError> {
        let Some(dialog) = self.image_dialog_mut() else { return Ok(false) };
        let (src, alt) = dialog.submit_url()?;
        let inserted = self.execute(EditorCommand::SetImage { src, alt });
        self.close_dialog();
        Ok(inserted)
    }

    pub fn open_table_dialog(&mut self) {
        self.open(DialogKind::Table);
        self.table_dialog = Some(TableDialog::new(self.config.table_grid_size, self.config.max_table_dimension));
    }

    pub fn table_dialog_mut(&mut self) -> Option<&mut TableDialog> {
        self.table_dialog.as_mut()
    }

    pub fn table_grid_click(&mut self, row: usize, col: usize) -> bool {
        let cmd = self.table_dialog.as_mut().and_then(|d| d.click_cell(row, col));
        self.confirm_table(cmd)
    }

    pub fn submit_table(&mut self) -> bool {
        let cmd = self.table_dialog.as_mut().and_then(TableDialog::submit);
        self.confirm_table(cmd)
    }

    fn confirm_table(&mut self, cmd: Option<EditorCommand>) -> bool {
        let Some(cmd) = cmd else { return false };
        let inserted = self.execute(cmd);
        self.close_dialog();
        inserted
    }

    pub fn export(&self, format: ExportFormat) -> ExportedFile {
        let file = export_file(format, &self.editor.html(), &self.config.document_title);
        info!(file = %file.file_name, bytes = file.contents.len(), "document exported");
        file
    }

    pub fn print(&self) -> PrintJob {
        print_document(
            &self.editor.html(),
            &self.config.document_title,
            Duration::from_millis(self.config.print_delay_ms),
        )
    }

    /// Replaces the content with an imported file. Unsupported extensions
    /// change nothing.
    pub fn import(&mut self, file_name: &str, contents: &str) -> bool {
        match import_file(file_name, contents) {
            Some(html) => self.execute(EditorCommand::SetContent(html)),
            None => {
                debug!(file = file_name, "unsupported import ignored");
                false
            }
        }
    }

    pub fn apply_template(&mut self, template: Template) -> bool {
        info!(template = template.label(), "applying template");
        self.execute(EditorCommand::SetContent(template.html().to_string()))
    }

    pub fn autolinks(&self) -> Vec<Autolink> {
        find_autolinks(self.editor.doc())
    }

    /// Click on a decorated URL: promotes it to a link and returns the href
    /// to open.
    pub fn click_autolink(&mut self, pos: usize) -> Option<String> {
        let link = autolink_at(self.editor.doc(), pos)?;
        if self.editor.is_editable() {
            self.set_selection(link.selection());
            self.execute(link.promote());
        }
        Some(link.href())
    }
}

impl DocumentCommands for PostEditor {
    fn execute(&mut self, cmd: EditorCommand) -> bool {
        let committed = self.editor.execute(cmd);
        if committed {
            self.last_change = Some(Utc::now());
        }
        committed
    }

    fn set_selection(&mut self, selection: Selection) {
        self.editor.set_selection(selection);
    }
}

impl DocumentQuery for PostEditor {
    fn is_active(&self, query: &Query) -> bool {
        self.editor.is_active(query)
    }

    fn get_attributes(&self, kind: MarkKind) -> Option<Mark> {
        self.editor.get_attributes(kind)
    }

    fn font_size(&self) -> String {
        self.editor.font_size()
    }

    fn heading_level(&self) -> Option<u8> {
        self.editor.heading_level()
    }

    fn code_block_language(&self) -> Option<String> {
        self.editor.code_block_language()
    }

    fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    fn is_editable(&self) -> bool {
        self.editor.is_editable()
    }
}
