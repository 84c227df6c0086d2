use arboard::Clipboard;
use eframe::{egui, App, Frame};
use egui::text::CCursor;
use pe_core::{
    plain_text, Block, ButtonVariant, ColorPicker, DialogKind, DocumentCommands, EditorCommand,
    EditorConfig, ExportFormat, ImageFile, ImageTab, LinkTarget, MarkKind, NodeType, PostEditor, Selection, Template,
    TextAlign, ToolbarAction, ToolbarState, UploadedImage, CODE_LANGUAGES, FONT_FAMILIES, FONT_SIZES,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Post Editor",
        options,
        Box::new(|_cc| Box::new(EditorApp::new())),
    )
}

/// Text-field buffers for the open dialog. The dialogs own validation; these
/// only hold what the user is typing.
#[derive(Default)]
struct DialogInputs {
    link_url: String,
    link_text: String,
    link_blank: bool,
    image_path: String,
    image_url: String,
    image_alt: String,
    message: Option<String>,
}

struct EditorApp {
    post: PostEditor,
    inputs: DialogInputs,
    text_color: ColorPicker,
    highlight: ColorPicker,
    custom_color: String,
    import_path: String,
    notice: Option<String>,
}

impl EditorApp {
    fn new() -> Self {
        let config = EditorConfig {
            initial_content: Template::BasicArticle.html().to_string(),
            document_title: "Untitled post".to_string(),
            ..EditorConfig::default()
        };
        let post = PostEditor::new(config.clone()).unwrap_or_else(|err| {
            warn!(%err, "invalid editor config, falling back to defaults");
            PostEditor::from_html(&config.initial_content)
        });
        Self {
            post,
            inputs: DialogInputs::default(),
            text_color: ColorPicker::text_color(),
            highlight: ColorPicker::highlight(),
            custom_color: String::new(),
            import_path: String::new(),
            notice: None,
        }
    }

    fn action_button(&mut self, ui: &mut egui::Ui, toolbar: &ToolbarState, label: &str, action: ToolbarAction) {
        if !toolbar.is_visible(&action) {
            return;
        }
        let state = toolbar.button(&action);
        let mut button = egui::Button::new(label).selected(state.active);
        if state.variant == ButtonVariant::Danger {
            button = button.fill(egui::Color32::from_rgb(254, 226, 226));
        }
        if ui.add_enabled(!state.disabled, button).clicked() {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: ToolbarAction) {
        let opens_link = action == ToolbarAction::OpenLinkDialog;
        let opens_image = action == ToolbarAction::OpenImageDialog;
        self.post.perform(action);
        if opens_link {
            if let Some(dialog) = self.post.link_dialog_mut() {
                self.inputs.link_url = dialog.url().to_string();
                self.inputs.link_text = dialog.text().to_string();
                self.inputs.link_blank = dialog.target() == LinkTarget::Blank;
                self.inputs.message = None;
            }
        }
        if opens_image {
            self.inputs.image_path.clear();
            self.inputs.image_url.clear();
            self.inputs.image_alt.clear();
            self.inputs.message = None;
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        let toolbar = self.post.toolbar();
        ui.horizontal_wrapped(|ui| {
            self.action_button(ui, &toolbar, "Undo", ToolbarAction::Undo);
            self.action_button(ui, &toolbar, "Redo", ToolbarAction::Redo);
            ui.separator();

            let current = match toolbar.heading_level {
                Some(level) => format!("Heading {level}"),
                None => "Paragraph".to_string(),
            };
            ui.add_enabled_ui(toolbar.editable, |ui| {
                egui::ComboBox::from_id_source("block_type").selected_text(current).show_ui(ui, |ui| {
                    if ui.selectable_label(toolbar.heading_level.is_none(), "Paragraph").clicked() {
                        self.perform(ToolbarAction::Paragraph);
                    }
                    for level in 1..=6u8 {
                        let active = toolbar.heading_level == Some(level);
                        if ui.selectable_label(active, format!("Heading {level}")).clicked() {
                            self.perform(ToolbarAction::Heading(level));
                        }
                    }
                });
                let family = toolbar.font_family.clone().unwrap_or_default();
                let family_label = FONT_FAMILIES
                    .iter()
                    .find(|(_, value)| *value == family)
                    .map_or("Custom", |(label, _)| *label);
                egui::ComboBox::from_id_source("font_family").selected_text(family_label).show_ui(ui, |ui| {
                    for (label, value) in FONT_FAMILIES {
                        if ui.selectable_label(value == family, label).clicked() {
                            self.perform(ToolbarAction::FontFamily(Some(value.to_string())));
                        }
                    }
                });
                egui::ComboBox::from_id_source("font_size").selected_text(toolbar.font_size.clone()).show_ui(ui, |ui| {
                    for size in FONT_SIZES {
                        if ui.selectable_label(toolbar.font_size == size, size).clicked() {
                            self.perform(ToolbarAction::FontSize(Some(size.to_string())));
                        }
                    }
                    if ui.button("Reset").clicked() {
                        self.perform(ToolbarAction::FontSize(None));
                    }
                });
            });
            ui.separator();

            for (label, kind) in [
                ("B", MarkKind::Bold),
                ("I", MarkKind::Italic),
                ("U", MarkKind::Underline),
                ("S", MarkKind::Strike),
                ("Code", MarkKind::Code),
                ("x²", MarkKind::Superscript),
                ("x₂", MarkKind::Subscript),
            ] {
                self.action_button(ui, &toolbar, label, ToolbarAction::ToggleMark(kind));
            }
            self.color_menu(ui, &toolbar, false);
            self.color_menu(ui, &toolbar, true);
            self.action_button(ui, &toolbar, "Link", ToolbarAction::OpenLinkDialog);
            if toolbar.link {
                self.action_button(ui, &toolbar, "Unlink", ToolbarAction::Unlink);
            }
            self.action_button(ui, &toolbar, "Clear", ToolbarAction::ClearFormatting);
            ui.separator();

            for (label, align) in [
                ("Left", TextAlign::Left),
                ("Center", TextAlign::Center),
                ("Right", TextAlign::Right),
                ("Justify", TextAlign::Justify),
            ] {
                self.action_button(ui, &toolbar, label, ToolbarAction::Align(align));
            }
            ui.separator();

            self.action_button(ui, &toolbar, "• List", ToolbarAction::BulletList);
            self.action_button(ui, &toolbar, "1. List", ToolbarAction::OrderedList);
            self.action_button(ui, &toolbar, "☑ Tasks", ToolbarAction::TaskList);
            self.action_button(ui, &toolbar, "Indent", ToolbarAction::SinkListItem);
            self.action_button(ui, &toolbar, "Outdent", ToolbarAction::LiftListItem);
            self.action_button(ui, &toolbar, "Quote", ToolbarAction::Blockquote);
            self.action_button(ui, &toolbar, "Code block", ToolbarAction::CodeBlock);
            if let Some(language) = toolbar.code_language.clone() {
                let selected = CODE_LANGUAGES
                    .iter()
                    .find(|(_, value)| *value == language)
                    .map_or(language.as_str(), |(label, _)| *label)
                    .to_string();
                egui::ComboBox::from_id_source("code_language").selected_text(selected).show_ui(ui, |ui| {
                    for (label, value) in CODE_LANGUAGES {
                        if ui.selectable_label(value == language, label).clicked() {
                            self.perform(ToolbarAction::CodeLanguage(Some(value.to_string())));
                        }
                    }
                });
            }
            self.action_button(ui, &toolbar, "—", ToolbarAction::HorizontalRule);
            ui.separator();

            self.action_button(ui, &toolbar, "Image", ToolbarAction::OpenImageDialog);
            self.action_button(ui, &toolbar, "Table", ToolbarAction::OpenTableDialog);
            self.action_button(ui, &toolbar, "+Row above", ToolbarAction::AddRowBefore);
            self.action_button(ui, &toolbar, "+Row below", ToolbarAction::AddRowAfter);
            self.action_button(ui, &toolbar, "-Row", ToolbarAction::DeleteRow);
            self.action_button(ui, &toolbar, "+Col left", ToolbarAction::AddColumnBefore);
            self.action_button(ui, &toolbar, "+Col right", ToolbarAction::AddColumnAfter);
            self.action_button(ui, &toolbar, "-Col", ToolbarAction::DeleteColumn);
            self.action_button(ui, &toolbar, "Delete table", ToolbarAction::DeleteTable);
            ui.separator();

            self.action_button(ui, &toolbar, "Preview", ToolbarAction::TogglePreview);
            self.action_button(ui, &toolbar, "Full screen", ToolbarAction::ToggleFullScreen);
        });
        ui.horizontal(|ui| self.file_row(ui));
    }

    fn color_menu(&mut self, ui: &mut egui::Ui, toolbar: &ToolbarState, highlight: bool) {
        let (title, current) = if highlight {
            ("Highlight", toolbar.highlight.clone())
        } else {
            ("Color", toolbar.text_color.clone())
        };
        let label = current.map_or_else(|| title.to_string(), |c| format!("{title} {c}"));
        let mut picked = None;
        ui.add_enabled_ui(toolbar.editable, |ui| {
            ui.menu_button(label, |ui| {
                let picker = if highlight { &mut self.highlight } else { &mut self.text_color };
                if !picker.is_open() {
                    picker.dropdown().toggle();
                }
                for (index, (name, hex)) in picker.palette().iter().enumerate() {
                    let swatch = egui::Button::new(*name).fill(parse_hex(hex).unwrap_or(egui::Color32::WHITE));
                    if ui.add(swatch).clicked() {
                        picked = picker.pick(index);
                    }
                }
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.custom_color);
                    if ui.button("Apply").clicked() {
                        picker.set_custom(&self.custom_color);
                        picked = picker.apply_custom();
                    }
                });
                if ui.button("Remove").clicked() {
                    picked = Some(picker.remove());
                }
                if picked.is_some() {
                    ui.close_menu();
                }
            });
        });
        if let Some(choice) = picked {
            let action = if highlight { ToolbarAction::Highlight(choice) } else { ToolbarAction::TextColor(choice) };
            self.perform(action);
        }
    }

    fn file_row(&mut self, ui: &mut egui::Ui) {
        let editable = self.post.toolbar().editable;
        ui.menu_button("Templates", |ui| {
            for template in Template::ALL {
                if ui.add_enabled(editable, egui::Button::new(template.label())).clicked() {
                    self.post.apply_template(template);
                    ui.close_menu();
                }
            }
        });
        ui.menu_button("Export", |ui| {
            for (label, format) in [
                ("HTML", ExportFormat::Html),
                ("Markdown", ExportFormat::Markdown),
                ("Word", ExportFormat::Word),
            ] {
                if ui.button(label).clicked() {
                    self.save_export(format);
                    ui.close_menu();
                }
            }
        });
        if ui.button("Print").clicked() {
            let job = self.post.print();
            let path = std::env::temp_dir().join("post-print.html");
            self.notice = Some(match std::fs::write(&path, job.html) {
                Ok(()) => format!("Print view written to {}", path.display()),
                Err(err) => format!("Print failed: {err}"),
            });
        }
        if ui.button("Copy HTML").clicked() {
            match Clipboard::new().and_then(|mut cb| cb.set_text(self.post.html())) {
                Ok(()) => self.notice = Some("HTML copied".to_string()),
                Err(err) => warn!(%err, "clipboard unavailable"),
            }
        }
        ui.label("Import:");
        ui.text_edit_singleline(&mut self.import_path);
        if ui.add_enabled(editable, egui::Button::new("Open")).clicked() {
            self.import_from_disk();
        }
    }

    fn save_export(&mut self, format: ExportFormat) {
        let file = self.post.export(format);
        let path = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir()).join(&file.file_name);
        self.notice = Some(match std::fs::write(&path, &file.contents) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        });
    }

    fn import_from_disk(&mut self) {
        let path = Path::new(self.import_path.trim());
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        self.notice = Some(match std::fs::read_to_string(path) {
            Ok(contents) if self.post.import(&name, &contents) => format!("Imported {name}"),
            Ok(_) => format!("{name} is not an .html, .txt or .md file"),
            Err(err) => format!("Import failed: {err}"),
        });
    }

    /// Reads a local image and finishes the upload with a `file://` URL.
    fn upload_local_image(&mut self) {
        let path = Path::new(self.inputs.image_path.trim()).to_path_buf();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.inputs.message = Some(err.to_string());
                return;
            }
        };
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("image").to_string();
        let ticket = match self.post.begin_image_upload(ImageFile::new(name.clone(), mime_for(&path), bytes)) {
            Ok(ticket) => ticket,
            Err(err) => {
                self.inputs.message = Some(err.to_string());
                return;
            }
        };
        let url = match path.canonicalize() {
            Ok(abs) => format!("file://{}", abs.display()),
            Err(_) => format!("file://{}", path.display()),
        };
        let image = UploadedImage { url, filename: Some(name), width: None, height: None, size: Some(ticket.file.size()) };
        if self.post.finish_image_upload(&ticket, Ok(image)) {
            info!(path = %path.display(), "local image inserted");
        }
    }

    fn dialogs(&mut self, ctx: &egui::Context) {
        match self.post.ui().dialog {
            Some(DialogKind::Link) => self.link_window(ctx),
            Some(DialogKind::Image) => self.image_window(ctx),
            Some(DialogKind::Table) => self.table_window(ctx),
            None => {}
        }
    }

    fn link_window(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut save = false;
        egui::Window::new("Link").open(&mut open).collapsible(false).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("URL");
                let field = ui.text_edit_singleline(&mut self.inputs.link_url);
                if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    save = true;
                }
            });
            ui.horizontal(|ui| {
                ui.label("Text");
                ui.text_edit_singleline(&mut self.inputs.link_text);
            });
            ui.checkbox(&mut self.inputs.link_blank, "Open in new tab");
            if let Some(message) = &self.inputs.message {
                ui.colored_label(egui::Color32::from_rgb(220, 38, 38), message);
            }
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    save = true;
                }
                if ui.button("Remove link").clicked() {
                    self.inputs.link_url.clear();
                    save = true;
                }
            });
        });
        if save {
            if let Some(dialog) = self.post.link_dialog_mut() {
                dialog.set_url(&self.inputs.link_url);
                dialog.set_text(&self.inputs.link_text);
                dialog.set_target(if self.inputs.link_blank { LinkTarget::Blank } else { LinkTarget::Current });
            }
            if let Err(err) = self.post.save_link() {
                self.inputs.message = Some(err.to_string());
            }
        }
        if !open {
            self.post.close_dialog();
        }
    }

    fn image_window(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut upload = false;
        let mut insert_url = false;
        let tab = self.post.image_dialog().map(|d| d.tab()).unwrap_or_default();
        let mut next_tab = tab;
        egui::Window::new("Image").open(&mut open).collapsible(false).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut next_tab, ImageTab::Upload, "Upload");
                ui.selectable_value(&mut next_tab, ImageTab::Url, "URL");
            });
            match tab {
                ImageTab::Upload => {
                    ui.horizontal(|ui| {
                        ui.label("File");
                        ui.text_edit_singleline(&mut self.inputs.image_path);
                    });
                    if let Some(pending) = self.post.image_dialog().and_then(|d| d.pending()) {
                        ui.label(format!("{} ({} bytes): {:?}", pending.file_name, pending.size, pending.status));
                    }
                    upload = ui.button("Upload").clicked();
                }
                ImageTab::Url => {
                    ui.horizontal(|ui| {
                        ui.label("URL");
                        ui.text_edit_singleline(&mut self.inputs.image_url);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Alt text");
                        ui.text_edit_singleline(&mut self.inputs.image_alt);
                    });
                    insert_url = ui.button("Insert").clicked();
                }
            }
            let error = self.post.image_dialog().and_then(|d| d.error()).map(ToString::to_string);
            if let Some(message) = error.or_else(|| self.inputs.message.clone()) {
                ui.colored_label(egui::Color32::from_rgb(220, 38, 38), message);
            }
        });
        if next_tab != tab {
            if let Some(dialog) = self.post.image_dialog_mut() {
                dialog.set_tab(next_tab);
            }
        }
        if upload {
            self.upload_local_image();
        }
        if insert_url {
            if let Some(dialog) = self.post.image_dialog_mut() {
                dialog.set_url(&self.inputs.image_url);
                dialog.set_alt(&self.inputs.image_alt);
            }
            if let Err(err) = self.post.insert_image_url() {
                self.inputs.message = Some(err.to_string());
            }
        }
        if !open {
            self.post.close_dialog();
        }
    }

    fn table_window(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut clicked = None;
        let mut submit = false;
        let Some(dialog) = self.post.table_dialog_mut() else { return };
        egui::Window::new("Insert table").open(&mut open).collapsible(false).show(ctx, |ui| {
            let (rows, cols) = dialog.preview();
            ui.label(format!("{rows} × {cols}"));
            let grid = dialog.grid_size();
            let mut hovered = None;
            egui::Grid::new("table_grid").spacing([2.0, 2.0]).show(ui, |ui| {
                for row in 1..=grid {
                    for col in 1..=grid {
                        let lit = row <= rows && col <= cols;
                        let fill = if lit { egui::Color32::from_rgb(147, 197, 253) } else { egui::Color32::from_gray(230) };
                        let cell = ui.add(egui::Button::new("").min_size(egui::vec2(14.0, 14.0)).fill(fill));
                        if cell.hovered() {
                            hovered = Some((row, col));
                        }
                        if cell.clicked() {
                            clicked = Some((row, col));
                        }
                    }
                    ui.end_row();
                }
            });
            match hovered {
                Some((row, col)) => dialog.hover(row, col),
                None => dialog.leave_grid(),
            }
            ui.separator();
            let (mut rows, mut cols) = dialog.preview();
            ui.horizontal(|ui| {
                ui.label("Rows");
                ui.add(egui::DragValue::new(&mut rows).clamp_range(1..=20));
                ui.label("Columns");
                ui.add(egui::DragValue::new(&mut cols).clamp_range(1..=20));
            });
            dialog.set_rows(rows);
            dialog.set_cols(cols);
            let mut header = dialog.with_header_row();
            if ui.checkbox(&mut header, "Header row").changed() {
                dialog.toggle_header();
            }
            submit = ui.add_enabled(!dialog.is_confirming(), egui::Button::new("Insert")).clicked();
        });
        if let Some((row, col)) = clicked {
            self.post.table_grid_click(row, col);
        } else if submit {
            self.post.submit_table();
        }
        if !open {
            self.post.close_dialog();
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.post.ui().dialog.is_some() {
            return;
        }
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::Text(text) => {
                    self.post.execute(EditorCommand::InsertText(text));
                }
                egui::Event::Paste(text) => {
                    let command = if text.contains('<') && text.contains('>') {
                        EditorCommand::InsertContent(text)
                    } else {
                        EditorCommand::InsertText(text)
                    };
                    self.post.execute(command);
                }
                egui::Event::Copy => {
                    let selected = self.post.editor().selected_text();
                    if !selected.is_empty() {
                        ctx.output_mut(|o| o.copied_text = selected);
                    }
                }
                egui::Event::Key { key, pressed: true, modifiers, .. } => self.key(key, modifiers),
                _ => {}
            }
        }
    }

    fn key(&mut self, key: egui::Key, modifiers: egui::Modifiers) {
        let selection = self.post.editor().selection();
        let size = self.post.editor().doc().size();
        if modifiers.command {
            let action = match key {
                egui::Key::B => Some(ToolbarAction::ToggleMark(MarkKind::Bold)),
                egui::Key::I => Some(ToolbarAction::ToggleMark(MarkKind::Italic)),
                egui::Key::U => Some(ToolbarAction::ToggleMark(MarkKind::Underline)),
                egui::Key::K => Some(ToolbarAction::OpenLinkDialog),
                egui::Key::Z if modifiers.shift => Some(ToolbarAction::Redo),
                egui::Key::Z => Some(ToolbarAction::Undo),
                egui::Key::Y => Some(ToolbarAction::Redo),
                _ => None,
            };
            if let Some(action) = action {
                self.perform(action);
            }
            return;
        }
        match key {
            egui::Key::Backspace => {
                self.post.execute(EditorCommand::DeleteBackward);
            }
            egui::Key::Enter => {
                self.post.execute(EditorCommand::SplitBlock);
            }
            egui::Key::Tab if modifiers.shift => self.perform(ToolbarAction::LiftListItem),
            egui::Key::Tab => self.perform(ToolbarAction::SinkListItem),
            egui::Key::ArrowLeft | egui::Key::ArrowRight => {
                let focus = selection.focus;
                let next = if key == egui::Key::ArrowLeft { focus.saturating_sub(1) } else { (focus + 1).min(size) };
                let moved = if modifiers.shift {
                    Selection::range(selection.anchor, next)
                } else {
                    Selection::collapsed(next)
                };
                self.post.set_selection(moved);
            }
            _ => {}
        }
    }

    fn document(&mut self, ui: &mut egui::Ui) {
        let blocks = self.post.editor().doc().textblocks();
        let selection = self.post.editor().selection();
        let autolinks = self.post.autolinks();
        for tb in blocks {
            let Some(block) = self.post.editor().doc().block_at(&tb.path) else { continue };
            let text = block.inline_content().map(|c| plain_text(c)).unwrap_or_default();
            let font = match block {
                Block::Heading { level, .. } => egui::FontId::proportional(30.0 - f32::from(*level) * 2.5),
                Block::CodeBlock { .. } => egui::FontId::monospace(14.0),
                _ => egui::FontId::proportional(15.0),
            };
            let background = match block.node_type() {
                NodeType::CodeBlock => Some(egui::Color32::from_rgb(243, 244, 246)),
                _ => None,
            };
            let galley = ui.painter().layout_no_wrap(text, font, egui::Color32::from_rgb(31, 41, 55));
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), galley.size().y.max(18.0)),
                egui::Sense::click_and_drag(),
            );
            let painter = ui.painter_at(rect);
            if let Some(fill) = background {
                painter.rect_filled(rect, 4.0, fill);
            }
            let (from, to) = (selection.from(), selection.to());
            if from < to && from <= tb.end() && to >= tb.start {
                let a = from.max(tb.start) - tb.start;
                let b = to.min(tb.end()) - tb.start;
                let left = galley.pos_from_ccursor(CCursor::new(a)).left();
                let right = galley.pos_from_ccursor(CCursor::new(b)).left();
                let band = egui::Rect::from_min_max(
                    egui::pos2(rect.left() + left, rect.top()),
                    egui::pos2(rect.left() + right, rect.bottom()),
                );
                painter.rect_filled(band, 0.0, egui::Color32::from_rgb(191, 219, 254));
            }
            for link in autolinks.iter().filter(|l| l.from >= tb.start && l.to <= tb.end()) {
                let left = galley.pos_from_ccursor(CCursor::new(link.from - tb.start)).left();
                let right = galley.pos_from_ccursor(CCursor::new(link.to - tb.start)).left();
                painter.line_segment(
                    [egui::pos2(rect.left() + left, rect.bottom() - 1.0), egui::pos2(rect.left() + right, rect.bottom() - 1.0)],
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(37, 99, 235)),
                );
            }
            painter.galley(rect.min, galley.clone(), egui::Color32::from_rgb(31, 41, 55));
            if selection.is_collapsed() && selection.focus >= tb.start && selection.focus <= tb.end() {
                let caret = galley.pos_from_ccursor(CCursor::new(selection.focus - tb.start));
                painter.rect_filled(
                    egui::Rect::from_min_size(rect.min + caret.min.to_vec2(), egui::vec2(1.5, rect.height())),
                    0.0,
                    egui::Color32::BLACK,
                );
            }

            let offset_at = |pos: egui::Pos2| tb.start + galley.cursor_from_pos(pos - rect.min).ccursor.index.min(tb.len);
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let at = offset_at(pos);
                    if ui.input(|i| i.modifiers.command) {
                        if let Some(href) = self.post.click_autolink(at) {
                            self.notice = Some(format!("Open {href}"));
                        }
                    } else {
                        self.post.set_selection(Selection::collapsed(at));
                    }
                }
            }
            if response.dragged() {
                if let (Some(origin), Some(pos)) = (ui.input(|i| i.pointer.press_origin()), response.interact_pointer_pos()) {
                    if rect.contains(origin) {
                        self.post.set_selection(Selection::range(offset_at(origin), offset_at(pos)));
                    }
                }
            }
        }
    }
}

fn mime_for(path: &Path) -> String {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn parse_hex(hex: &str) -> Option<egui::Color32> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(egui::Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

impl App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_input(ctx);

        let full_screen = self.post.ui().is_full_screen;
        if ctx.input(|i| i.viewport().fullscreen) != Some(full_screen) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(full_screen));
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let status = self.post.status();
            ui.horizontal(|ui| {
                ui.label(format!("{} words", status.words));
                ui.separator();
                ui.label(format!("{} characters", status.characters));
                if let Some(at) = status.last_change {
                    ui.separator();
                    ui.label(format!("Last change {}", at.format("%H:%M:%S")));
                }
                if let Some(notice) = &self.notice {
                    ui.separator();
                    ui.label(notice);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(html) = self.post.preview_html() {
                    ui.label(egui::RichText::new("Preview").strong());
                    ui.label(html);
                } else {
                    self.document(ui);
                }
            });
        });

        self.dialogs(ctx);
    }
}
