use crate::{
    active_code_language, active_heading_level, link_at_selection, query_active, selected_text, selection_attributes,
    selection_font_size, to_html, CommandHistory, Document, DocumentCommands, DocumentQuery, EditorCommand,
    EditorConfig, HistoryEntry, LinkAttrs, Mark, MarkKind, Marks, Query, Selection, Snapshot, Transaction,
    DEFAULT_FONT_SIZE,
};
use std::time::Duration;
use tracing::{debug, info};

pub type ChangeListener = Box<dyn FnMut(&str)>;

/// Owns the document tree; commands are the only way to mutate it.
pub struct Editor {
    doc: Document,
    selection: Selection,
    stored_marks: Option<Marks>,
    history: CommandHistory,
    editable: bool,
    default_font_size: String,
    on_change: Option<ChangeListener>,
}

impl Editor {
    pub fn new(doc: Document) -> Self {
        Self::with_parts(doc, &EditorConfig::default())
    }

    pub fn from_html(html: &str) -> Self {
        Self::new(Document::from_blocks(crate::parse_html(html)))
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        let doc = Document::from_blocks(crate::parse_html(&config.initial_content));
        Self::with_parts(doc, config)
    }

    fn with_parts(mut doc: Document, config: &EditorConfig) -> Self {
        doc.normalize();
        Self {
            doc,
            selection: Selection::collapsed(0),
            stored_marks: None,
            history: CommandHistory::new(config.history_depth, Duration::from_millis(config.typing_merge_ms)),
            editable: true,
            default_font_size: if config.default_font_size.is_empty() {
                DEFAULT_FONT_SIZE.to_string()
            } else {
                config.default_font_size.clone()
            },
            on_change: None,
        }
    }

    /// Registers the callback fired with the serialized HTML after every
    /// committed command.
    pub fn set_on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.on_change = Some(Box::new(listener));
    }

    pub fn clear_on_change(&mut self) {
        self.on_change = None;
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&Marks> {
        self.stored_marks.as_ref()
    }

    pub fn html(&self) -> String {
        to_html(&self.doc)
    }

    pub fn word_count(&self) -> usize {
        self.doc.word_count()
    }

    pub fn character_count(&self) -> usize {
        self.doc.character_count()
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn select_all(&mut self) {
        self.set_selection(Selection::range(0, self.doc.size()));
    }

    pub fn selected_text(&self) -> String {
        selected_text(&self.doc, self.selection)
    }

    pub fn link_at_selection(&self) -> Option<LinkAttrs> {
        link_at_selection(&self.doc, self.selection)
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot { doc: self.doc.clone(), selection: self.selection }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.doc.touch();
        self.selection = snapshot.selection.clamp(self.doc.size());
        self.stored_marks = None;
    }

    fn emit_change(&mut self) {
        if self.on_change.is_none() {
            return;
        }
        let html = to_html(&self.doc);
        if let Some(listener) = self.on_change.as_mut() {
            listener(&html);
        }
    }

    fn step_history(&mut self, undo: bool) -> bool {
        let current = self.snapshot();
        let target = if undo { self.history.undo(current) } else { self.history.redo(current) };
        let Some(snapshot) = target else { return false };
        self.restore(snapshot);
        debug!(undo, depth = self.history.undo_depth(), "history step");
        self.emit_change();
        true
    }

    fn commit(&mut self, cmd: EditorCommand) -> bool {
        let before = self.snapshot();
        let mut tx = Transaction::new(self.doc.clone(), self.selection, self.stored_marks.clone());
        tx.apply(&cmd);
        tx.doc.normalize();
        let selection = tx.selection.clamp(tx.doc.size());
        if tx.doc.blocks == self.doc.blocks {
            self.selection = selection;
            self.stored_marks = tx.stored_marks;
            return false;
        }
        match &cmd {
            EditorCommand::InsertText(_) if before.selection.is_collapsed() => {
                self.history.push_typing(before, selection);
            }
            EditorCommand::SetContent(_) => {
                info!("document content replaced");
                self.history.push_entry(HistoryEntry::Snapshot(before));
            }
            _ => self.history.push_entry(HistoryEntry::Snapshot(before)),
        }
        self.doc = tx.doc;
        self.doc.touch();
        self.selection = selection;
        self.stored_marks = None;
        debug!(?cmd, version = self.doc.version, "command committed");
        self.emit_change();
        true
    }
}

impl DocumentCommands for Editor {
    fn execute(&mut self, cmd: EditorCommand) -> bool {
        if !self.editable {
            debug!(?cmd, "editor is read-only, command ignored");
            return false;
        }
        match cmd {
            EditorCommand::Undo => self.step_history(true),
            EditorCommand::Redo => self.step_history(false),
            cmd => self.commit(cmd),
        }
    }

    fn set_selection(&mut self, selection: Selection) {
        let selection = selection.clamp(self.doc.size());
        if selection != self.selection {
            self.stored_marks = None;
        }
        self.selection = selection;
    }
}

impl DocumentQuery for Editor {
    fn is_active(&self, query: &Query) -> bool {
        query_active(&self.doc, self.selection, self.stored_marks.as_ref(), query)
    }

    fn get_attributes(&self, kind: MarkKind) -> Option<Mark> {
        selection_attributes(&self.doc, self.selection, self.stored_marks.as_ref(), kind)
    }

    fn font_size(&self) -> String {
        selection_font_size(&self.doc, self.selection, self.stored_marks.as_ref(), &self.default_font_size)
    }

    fn heading_level(&self) -> Option<u8> {
        active_heading_level(&self.doc, self.selection)
    }

    fn code_block_language(&self) -> Option<String> {
        active_code_language(&self.doc, self.selection)
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn is_editable(&self) -> bool {
        self.editable
    }
}
