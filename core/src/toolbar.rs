use crate::{
    normalize_font_size, DocumentCommands, DocumentQuery, EditorCommand, EditorMode, EditorUiState,
    Highlight, Mark, MarkKind, NodeType, Query, TextAlign,
};
use std::sync::Arc;

pub const CODE_LANGUAGES: [(&str, &str); 16] = [
    ("Plain text", ""),
    ("JavaScript", "javascript"),
    ("TypeScript", "typescript"),
    ("Python", "python"),
    ("Rust", "rust"),
    ("Go", "go"),
    ("Java", "java"),
    ("C", "c"),
    ("C++", "cpp"),
    ("C#", "csharp"),
    ("HTML", "html"),
    ("CSS", "css"),
    ("JSON", "json"),
    ("Bash", "bash"),
    ("SQL", "sql"),
    ("YAML", "yaml"),
];

pub const TEXT_COLORS: [(&str, &str); 10] = [
    ("Black", "#000000"),
    ("Gray", "#6b7280"),
    ("Red", "#ef4444"),
    ("Orange", "#f97316"),
    ("Yellow", "#eab308"),
    ("Green", "#22c55e"),
    ("Teal", "#14b8a6"),
    ("Blue", "#3b82f6"),
    ("Purple", "#a855f7"),
    ("Pink", "#ec4899"),
];

pub const HIGHLIGHT_COLORS: [(&str, &str); 6] = [
    ("Yellow", "#fef08a"),
    ("Green", "#bbf7d0"),
    ("Blue", "#bfdbfe"),
    ("Pink", "#fbcfe8"),
    ("Purple", "#e9d5ff"),
    ("Orange", "#fed7aa"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorChoice {
    Color(String),
    Remove,
}

/// Everything a toolbar control can ask for. Dialog, preview and full screen
/// actions are handled by the container; the rest map to one command.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    Undo,
    Redo,
    ToggleMark(MarkKind),
    Paragraph,
    Heading(u8),
    BulletList,
    OrderedList,
    TaskList,
    SinkListItem,
    LiftListItem,
    Blockquote,
    CodeBlock,
    CodeLanguage(Option<String>),
    Align(TextAlign),
    FontFamily(Option<String>),
    FontSize(Option<String>),
    TextColor(ColorChoice),
    Highlight(ColorChoice),
    HorizontalRule,
    Unlink,
    ClearFormatting,
    AddRowBefore,
    AddRowAfter,
    DeleteRow,
    AddColumnBefore,
    AddColumnAfter,
    DeleteColumn,
    DeleteTable,
    OpenLinkDialog,
    OpenImageDialog,
    OpenTableDialog,
    TogglePreview,
    ToggleFullScreen,
}

impl ToolbarAction {
    pub fn command(&self) -> Option<EditorCommand> {
        let cmd = match self {
            ToolbarAction::Undo => EditorCommand::Undo,
            ToolbarAction::Redo => EditorCommand::Redo,
            ToolbarAction::ToggleMark(kind) => EditorCommand::ToggleMark(simple_mark(*kind)?),
            ToolbarAction::Paragraph => EditorCommand::SetParagraph,
            ToolbarAction::Heading(level) => EditorCommand::ToggleHeading(*level),
            ToolbarAction::BulletList => EditorCommand::ToggleBulletList,
            ToolbarAction::OrderedList => EditorCommand::ToggleOrderedList,
            ToolbarAction::TaskList => EditorCommand::ToggleTaskList,
            ToolbarAction::SinkListItem => EditorCommand::SinkListItem,
            ToolbarAction::LiftListItem => EditorCommand::LiftListItem,
            ToolbarAction::Blockquote => EditorCommand::ToggleBlockquote,
            ToolbarAction::CodeBlock => EditorCommand::ToggleCodeBlock { language: None },
            ToolbarAction::CodeLanguage(language) => {
                EditorCommand::SetCodeBlockLanguage(language.clone().filter(|l| !l.is_empty()))
            }
            ToolbarAction::Align(align) => EditorCommand::SetTextAlign(*align),
            ToolbarAction::FontFamily(Some(family)) if !family.is_empty() => {
                EditorCommand::SetMark(Mark::font_family(family))
            }
            ToolbarAction::FontFamily(_) => EditorCommand::UnsetMark(MarkKind::FontFamily),
            ToolbarAction::FontSize(Some(size)) => match normalize_font_size(size) {
                Some(size) => EditorCommand::SetMark(Mark::font_size(&size)),
                None => EditorCommand::UnsetMark(MarkKind::FontSize),
            },
            ToolbarAction::FontSize(None) => EditorCommand::UnsetMark(MarkKind::FontSize),
            ToolbarAction::TextColor(ColorChoice::Color(color)) => EditorCommand::SetMark(Mark::color(color)),
            ToolbarAction::TextColor(ColorChoice::Remove) => EditorCommand::UnsetMark(MarkKind::Color),
            ToolbarAction::Highlight(ColorChoice::Color(color)) => {
                EditorCommand::SetMark(Mark::Highlight(Highlight { color: Some(Arc::from(color.as_str())) }))
            }
            ToolbarAction::Highlight(ColorChoice::Remove) => EditorCommand::UnsetMark(MarkKind::Highlight),
            ToolbarAction::HorizontalRule => EditorCommand::SetHorizontalRule,
            ToolbarAction::Unlink => EditorCommand::UnsetLink,
            ToolbarAction::ClearFormatting => EditorCommand::ClearFormatting,
            ToolbarAction::AddRowBefore => EditorCommand::AddRowBefore,
            ToolbarAction::AddRowAfter => EditorCommand::AddRowAfter,
            ToolbarAction::DeleteRow => EditorCommand::DeleteRow,
            ToolbarAction::AddColumnBefore => EditorCommand::AddColumnBefore,
            ToolbarAction::AddColumnAfter => EditorCommand::AddColumnAfter,
            ToolbarAction::DeleteColumn => EditorCommand::DeleteColumn,
            ToolbarAction::DeleteTable => EditorCommand::DeleteTable,
            ToolbarAction::OpenLinkDialog
            | ToolbarAction::OpenImageDialog
            | ToolbarAction::OpenTableDialog
            | ToolbarAction::TogglePreview
            | ToolbarAction::ToggleFullScreen => return None,
        };
        Some(cmd)
    }

    pub fn is_table_control(&self) -> bool {
        matches!(
            self,
            ToolbarAction::AddRowBefore
                | ToolbarAction::AddRowAfter
                | ToolbarAction::DeleteRow
                | ToolbarAction::AddColumnBefore
                | ToolbarAction::AddColumnAfter
                | ToolbarAction::DeleteColumn
                | ToolbarAction::DeleteTable
        )
    }
}

fn simple_mark(kind: MarkKind) -> Option<Mark> {
    Some(match kind {
        MarkKind::Bold => Mark::Bold,
        MarkKind::Italic => Mark::Italic,
        MarkKind::Underline => Mark::Underline,
        MarkKind::Strike => Mark::Strike,
        MarkKind::Subscript => Mark::Subscript,
        MarkKind::Superscript => Mark::Superscript,
        MarkKind::Code => Mark::Code,
        _ => return None,
    })
}

/// Runs the command behind a toolbar action. Returns false for container
/// actions and for commands that changed nothing.
pub fn dispatch<E: DocumentCommands + ?Sized>(editor: &mut E, action: &ToolbarAction) -> bool {
    match action.command() {
        Some(cmd) => editor.execute(cmd),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonVariant {
    #[default]
    Ghost,
    Active,
    Danger,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub active: bool,
    pub disabled: bool,
    pub variant: ButtonVariant,
}

/// Snapshot of every control, rebuilt from the editor after each change.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarState {
    pub preview: bool,
    pub full_screen: bool,
    pub editable: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub active_marks: Vec<MarkKind>,
    pub heading_level: Option<u8>,
    pub bullet_list: bool,
    pub ordered_list: bool,
    pub task_list: bool,
    pub blockquote: bool,
    pub code_block: bool,
    pub align: Option<TextAlign>,
    pub font_family: Option<String>,
    pub font_size: String,
    pub text_color: Option<String>,
    pub highlight: Option<String>,
    pub link: bool,
    /// Present only while the caret is inside a code block.
    pub code_language: Option<String>,
    /// Row and column controls render only inside a table.
    pub in_table: bool,
}

impl ToolbarState {
    pub fn derive<Q: DocumentQuery + ?Sized>(editor: &Q, ui: &EditorUiState) -> Self {
        let preview = ui.mode == EditorMode::Preview;
        let active = |kind: MarkKind| editor.is_active(&Query::Mark(kind));
        let code_block = editor.is_active(&Query::Node(NodeType::CodeBlock));
        let align = [TextAlign::Left, TextAlign::Center, TextAlign::Right, TextAlign::Justify]
            .into_iter()
            .find(|a| editor.is_active(&Query::Align(*a)));
        Self {
            preview,
            full_screen: ui.is_full_screen,
            editable: editor.is_editable() && !preview,
            can_undo: editor.can_undo(),
            can_redo: editor.can_redo(),
            active_marks: MarkKind::ALL.into_iter().filter(|k| active(*k)).collect(),
            heading_level: editor.heading_level(),
            bullet_list: editor.is_active(&Query::Node(NodeType::BulletList)),
            ordered_list: editor.is_active(&Query::Node(NodeType::OrderedList)),
            task_list: editor.is_active(&Query::Node(NodeType::TaskList)),
            blockquote: editor.is_active(&Query::Node(NodeType::Blockquote)),
            code_block,
            align,
            font_family: match editor.get_attributes(MarkKind::FontFamily) {
                Some(Mark::FontFamily { value }) => Some(value.to_string()),
                _ => None,
            },
            font_size: editor.font_size(),
            text_color: match editor.get_attributes(MarkKind::Color) {
                Some(Mark::Color { value }) => Some(value.to_string()),
                _ => None,
            },
            highlight: match editor.get_attributes(MarkKind::Highlight) {
                Some(Mark::Highlight(h)) => Some(h.color.as_deref().unwrap_or("#fef08a").to_string()),
                _ => None,
            },
            link: active(MarkKind::Link),
            code_language: if code_block { editor.code_block_language() } else { None },
            in_table: editor.is_active(&Query::Node(NodeType::Table)),
        }
    }

    pub fn is_visible(&self, action: &ToolbarAction) -> bool {
        match action {
            ToolbarAction::CodeLanguage(_) => self.code_language.is_some(),
            action if action.is_table_control() => self.in_table,
            ToolbarAction::Unlink => self.link,
            _ => true,
        }
    }

    pub fn button(&self, action: &ToolbarAction) -> ButtonState {
        let active = match action {
            ToolbarAction::ToggleMark(kind) => self.active_marks.contains(kind),
            ToolbarAction::Paragraph => self.heading_level.is_none() && !self.code_block,
            ToolbarAction::Heading(level) => self.heading_level == Some(*level),
            ToolbarAction::BulletList => self.bullet_list,
            ToolbarAction::OrderedList => self.ordered_list,
            ToolbarAction::TaskList => self.task_list,
            ToolbarAction::Blockquote => self.blockquote,
            ToolbarAction::CodeBlock => self.code_block,
            ToolbarAction::Align(align) => self.align == Some(*align),
            ToolbarAction::OpenLinkDialog => self.link,
            ToolbarAction::TogglePreview => self.preview,
            ToolbarAction::ToggleFullScreen => self.full_screen,
            _ => false,
        };
        let disabled = match action {
            ToolbarAction::TogglePreview | ToolbarAction::ToggleFullScreen => false,
            _ if !self.editable => true,
            ToolbarAction::Undo => !self.can_undo,
            ToolbarAction::Redo => !self.can_redo,
            ToolbarAction::OpenLinkDialog | ToolbarAction::ToggleMark(MarkKind::Link) if self.code_block => true,
            _ => !self.is_visible(action),
        };
        let variant = if matches!(action, ToolbarAction::DeleteTable) {
            ButtonVariant::Danger
        } else if active {
            ButtonVariant::Active
        } else {
            ButtonVariant::Ghost
        };
        ButtonState { active, disabled, variant }
    }
}

/// Open/closed state of a dropdown menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dropdown {
    open: bool,
}

impl Dropdown {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Pointer press anywhere; closes unless it landed inside the menu.
    pub fn pointer_down(&mut self, inside: bool) {
        if !inside {
            self.open = false;
        }
    }

    /// Picking an entry closes the menu and passes the entry through.
    pub fn select<T>(&mut self, item: T) -> T {
        self.open = false;
        item
    }
}

pub fn is_css_color(raw: &str) -> bool {
    cached_regex!(r"^(#[0-9A-Fa-f]{3}|#[0-9A-Fa-f]{4}|#[0-9A-Fa-f]{6}|#[0-9A-Fa-f]{8}|rgba?\([0-9.,%\s]+\)|hsla?\([0-9.,%\sdeg]+\)|[A-Za-z]+)$")
        .is_some_and(|re| re.is_match(raw.trim()))
}

/// Palette dropdown with a free-form color field and a remove entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPicker {
    palette: &'static [(&'static str, &'static str)],
    custom: String,
    dropdown: Dropdown,
}

impl ColorPicker {
    pub fn text_color() -> Self {
        Self::new(&TEXT_COLORS)
    }

    pub fn highlight() -> Self {
        Self::new(&HIGHLIGHT_COLORS)
    }

    pub fn new(palette: &'static [(&'static str, &'static str)]) -> Self {
        Self { palette, custom: String::new(), dropdown: Dropdown::default() }
    }

    pub fn palette(&self) -> &'static [(&'static str, &'static str)] {
        self.palette
    }

    pub fn dropdown(&mut self) -> &mut Dropdown {
        &mut self.dropdown
    }

    pub fn is_open(&self) -> bool {
        self.dropdown.is_open()
    }

    pub fn pick(&mut self, index: usize) -> Option<ColorChoice> {
        let (_, color) = self.palette.get(index)?;
        Some(self.dropdown.select(ColorChoice::Color((*color).to_string())))
    }

    pub fn set_custom(&mut self, raw: &str) {
        self.custom = raw.to_string();
    }

    pub fn apply_custom(&mut self) -> Option<ColorChoice> {
        let custom = self.custom.trim();
        if !is_css_color(custom) {
            return None;
        }
        Some(self.dropdown.select(ColorChoice::Color(custom.to_string())))
    }

    pub fn remove(&mut self) -> ColorChoice {
        self.dropdown.select(ColorChoice::Remove)
    }
}
