use crate::{LinkAttrs, Mark, MarkKind, NodeType, Selection, TextAlign};

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    InsertText(String),
    InsertContent(String),
    SetContent(String),
    DeleteBackward,
    DeleteSelection,
    SplitBlock,
    SetMark(Mark),
    UnsetMark(MarkKind),
    ToggleMark(Mark),
    UnsetAllMarks,
    SetParagraph,
    ToggleHeading(u8),
    ToggleBulletList,
    ToggleOrderedList,
    ToggleTaskList,
    ToggleTaskItem,
    SinkListItem,
    LiftListItem,
    ToggleBlockquote,
    ToggleCodeBlock { language: Option<String> },
    SetCodeBlockLanguage(Option<String>),
    SetTextAlign(TextAlign),
    UnsetTextAlign,
    SetHorizontalRule,
    SetLink { attrs: LinkAttrs, text: Option<String> },
    UnsetLink,
    SetImage { src: String, alt: Option<String> },
    InsertTable { rows: usize, cols: usize, with_header_row: bool },
    AddRowBefore,
    AddRowAfter,
    DeleteRow,
    AddColumnBefore,
    AddColumnAfter,
    DeleteColumn,
    DeleteTable,
    ClearFormatting,
    Undo,
    Redo,
}

/// Active-state queries mirrored by the toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Mark(MarkKind),
    MarkWith(Mark),
    Node(NodeType),
    Heading(u8),
    CodeLanguage(String),
    Align(TextAlign),
}

impl From<MarkKind> for Query {
    fn from(kind: MarkKind) -> Self {
        Query::Mark(kind)
    }
}

impl From<NodeType> for Query {
    fn from(node: NodeType) -> Self {
        Query::Node(node)
    }
}

/// Mutation surface handed to toolbar controls and integrations.
pub trait DocumentCommands {
    /// Applies a command; returns true when it was committed.
    fn execute(&mut self, cmd: EditorCommand) -> bool;
    fn set_selection(&mut self, selection: Selection);

    fn toggle_mark(&mut self, mark: Mark) -> bool {
        self.execute(EditorCommand::ToggleMark(mark))
    }

    fn set_link(&mut self, attrs: LinkAttrs, text: Option<String>) -> bool {
        self.execute(EditorCommand::SetLink { attrs, text })
    }

    fn set_image(&mut self, src: &str, alt: Option<&str>) -> bool {
        self.execute(EditorCommand::SetImage { src: src.to_string(), alt: alt.map(str::to_string) })
    }

    fn insert_table(&mut self, rows: usize, cols: usize, with_header_row: bool) -> bool {
        self.execute(EditorCommand::InsertTable { rows, cols, with_header_row })
    }

    fn set_font_size(&mut self, size: &str) -> bool {
        self.execute(EditorCommand::SetMark(Mark::font_size(size)))
    }

    fn unset_font_size(&mut self) -> bool {
        self.execute(EditorCommand::UnsetMark(MarkKind::FontSize))
    }

    fn undo(&mut self) -> bool {
        self.execute(EditorCommand::Undo)
    }

    fn redo(&mut self) -> bool {
        self.execute(EditorCommand::Redo)
    }
}

/// Read-only view of the editor state.
pub trait DocumentQuery {
    fn is_active(&self, query: &Query) -> bool;
    fn get_attributes(&self, kind: MarkKind) -> Option<Mark>;
    fn font_size(&self) -> String;
    fn heading_level(&self) -> Option<u8>;
    fn code_block_language(&self) -> Option<String>;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn is_editable(&self) -> bool;
}
