use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub type SharedStr = Arc<str>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub version: u64,
    pub updated_at: i64,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// Block-level node. Containers keep their children in `children`; textblocks
/// (paragraph, heading, code block) keep inline runs in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        id: Uuid,
        #[serde(default)]
        align: Option<TextAlign>,
        content: Vec<Inline>,
    },
    Heading {
        id: Uuid,
        level: u8,
        #[serde(default)]
        align: Option<TextAlign>,
        content: Vec<Inline>,
    },
    CodeBlock {
        id: Uuid,
        #[serde(default)]
        language: Option<SharedStr>,
        content: Vec<Inline>,
    },
    Blockquote {
        id: Uuid,
        children: Vec<Block>,
    },
    BulletList {
        id: Uuid,
        children: Vec<Block>,
    },
    OrderedList {
        id: Uuid,
        start: u32,
        children: Vec<Block>,
    },
    TaskList {
        id: Uuid,
        children: Vec<Block>,
    },
    ListItem {
        id: Uuid,
        children: Vec<Block>,
    },
    TaskItem {
        id: Uuid,
        checked: bool,
        children: Vec<Block>,
    },
    Table {
        id: Uuid,
        children: Vec<Block>,
    },
    TableRow {
        id: Uuid,
        children: Vec<Block>,
    },
    TableCell {
        id: Uuid,
        header: bool,
        colspan: u32,
        rowspan: u32,
        children: Vec<Block>,
    },
    HorizontalRule {
        id: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Paragraph,
    Heading,
    CodeBlock,
    Blockquote,
    BulletList,
    OrderedList,
    TaskList,
    ListItem,
    TaskItem,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    HorizontalRule,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text {
        value: SharedStr,
        #[serde(default, skip_serializing_if = "Marks::is_empty")]
        marks: Marks,
    },
    Image {
        src: SharedStr,
        #[serde(default)]
        alt: Option<SharedStr>,
        #[serde(default)]
        title: Option<SharedStr>,
    },
    HardBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: SharedStr,
    #[serde(default)]
    pub target: Option<SharedStr>,
    #[serde(default)]
    pub rel: Option<SharedStr>,
}

pub const DEFAULT_LINK_REL: &str = "noopener noreferrer nofollow";

impl LinkAttrs {
    pub fn new(href: impl Into<String>, target: Option<&str>) -> Self {
        let target = target.map(str::trim).filter(|t| !t.is_empty());
        Self {
            href: Arc::from(href.into()),
            target: target.map(Arc::from),
            rel: Some(Arc::from(DEFAULT_LINK_REL)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub color: Option<SharedStr>,
}

/// Inline marks carried by a text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub subscript: bool,
    pub superscript: bool,
    pub code: bool,
    pub link: Option<LinkAttrs>,
    pub highlight: Option<Highlight>,
    pub color: Option<SharedStr>,
    pub font_family: Option<SharedStr>,
    pub font_size: Option<SharedStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Code,
    Link,
    Highlight,
    Color,
    FontFamily,
    FontSize,
}

impl MarkKind {
    pub const ALL: [MarkKind; 12] = [
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Underline,
        MarkKind::Strike,
        MarkKind::Subscript,
        MarkKind::Superscript,
        MarkKind::Code,
        MarkKind::Link,
        MarkKind::Highlight,
        MarkKind::Color,
        MarkKind::FontFamily,
        MarkKind::FontSize,
    ];
}

/// A single mark with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Code,
    Link(LinkAttrs),
    Highlight(Highlight),
    Color { value: SharedStr },
    FontFamily { value: SharedStr },
    FontSize { value: SharedStr },
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Underline => MarkKind::Underline,
            Mark::Strike => MarkKind::Strike,
            Mark::Subscript => MarkKind::Subscript,
            Mark::Superscript => MarkKind::Superscript,
            Mark::Code => MarkKind::Code,
            Mark::Link(_) => MarkKind::Link,
            Mark::Highlight(_) => MarkKind::Highlight,
            Mark::Color { .. } => MarkKind::Color,
            Mark::FontFamily { .. } => MarkKind::FontFamily,
            Mark::FontSize { .. } => MarkKind::FontSize,
        }
    }

    pub fn color(value: &str) -> Self {
        Mark::Color { value: Arc::from(value) }
    }

    pub fn font_family(value: &str) -> Self {
        Mark::FontFamily { value: Arc::from(value) }
    }

    pub fn font_size(value: &str) -> Self {
        Mark::FontSize { value: Arc::from(value) }
    }
}

impl Marks {
    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }

    pub fn has_kind(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
            MarkKind::Strike => self.strike,
            MarkKind::Subscript => self.subscript,
            MarkKind::Superscript => self.superscript,
            MarkKind::Code => self.code,
            MarkKind::Link => self.link.is_some(),
            MarkKind::Highlight => self.highlight.is_some(),
            MarkKind::Color => self.color.is_some(),
            MarkKind::FontFamily => self.font_family.is_some(),
            MarkKind::FontSize => self.font_size.is_some(),
        }
    }

    /// Exact match: kind and attributes.
    pub fn has(&self, mark: &Mark) -> bool {
        self.get(mark.kind()).as_ref() == Some(mark)
    }

    pub fn get(&self, kind: MarkKind) -> Option<Mark> {
        if !self.has_kind(kind) {
            return None;
        }
        Some(match kind {
            MarkKind::Bold => Mark::Bold,
            MarkKind::Italic => Mark::Italic,
            MarkKind::Underline => Mark::Underline,
            MarkKind::Strike => Mark::Strike,
            MarkKind::Subscript => Mark::Subscript,
            MarkKind::Superscript => Mark::Superscript,
            MarkKind::Code => Mark::Code,
            MarkKind::Link => Mark::Link(self.link.clone()?),
            MarkKind::Highlight => Mark::Highlight(self.highlight.clone()?),
            MarkKind::Color => Mark::Color { value: self.color.clone()? },
            MarkKind::FontFamily => Mark::FontFamily { value: self.font_family.clone()? },
            MarkKind::FontSize => Mark::FontSize { value: self.font_size.clone()? },
        })
    }

    pub fn add(&mut self, mark: Mark) {
        match mark {
            Mark::Bold => self.bold = true,
            Mark::Italic => self.italic = true,
            Mark::Underline => self.underline = true,
            Mark::Strike => self.strike = true,
            Mark::Subscript => {
                self.subscript = true;
                self.superscript = false;
            }
            Mark::Superscript => {
                self.superscript = true;
                self.subscript = false;
            }
            Mark::Code => self.code = true,
            Mark::Link(attrs) => self.link = Some(attrs),
            Mark::Highlight(h) => self.highlight = Some(h),
            Mark::Color { value } => self.color = Some(value),
            Mark::FontFamily { value } => self.font_family = Some(value),
            Mark::FontSize { value } => self.font_size = Some(value),
        }
    }

    pub fn remove(&mut self, kind: MarkKind) {
        match kind {
            MarkKind::Bold => self.bold = false,
            MarkKind::Italic => self.italic = false,
            MarkKind::Underline => self.underline = false,
            MarkKind::Strike => self.strike = false,
            MarkKind::Subscript => self.subscript = false,
            MarkKind::Superscript => self.superscript = false,
            MarkKind::Code => self.code = false,
            MarkKind::Link => self.link = None,
            MarkKind::Highlight => self.highlight = None,
            MarkKind::Color => self.color = None,
            MarkKind::FontFamily => self.font_family = None,
            MarkKind::FontSize => self.font_size = None,
        }
    }

    pub fn has_text_style(&self) -> bool {
        self.color.is_some() || self.font_family.is_some() || self.font_size.is_some()
    }
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Inline::Text { value: Arc::from(value.into()), marks: Marks::default() }
    }

    pub fn styled(value: impl Into<String>, marks: Marks) -> Self {
        Inline::Text { value: Arc::from(value.into()), marks }
    }

    pub fn image(src: &str, alt: Option<&str>) -> Self {
        Inline::Image {
            src: Arc::from(src),
            alt: alt.filter(|a| !a.is_empty()).map(Arc::from),
            title: None,
        }
    }
}

/// Location of a textblock inside the tree plus its span in the flat
/// position space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextblockRef {
    pub path: Vec<usize>,
    pub start: usize,
    pub len: usize,
}

impl TextblockRef {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 1,
            updated_at: 0,
            blocks: vec![Block::empty_paragraph()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self::new();
        doc.blocks = blocks;
        doc.normalize();
        doc
    }

    pub fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.updated_at = chrono::Utc::now().timestamp();
    }

    /// Every textblock in document order.
    pub fn textblocks(&self) -> Vec<TextblockRef> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        let mut pos = 0usize;
        collect_textblocks(&self.blocks, &mut path, &mut pos, &mut out);
        out
    }

    /// Largest valid position.
    pub fn size(&self) -> usize {
        self.textblocks().last().map(|tb| tb.end()).unwrap_or(0)
    }

    /// Textblock containing `pos` and the offset inside it. Out-of-range
    /// positions resolve to the end of the last textblock.
    pub fn resolve(&self, pos: usize) -> Option<(TextblockRef, usize)> {
        let blocks = self.textblocks();
        for tb in &blocks {
            if pos <= tb.end() {
                let offset = pos.saturating_sub(tb.start);
                return Some((tb.clone(), offset));
            }
        }
        blocks.last().map(|tb| (tb.clone(), tb.len))
    }

    pub fn block_at(&self, path: &[usize]) -> Option<&Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.blocks.get(*first)?;
        for idx in rest {
            block = block.children()?.get(*idx)?;
        }
        Some(block)
    }

    pub fn block_at_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.blocks.get_mut(*first)?;
        for idx in rest {
            block = block.children_mut()?.get_mut(*idx)?;
        }
        Some(block)
    }

    /// Child list addressed by `parent`; the empty path is the document root.
    pub fn container_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Block>> {
        if parent.is_empty() {
            return Some(&mut self.blocks);
        }
        self.block_at_mut(parent)?.children_mut()
    }

    /// Ancestors of the node at `path`, outermost first, paired with their paths.
    pub fn ancestors(&self, path: &[usize]) -> Vec<(Vec<usize>, &Block)> {
        let mut out = Vec::new();
        for depth in 1..path.len() {
            let prefix = &path[..depth];
            if let Some(block) = self.block_at(prefix) {
                out.push((prefix.to_vec(), block));
            }
        }
        out
    }

    /// Start position of the first textblock at or after `path` in document order.
    pub fn position_at_or_after(&self, path: &[usize]) -> usize {
        let blocks = self.textblocks();
        blocks
            .iter()
            .find(|tb| tb.path.as_slice() >= path)
            .or_else(|| blocks.last())
            .map(|tb| if tb.path.as_slice() >= path { tb.start } else { tb.end() })
            .unwrap_or(0)
    }

    pub fn plain_text(&self) -> String {
        let mut parts = Vec::new();
        for tb in self.textblocks() {
            if let Some(content) = self.block_at(&tb.path).and_then(Block::inline_content) {
                parts.push(crate::plain_text(content));
            }
        }
        parts.join("\n")
    }

    pub fn character_count(&self) -> usize {
        self.textblocks()
            .iter()
            .filter_map(|tb| self.block_at(&tb.path).and_then(Block::inline_content))
            .map(|content| {
                content
                    .iter()
                    .map(|inline| match inline {
                        Inline::Text { value, .. } => value.chars().count(),
                        _ => 0,
                    })
                    .sum::<usize>()
            })
            .sum()
    }

    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }

    /// Restores structural invariants after a transform.
    pub fn normalize(&mut self) {
        normalize_children(&mut self.blocks, ContainerKind::Root);
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
    }
}

fn collect_textblocks(blocks: &[Block], path: &mut Vec<usize>, pos: &mut usize, out: &mut Vec<TextblockRef>) {
    for (idx, block) in blocks.iter().enumerate() {
        path.push(idx);
        if let Some(content) = block.inline_content() {
            let len = crate::content_len(content);
            out.push(TextblockRef { path: path.clone(), start: *pos, len });
            *pos += len + 1;
        } else if let Some(children) = block.children() {
            collect_textblocks(children, path, pos, out);
        }
        path.pop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Root,
    Blocks,
    List { task: bool },
    Table,
    Row { header: bool },
}

fn normalize_children(children: &mut Vec<Block>, kind: ContainerKind) {
    let mut out = Vec::with_capacity(children.len());
    for mut block in children.drain(..) {
        match &mut block {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::CodeBlock { content, .. } => crate::normalize_content(content),
            _ => {}
        }
        let inner = match &block {
            Block::Blockquote { .. } | Block::ListItem { .. } | Block::TaskItem { .. } | Block::TableCell { .. } => {
                Some(ContainerKind::Blocks)
            }
            Block::BulletList { .. } | Block::OrderedList { .. } => Some(ContainerKind::List { task: false }),
            Block::TaskList { .. } => Some(ContainerKind::List { task: true }),
            Block::Table { .. } => Some(ContainerKind::Table),
            Block::TableRow { children, .. } => {
                let header = children
                    .first()
                    .map(|c| matches!(c, Block::TableCell { header: true, .. }))
                    .unwrap_or(false);
                Some(ContainerKind::Row { header })
            }
            _ => None,
        };
        if let (Some(inner), Some(grand)) = (inner, block.children_mut()) {
            normalize_children(grand, inner);
            if grand.is_empty() {
                match inner {
                    ContainerKind::Blocks => grand.push(Block::empty_paragraph()),
                    _ => continue,
                }
            }
        }
        let block = match (kind, block) {
            (ContainerKind::List { task: false }, b @ Block::ListItem { .. }) => b,
            (ContainerKind::List { task: true }, b @ Block::TaskItem { .. }) => b,
            (ContainerKind::List { task: false }, Block::TaskItem { id, children, .. }) => Block::ListItem { id, children },
            (ContainerKind::List { task: true }, Block::ListItem { id, children }) => {
                Block::TaskItem { id, checked: false, children }
            }
            (ContainerKind::List { task }, other) => {
                if task {
                    Block::TaskItem { id: Uuid::new_v4(), checked: false, children: vec![other] }
                } else {
                    Block::ListItem { id: Uuid::new_v4(), children: vec![other] }
                }
            }
            (ContainerKind::Table, b @ Block::TableRow { .. }) => b,
            (ContainerKind::Table, other) => Block::TableRow {
                id: Uuid::new_v4(),
                children: vec![Block::table_cell(false, vec![other])],
            },
            (ContainerKind::Row { .. }, b @ Block::TableCell { .. }) => b,
            (ContainerKind::Row { header }, other) => Block::table_cell(header, vec![other]),
            (_, b) => b,
        };
        out.push(block);
    }
    *children = out;
}

impl Block {
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph { id: Uuid::new_v4(), align: None, content }
    }

    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Block::Heading { id: Uuid::new_v4(), level: level.clamp(1, 6), align: None, content }
    }

    pub fn code_block(language: Option<&str>, code: &str) -> Self {
        let content = if code.is_empty() { Vec::new() } else { vec![Inline::text(code)] };
        Block::CodeBlock {
            id: Uuid::new_v4(),
            language: language.filter(|l| !l.is_empty()).map(Arc::from),
            content,
        }
    }

    pub fn list_item(children: Vec<Block>) -> Self {
        Block::ListItem { id: Uuid::new_v4(), children }
    }

    pub fn task_item(checked: bool, children: Vec<Block>) -> Self {
        Block::TaskItem { id: Uuid::new_v4(), checked, children }
    }

    pub fn table_cell(header: bool, children: Vec<Block>) -> Self {
        Block::TableCell { id: Uuid::new_v4(), header, colspan: 1, rowspan: 1, children }
    }

    pub fn horizontal_rule() -> Self {
        Block::HorizontalRule { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Block::Paragraph { id, .. }
            | Block::Heading { id, .. }
            | Block::CodeBlock { id, .. }
            | Block::Blockquote { id, .. }
            | Block::BulletList { id, .. }
            | Block::OrderedList { id, .. }
            | Block::TaskList { id, .. }
            | Block::ListItem { id, .. }
            | Block::TaskItem { id, .. }
            | Block::Table { id, .. }
            | Block::TableRow { id, .. }
            | Block::TableCell { id, .. }
            | Block::HorizontalRule { id } => *id,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Block::Paragraph { .. } => NodeType::Paragraph,
            Block::Heading { .. } => NodeType::Heading,
            Block::CodeBlock { .. } => NodeType::CodeBlock,
            Block::Blockquote { .. } => NodeType::Blockquote,
            Block::BulletList { .. } => NodeType::BulletList,
            Block::OrderedList { .. } => NodeType::OrderedList,
            Block::TaskList { .. } => NodeType::TaskList,
            Block::ListItem { .. } => NodeType::ListItem,
            Block::TaskItem { .. } => NodeType::TaskItem,
            Block::Table { .. } => NodeType::Table,
            Block::TableRow { .. } => NodeType::TableRow,
            Block::TableCell { header: true, .. } => NodeType::TableHeader,
            Block::TableCell { .. } => NodeType::TableCell,
            Block::HorizontalRule { .. } => NodeType::HorizontalRule,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.inline_content().is_some()
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Block::BulletList { .. } | Block::OrderedList { .. } | Block::TaskList { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::ListItem { .. } | Block::TaskItem { .. })
    }

    pub fn inline_content(&self) -> Option<&Vec<Inline>> {
        match self {
            Block::Paragraph { content, .. } | Block::Heading { content, .. } | Block::CodeBlock { content, .. } => {
                Some(content)
            }
            _ => None,
        }
    }

    pub fn inline_content_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Block::Paragraph { content, .. } | Block::Heading { content, .. } | Block::CodeBlock { content, .. } => {
                Some(content)
            }
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Block>> {
        match self {
            Block::Blockquote { children, .. }
            | Block::BulletList { children, .. }
            | Block::OrderedList { children, .. }
            | Block::TaskList { children, .. }
            | Block::ListItem { children, .. }
            | Block::TaskItem { children, .. }
            | Block::Table { children, .. }
            | Block::TableRow { children, .. }
            | Block::TableCell { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::Blockquote { children, .. }
            | Block::BulletList { children, .. }
            | Block::OrderedList { children, .. }
            | Block::TaskList { children, .. }
            | Block::ListItem { children, .. }
            | Block::TaskItem { children, .. }
            | Block::Table { children, .. }
            | Block::TableRow { children, .. }
            | Block::TableCell { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn into_children(self) -> Vec<Block> {
        match self {
            Block::Blockquote { children, .. }
            | Block::BulletList { children, .. }
            | Block::OrderedList { children, .. }
            | Block::TaskList { children, .. }
            | Block::ListItem { children, .. }
            | Block::TaskItem { children, .. }
            | Block::Table { children, .. }
            | Block::TableRow { children, .. }
            | Block::TableCell { children, .. } => children,
            other => vec![other],
        }
    }

    pub fn align(&self) -> Option<TextAlign> {
        match self {
            Block::Paragraph { align, .. } | Block::Heading { align, .. } => *align,
            _ => None,
        }
    }
}
