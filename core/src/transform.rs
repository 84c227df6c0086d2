use crate::{
    code_text, content_len, delete_in_content, insert_in_content, mark_range, marks_at, normalize_href,
    parse_html, selection_marks, slice_content, split_content, textblocks_in_range, update_marks, Block, Document,
    EditorCommand, Inline, LinkAttrs, Mark, MarkKind, Marks, NodeType, Selection, TableEditor, TextAlign,
    TextblockRef, DEFAULT_LINK_REL,
};
use std::sync::Arc;
use uuid::Uuid;

/// Working copy a command is applied to before the editor commits it.
pub(crate) struct Transaction {
    pub doc: Document,
    pub selection: Selection,
    pub stored_marks: Option<Marks>,
}

pub(crate) fn split_path(path: &[usize]) -> (&[usize], usize) {
    match path.split_last() {
        Some((last, parent)) => (parent, *last),
        None => (&[], 0),
    }
}

fn join_path(parent: &[usize], idx: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(idx);
    path
}

/// Path of the closest ancestor of `path` matching `pred`.
pub(crate) fn nearest_ancestor<F>(doc: &Document, path: &[usize], pred: F) -> Option<Vec<usize>>
where
    F: Fn(&Block) -> bool,
{
    doc.ancestors(path)
        .into_iter()
        .rev()
        .find(|(_, block)| pred(block))
        .map(|(p, _)| p)
}

/// Same kind of block as `template` with fresh id and `content`.
fn with_content(template: &Block, content: Vec<Inline>) -> Block {
    match template {
        Block::Heading { level, align, .. } => Block::Heading { id: Uuid::new_v4(), level: *level, align: *align, content },
        Block::CodeBlock { language, .. } => Block::CodeBlock { id: Uuid::new_v4(), language: language.clone(), content },
        Block::Paragraph { align, .. } => Block::Paragraph { id: Uuid::new_v4(), align: *align, content },
        _ => Block::paragraph(content),
    }
}

/// Same kind of list as `template` holding `children`.
fn list_like(template: &Block, children: Vec<Block>) -> Block {
    match template {
        Block::OrderedList { start, .. } => Block::OrderedList { id: Uuid::new_v4(), start: *start, children },
        Block::TaskList { .. } => Block::TaskList { id: Uuid::new_v4(), children },
        _ => Block::BulletList { id: Uuid::new_v4(), children },
    }
}

fn new_list(kind: NodeType, children: Vec<Block>) -> Block {
    match kind {
        NodeType::OrderedList => Block::OrderedList { id: Uuid::new_v4(), start: 1, children },
        NodeType::TaskList => Block::TaskList { id: Uuid::new_v4(), children },
        _ => Block::BulletList { id: Uuid::new_v4(), children },
    }
}

fn to_paragraph(block: &Block) -> Option<Block> {
    match block {
        Block::Paragraph { .. } => None,
        Block::Heading { id, content, .. } => Some(Block::Paragraph { id: *id, align: None, content: content.clone() }),
        Block::CodeBlock { id, content, .. } => Some(Block::Paragraph { id: *id, align: None, content: content.clone() }),
        _ => None,
    }
}

fn to_heading(block: &Block, level: u8) -> Option<Block> {
    let level = level.clamp(1, 6);
    match block {
        Block::Paragraph { id, align, content } | Block::Heading { id, align, content, .. } => {
            Some(Block::Heading { id: *id, level, align: *align, content: content.clone() })
        }
        Block::CodeBlock { id, content, .. } => Some(Block::Heading { id: *id, level, align: None, content: content.clone() }),
        _ => None,
    }
}

fn to_code_block(block: &Block, language: Option<&str>) -> Option<Block> {
    let language = language.filter(|l| !l.is_empty()).map(Arc::from);
    match block {
        Block::Paragraph { id, content, .. } | Block::Heading { id, content, .. } => {
            Some(Block::CodeBlock { id: *id, language, content: code_text(content) })
        }
        Block::CodeBlock { id, content, .. } => Some(Block::CodeBlock { id: *id, language, content: content.clone() }),
        _ => None,
    }
}

fn remove_block(doc: &mut Document, path: &[usize]) -> Option<Block> {
    let (parent, idx) = split_path(path);
    let container = doc.container_mut(parent)?;
    if idx < container.len() {
        Some(container.remove(idx))
    } else {
        None
    }
}

/// Drops containers left without children.
fn prune_empty(children: &mut Vec<Block>) {
    children.retain_mut(|block| match block.children_mut() {
        Some(grand) => {
            prune_empty(grand);
            !grand.is_empty()
        }
        None => true,
    });
}

impl Transaction {
    pub fn new(doc: Document, selection: Selection, stored_marks: Option<Marks>) -> Self {
        let selection = selection.clamp(doc.size());
        Self { doc, selection, stored_marks }
    }

    pub fn apply(&mut self, cmd: &EditorCommand) {
        match cmd {
            EditorCommand::InsertText(text) => self.insert_text(text),
            EditorCommand::InsertContent(html) => self.insert_content(html),
            EditorCommand::SetContent(html) => self.set_content(html),
            EditorCommand::DeleteBackward => self.delete_backward(),
            EditorCommand::DeleteSelection => {
                self.delete_selection();
            }
            EditorCommand::SplitBlock => self.split_block(),
            EditorCommand::SetMark(mark) => self.set_mark(mark.clone()),
            EditorCommand::UnsetMark(MarkKind::Link) => self.unset_link(),
            EditorCommand::UnsetMark(kind) => self.unset_mark(*kind),
            EditorCommand::ToggleMark(mark) => self.toggle_mark(mark.clone()),
            EditorCommand::UnsetAllMarks => self.unset_all_marks(),
            EditorCommand::SetParagraph => self.set_textblock_type(to_paragraph),
            EditorCommand::ToggleHeading(level) => self.toggle_heading(*level),
            EditorCommand::ToggleBulletList => self.toggle_list(NodeType::BulletList),
            EditorCommand::ToggleOrderedList => self.toggle_list(NodeType::OrderedList),
            EditorCommand::ToggleTaskList => self.toggle_list(NodeType::TaskList),
            EditorCommand::ToggleTaskItem => self.toggle_task_item(),
            EditorCommand::SinkListItem => self.sink_list_item(),
            EditorCommand::LiftListItem => self.lift_list_item(),
            EditorCommand::ToggleBlockquote => self.toggle_blockquote(),
            EditorCommand::ToggleCodeBlock { language } => self.toggle_code_block(language.as_deref()),
            EditorCommand::SetCodeBlockLanguage(language) => self.set_code_block_language(language.as_deref()),
            EditorCommand::SetTextAlign(align) => self.set_text_align(Some(*align)),
            EditorCommand::UnsetTextAlign => self.set_text_align(None),
            EditorCommand::SetHorizontalRule => self.set_horizontal_rule(),
            EditorCommand::SetLink { attrs, text } => self.set_link(attrs, text.as_deref()),
            EditorCommand::UnsetLink => self.unset_link(),
            EditorCommand::SetImage { src, alt } => self.set_image(src, alt.as_deref()),
            EditorCommand::InsertTable { rows, cols, with_header_row } => {
                self.insert_table(*rows, *cols, *with_header_row)
            }
            EditorCommand::AddRowBefore => self.table_op(TableOp::AddRowBefore),
            EditorCommand::AddRowAfter => self.table_op(TableOp::AddRowAfter),
            EditorCommand::DeleteRow => self.table_op(TableOp::DeleteRow),
            EditorCommand::AddColumnBefore => self.table_op(TableOp::AddColumnBefore),
            EditorCommand::AddColumnAfter => self.table_op(TableOp::AddColumnAfter),
            EditorCommand::DeleteColumn => self.table_op(TableOp::DeleteColumn),
            EditorCommand::DeleteTable => self.delete_table(),
            EditorCommand::ClearFormatting => self.clear_formatting(),
            EditorCommand::Undo | EditorCommand::Redo => {}
        }
    }

    fn caret(&self) -> usize {
        self.selection.focus
    }

    fn from_tb(&self) -> Option<TextblockRef> {
        self.doc.resolve(self.selection.from()).map(|(tb, _)| tb)
    }

    pub fn current_marks(&self) -> Marks {
        selection_marks(&self.doc, self.selection, self.stored_marks.as_ref())
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    // ---- text ----

    fn insert_text(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if text.is_empty() {
            return;
        }
        self.delete_selection();
        let pos = self.caret();
        let Some((tb, offset)) = self.doc.resolve(pos) else { return };
        let stored = self.stored_marks.take();
        let Some(block) = self.doc.block_at_mut(&tb.path) else { return };
        let is_code = matches!(block, Block::CodeBlock { .. });
        let Some(content) = block.inline_content_mut() else { return };
        let mut items = Vec::new();
        if is_code {
            items.push(Inline::text(text));
        } else {
            let marks = stored.unwrap_or_else(|| marks_at(content, offset));
            for (idx, line) in text.split('\n').enumerate() {
                if idx > 0 {
                    items.push(Inline::HardBreak);
                }
                if !line.is_empty() {
                    items.push(Inline::styled(line, marks.clone()));
                }
            }
        }
        let len = content_len(&items);
        insert_in_content(content, offset, items);
        self.selection = Selection::collapsed(pos + len);
    }

    fn delete_selection(&mut self) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let (from, to) = (self.selection.from(), self.selection.to());
        self.delete_range(from, to);
        self.selection = Selection::collapsed(from);
        true
    }

    fn delete_range(&mut self, from: usize, to: usize) {
        let Some((a, a_off)) = self.doc.resolve(from) else { return };
        let Some((b, b_off)) = self.doc.resolve(to) else { return };
        if a.path == b.path {
            if let Some(content) = self.doc.block_at_mut(&a.path).and_then(Block::inline_content_mut) {
                delete_in_content(content, a_off, b_off);
            }
            return;
        }
        let tail = self
            .doc
            .block_at(&b.path)
            .and_then(Block::inline_content)
            .map(|c| slice_content(c, b_off, b.len))
            .unwrap_or_default();
        let doomed: Vec<Vec<usize>> = self
            .doc
            .textblocks()
            .into_iter()
            .filter(|tb| tb.start > a.start && tb.start <= b.start)
            .map(|tb| tb.path)
            .collect();
        if let Some(block) = self.doc.block_at_mut(&a.path) {
            let is_code = matches!(block, Block::CodeBlock { .. });
            if let Some(content) = block.inline_content_mut() {
                delete_in_content(content, a_off, a.len);
                let tail = if is_code { code_text(&tail) } else { tail };
                let end = content_len(content);
                insert_in_content(content, end, tail);
            }
        }
        for path in doomed.iter().rev() {
            remove_block(&mut self.doc, path);
        }
        prune_empty(&mut self.doc.blocks);
    }

    fn delete_backward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let pos = self.caret();
        let Some((tb, offset)) = self.doc.resolve(pos) else { return };
        if offset > 0 {
            if let Some(content) = self.doc.block_at_mut(&tb.path).and_then(Block::inline_content_mut) {
                delete_in_content(content, offset - 1, offset);
            }
            self.selection = Selection::collapsed(pos - 1);
            return;
        }
        let (parent, idx) = split_path(&tb.path);
        if idx == 0 && !parent.is_empty() {
            match self.doc.block_at(parent) {
                Some(b) if b.is_list_item() => {
                    self.lift_list_item();
                    return;
                }
                Some(Block::Blockquote { .. }) => {
                    self.unwrap_at(parent);
                    return;
                }
                _ => {}
            }
        }
        if pos == 0 {
            return;
        }
        let Some((prev, _)) = self.doc.resolve(pos - 1) else { return };
        let cell_of = |path: &[usize]| nearest_ancestor(&self.doc, path, |b| matches!(b, Block::TableCell { .. }));
        if cell_of(&prev.path) != cell_of(&tb.path) {
            return;
        }
        self.delete_range(pos - 1, pos);
        self.selection = Selection::collapsed(pos - 1);
    }

    fn split_block(&mut self) {
        self.delete_selection();
        let pos = self.caret();
        let Some((tb, offset)) = self.doc.resolve(pos) else { return };
        let Some(block) = self.doc.block_at(&tb.path).cloned() else { return };
        if matches!(block, Block::CodeBlock { .. }) {
            self.insert_text("\n");
            return;
        }
        let (parent, idx) = split_path(&tb.path);
        let parent = parent.to_vec();
        let item = if idx == 0 && !parent.is_empty() {
            self.doc.block_at(&parent).filter(|b| b.is_list_item()).cloned()
        } else {
            None
        };
        if let Some(item) = &item {
            if tb.len == 0 && item.children().map_or(0, Vec::len) == 1 {
                self.lift_list_item();
                return;
            }
        }
        let content = block.inline_content().cloned().unwrap_or_default();
        let (left, right) = split_content(content, offset);
        let new_block = match &block {
            Block::Heading { level, align, .. } if !right.is_empty() => {
                Block::Heading { id: Uuid::new_v4(), level: *level, align: *align, content: right }
            }
            Block::Heading { .. } => Block::paragraph(right),
            Block::Paragraph { align, .. } => Block::Paragraph { id: Uuid::new_v4(), align: *align, content: right },
            _ => return,
        };
        if let Some(content) = self.doc.block_at_mut(&tb.path).and_then(Block::inline_content_mut) {
            *content = left;
        }
        let new_path = match item {
            Some(_) => {
                let (list_path, item_idx) = split_path(&parent);
                let list_path = list_path.to_vec();
                let Some(item_block) = self.doc.block_at_mut(&parent) else { return };
                let is_task = matches!(item_block, Block::TaskItem { .. });
                let mut children = vec![new_block];
                if let Some(existing) = item_block.children_mut() {
                    children.extend(existing.drain(1..));
                }
                let new_item = if is_task { Block::task_item(false, children) } else { Block::list_item(children) };
                let Some(list) = self.doc.container_mut(&list_path) else { return };
                list.insert(item_idx + 1, new_item);
                let mut path = join_path(&list_path, item_idx + 1);
                path.push(0);
                path
            }
            None => {
                let Some(container) = self.doc.container_mut(&parent) else { return };
                container.insert(idx + 1, new_block);
                join_path(&parent, idx + 1)
            }
        };
        self.selection = Selection::collapsed(self.doc.position_at_or_after(&new_path));
    }

    // ---- marks ----

    fn update_marks_in_range<F>(&mut self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&mut Marks),
    {
        for tb in textblocks_in_range(&self.doc, from, to) {
            if to < tb.start || from > tb.end() {
                continue;
            }
            let local_from = from.saturating_sub(tb.start).min(tb.len);
            let local_to = (to - tb.start).min(tb.len);
            if let Some(block) = self.doc.block_at_mut(&tb.path) {
                if matches!(block, Block::CodeBlock { .. }) {
                    continue;
                }
                if let Some(content) = block.inline_content_mut() {
                    update_marks(content, local_from, local_to, &mut f);
                }
            }
        }
    }

    fn set_mark(&mut self, mark: Mark) {
        if self.selection.is_collapsed() {
            let mut marks = self.current_marks();
            marks.add(mark);
            self.stored_marks = Some(marks);
            return;
        }
        let (from, to) = (self.selection.from(), self.selection.to());
        self.update_marks_in_range(from, to, |m| m.add(mark.clone()));
    }

    fn unset_mark(&mut self, kind: MarkKind) {
        if self.selection.is_collapsed() {
            let mut marks = self.current_marks();
            marks.remove(kind);
            self.stored_marks = Some(marks);
            return;
        }
        let (from, to) = (self.selection.from(), self.selection.to());
        self.update_marks_in_range(from, to, |m| m.remove(kind));
    }

    fn toggle_mark(&mut self, mark: Mark) {
        let marks = selection_marks(&self.doc, self.selection, self.stored_marks.as_ref());
        let active = !marks.is_empty() && marks.iter().all(|m| m.has(&mark));
        if active {
            self.unset_mark(mark.kind());
        } else {
            self.set_mark(mark);
        }
    }

    fn unset_all_marks(&mut self) {
        if self.selection.is_collapsed() {
            self.stored_marks = Some(Marks::default());
            return;
        }
        let (from, to) = (self.selection.from(), self.selection.to());
        self.update_marks_in_range(from, to, |m| *m = Marks::default());
    }

    // ---- links and images ----

    fn link_range_at(&self, pos: usize) -> Option<(usize, usize)> {
        let (tb, offset) = self.doc.resolve(pos)?;
        let content = self.doc.block_at(&tb.path)?.inline_content()?;
        let (start, end) = mark_range(content, offset, MarkKind::Link)?;
        Some((tb.start + start, tb.start + end))
    }

    fn in_code_block(&self, pos: usize) -> bool {
        self.doc
            .resolve(pos)
            .and_then(|(tb, _)| self.doc.block_at(&tb.path))
            .is_some_and(|block| matches!(block, Block::CodeBlock { .. }))
    }

    fn set_link(&mut self, attrs: &LinkAttrs, text: Option<&str>) {
        let href = attrs.href.trim();
        if href.is_empty() {
            self.unset_link();
            return;
        }
        // code blocks carry no marks, so a link there would land as plain text
        if self.in_code_block(self.selection.from()) || self.in_code_block(self.selection.to()) {
            return;
        }
        let attrs = LinkAttrs {
            href: Arc::from(normalize_href(href)),
            target: attrs.target.clone().filter(|t| !t.trim().is_empty()),
            rel: attrs.rel.clone().or_else(|| Some(Arc::from(DEFAULT_LINK_REL))),
        };
        let text = text.filter(|t| !t.trim().is_empty());
        if self.selection.is_collapsed() {
            let pos = self.caret();
            if text.is_none() {
                if let Some((from, to)) = self.link_range_at(pos) {
                    self.update_marks_in_range(from, to, |m| m.link = Some(attrs.clone()));
                    return;
                }
            }
            let insert = text.map(str::to_string).unwrap_or_else(|| attrs.href.to_string());
            let mut marks = self.current_marks();
            marks.link = None;
            self.stored_marks = Some(marks);
            self.insert_text(&insert);
            let end = self.caret();
            self.update_marks_in_range(pos, end, |m| m.link = Some(attrs.clone()));
            self.selection = Selection::collapsed(end);
            self.stored_marks = None;
            return;
        }
        let (from, mut to) = (self.selection.from(), self.selection.to());
        if let Some(text) = text {
            if text != crate::selected_text(&self.doc, self.selection) {
                self.delete_selection();
                self.insert_text(text);
                to = self.caret();
            }
        }
        self.update_marks_in_range(from, to, |m| m.link = Some(attrs.clone()));
        self.selection = Selection::range(from, to);
    }

    fn unset_link(&mut self) {
        let range = if self.selection.is_collapsed() {
            self.link_range_at(self.caret())
        } else {
            Some((self.selection.from(), self.selection.to()))
        };
        if let Some((from, to)) = range {
            self.update_marks_in_range(from, to, |m| m.link = None);
        }
    }

    fn set_image(&mut self, src: &str, alt: Option<&str>) {
        let src = src.trim();
        if src.is_empty() {
            return;
        }
        self.delete_selection();
        let pos = self.caret();
        let Some((tb, offset)) = self.doc.resolve(pos) else { return };
        let image = Inline::image(src, alt);
        let Some(block) = self.doc.block_at_mut(&tb.path) else { return };
        if matches!(block, Block::CodeBlock { .. }) {
            let (parent, idx) = split_path(&tb.path);
            let path = join_path(parent, idx + 1);
            if let Some(container) = self.doc.container_mut(parent) {
                container.insert(idx + 1, Block::paragraph(vec![image]));
            }
            self.selection = Selection::collapsed(self.doc.position_at_or_after(&path) + 1);
            return;
        }
        if let Some(content) = block.inline_content_mut() {
            insert_in_content(content, offset, vec![image]);
            self.selection = Selection::collapsed(pos + 1);
        }
    }

    // ---- block types ----

    fn set_textblock_type<F>(&mut self, convert: F)
    where
        F: Fn(&Block) -> Option<Block>,
    {
        for tb in textblocks_in_range(&self.doc, self.selection.from(), self.selection.to()) {
            let converted = self.doc.block_at(&tb.path).and_then(&convert);
            if let (Some(new_block), Some(slot)) = (converted, self.doc.block_at_mut(&tb.path)) {
                *slot = new_block;
            }
        }
    }

    fn all_textblocks<F>(&self, pred: F) -> bool
    where
        F: Fn(&Block) -> bool,
    {
        let blocks = textblocks_in_range(&self.doc, self.selection.from(), self.selection.to());
        !blocks.is_empty()
            && blocks
                .iter()
                .all(|tb| self.doc.block_at(&tb.path).map(&pred).unwrap_or(false))
    }

    fn toggle_heading(&mut self, level: u8) {
        if self.all_textblocks(|b| matches!(b, Block::Heading { level: l, .. } if *l == level)) {
            self.set_textblock_type(to_paragraph);
        } else {
            self.set_textblock_type(|b| to_heading(b, level));
        }
    }

    fn toggle_code_block(&mut self, language: Option<&str>) {
        let current = self.from_tb().and_then(|tb| match self.doc.block_at(&tb.path) {
            Some(Block::CodeBlock { language, .. }) => Some(language.clone()),
            _ => None,
        });
        let in_code = self.all_textblocks(|b| matches!(b, Block::CodeBlock { .. }));
        match (in_code, current, language) {
            (true, Some(current), Some(requested)) if current.as_deref() != Some(requested) => {
                self.set_code_block_language(Some(requested));
            }
            (true, _, _) => self.set_textblock_type(to_paragraph),
            (false, _, language) => self.set_textblock_type(|b| to_code_block(b, language)),
        }
    }

    fn set_code_block_language(&mut self, language: Option<&str>) {
        let language: Option<Arc<str>> = language.map(str::trim).filter(|l| !l.is_empty()).map(Arc::from);
        for tb in textblocks_in_range(&self.doc, self.selection.from(), self.selection.to()) {
            if let Some(Block::CodeBlock { language: slot, .. }) = self.doc.block_at_mut(&tb.path) {
                *slot = language.clone();
            }
        }
    }

    fn set_text_align(&mut self, value: Option<TextAlign>) {
        for tb in textblocks_in_range(&self.doc, self.selection.from(), self.selection.to()) {
            if let Some(Block::Paragraph { align, .. } | Block::Heading { align, .. }) = self.doc.block_at_mut(&tb.path) {
                *align = value;
            }
        }
    }

    // ---- wrapping ----

    /// Parent path and sibling range covering the selection.
    fn block_range(&self) -> Option<(Vec<usize>, usize, usize)> {
        let (a, _) = self.doc.resolve(self.selection.from())?;
        let (b, _) = self.doc.resolve(self.selection.to())?;
        let (own_parent, own_idx) = split_path(&a.path);
        let fallback = Some((own_parent.to_vec(), own_idx, own_idx));
        if a.path == b.path {
            return fallback;
        }
        let depth = a.path.iter().zip(b.path.iter()).take_while(|(x, y)| x == y).count();
        if depth >= a.path.len() || depth >= b.path.len() {
            return fallback;
        }
        let parent = a.path[..depth].to_vec();
        let wrappable = parent.is_empty()
            || matches!(
                self.doc.block_at(&parent),
                Some(Block::Blockquote { .. } | Block::ListItem { .. } | Block::TaskItem { .. } | Block::TableCell { .. })
            );
        if !wrappable {
            return fallback;
        }
        Some((parent, a.path[depth], b.path[depth]))
    }

    fn wrap_range<F>(&mut self, wrap: F)
    where
        F: FnOnce(Vec<Block>) -> Block,
    {
        let Some((parent, start, end)) = self.block_range() else { return };
        let Some(container) = self.doc.container_mut(&parent) else { return };
        if end >= container.len() {
            return;
        }
        let inner: Vec<Block> = container.drain(start..=end).collect();
        container.insert(start, wrap(inner));
    }

    fn unwrap_at(&mut self, path: &[usize]) {
        let (parent, idx) = split_path(path);
        let parent = parent.to_vec();
        let Some(container) = self.doc.container_mut(&parent) else { return };
        if idx >= container.len() {
            return;
        }
        let block = container.remove(idx);
        for (offset, child) in block.into_children().into_iter().enumerate() {
            container.insert(idx + offset, child);
        }
    }

    fn toggle_list(&mut self, kind: NodeType) {
        let Some(tb) = self.from_tb() else { return };
        if let Some(list_path) = nearest_ancestor(&self.doc, &tb.path, Block::is_list) {
            let current = self.doc.block_at(&list_path).map(Block::node_type);
            if current == Some(kind) {
                self.lift_list_item();
            } else if let Some(slot) = self.doc.block_at_mut(&list_path) {
                let children = slot.children_mut().map(std::mem::take).unwrap_or_default();
                *slot = new_list(kind, children);
            }
            return;
        }
        self.wrap_range(|blocks| {
            let items = blocks
                .into_iter()
                .map(|b| {
                    if kind == NodeType::TaskList {
                        Block::task_item(false, vec![b])
                    } else {
                        Block::list_item(vec![b])
                    }
                })
                .collect();
            new_list(kind, items)
        });
    }

    fn lift_list_item(&mut self) {
        let Some((a, _)) = self.doc.resolve(self.selection.from()) else { return };
        let Some((b, _)) = self.doc.resolve(self.selection.to()) else { return };
        let Some(item_path) = nearest_ancestor(&self.doc, &a.path, Block::is_list_item) else { return };
        let (list_path, first) = split_path(&item_path);
        let list_path = list_path.to_vec();
        let last = if b.path.len() > list_path.len() && b.path.starts_with(&list_path) {
            b.path[list_path.len()].max(first)
        } else {
            first
        };
        let Some(list) = self.doc.block_at(&list_path).cloned() else { return };
        let (outer_parent, list_idx) = split_path(&list_path);
        let outer_parent = outer_parent.to_vec();
        let nested = self.doc.block_at(&outer_parent).map_or(false, Block::is_list_item);
        let mut items = list.clone().into_children();
        if last >= items.len() {
            return;
        }
        let after: Vec<Block> = items.drain(last + 1..).collect();
        let mut lifted: Vec<Block> = items.drain(first..).collect();
        let before = items;

        if nested {
            if !after.is_empty() {
                if let Some(children) = lifted.last_mut().and_then(Block::children_mut) {
                    children.push(list_like(&list, after));
                }
            }
            let (outer_list, outer_item_idx) = split_path(&outer_parent);
            let outer_list = outer_list.to_vec();
            if let Some(parent_item) = self.doc.container_mut(&outer_parent) {
                if before.is_empty() {
                    parent_item.remove(list_idx);
                } else {
                    parent_item[list_idx] = list_like(&list, before);
                }
            }
            if let Some(outer) = self.doc.container_mut(&outer_list) {
                for (offset, item) in lifted.into_iter().enumerate() {
                    outer.insert(outer_item_idx + 1 + offset, item);
                }
            }
        } else {
            let mut replacement = Vec::new();
            if !before.is_empty() {
                replacement.push(list_like(&list, before));
            }
            for item in lifted {
                replacement.extend(item.into_children());
            }
            if !after.is_empty() {
                replacement.push(list_like(&list, after));
            }
            if let Some(container) = self.doc.container_mut(&outer_parent) {
                container.remove(list_idx);
                for (offset, block) in replacement.into_iter().enumerate() {
                    container.insert(list_idx + offset, block);
                }
            }
        }
    }

    fn sink_list_item(&mut self) {
        let Some(tb) = self.from_tb() else { return };
        let Some(item_path) = nearest_ancestor(&self.doc, &tb.path, Block::is_list_item) else { return };
        let (list_path, idx) = split_path(&item_path);
        if idx == 0 {
            return;
        }
        let list_path = list_path.to_vec();
        let Some(template) = self.doc.block_at(&list_path).cloned() else { return };
        let Some(list) = self.doc.container_mut(&list_path) else { return };
        let item = list.remove(idx);
        let Some(prev_children) = list.get_mut(idx - 1).and_then(Block::children_mut) else { return };
        match prev_children.last_mut() {
            Some(last) if last.node_type() == template.node_type() => {
                if let Some(grand) = last.children_mut() {
                    grand.push(item);
                }
            }
            _ => prev_children.push(list_like(&template, vec![item])),
        }
    }

    fn toggle_task_item(&mut self) {
        let Some(tb) = self.from_tb() else { return };
        let path = nearest_ancestor(&self.doc, &tb.path, |b| matches!(b, Block::TaskItem { .. }));
        if let Some(Block::TaskItem { checked, .. }) = path.and_then(|p| self.doc.block_at_mut(&p)) {
            *checked = !*checked;
        }
    }

    fn toggle_blockquote(&mut self) {
        let Some(tb) = self.from_tb() else { return };
        match nearest_ancestor(&self.doc, &tb.path, |b| matches!(b, Block::Blockquote { .. })) {
            Some(path) => self.unwrap_at(&path),
            None => self.wrap_range(|children| Block::Blockquote { id: Uuid::new_v4(), children }),
        }
    }

    // ---- block insertion ----

    /// Inserts `blocks` at the caret, splitting the current textblock when the
    /// caret sits inside it. Returns the parent path and index of the first
    /// inserted block.
    fn insert_blocks_at_caret(&mut self, blocks: Vec<Block>) -> Option<(Vec<usize>, usize)> {
        if blocks.is_empty() {
            return None;
        }
        self.delete_selection();
        let (tb, offset) = self.doc.resolve(self.caret())?;
        let (parent, idx) = split_path(&tb.path);
        let parent = parent.to_vec();
        let current = self.doc.block_at(&tb.path)?.clone();
        let container = self.doc.container_mut(&parent)?;
        let at = if tb.len == 0 && matches!(current, Block::Paragraph { .. }) {
            container.remove(idx);
            idx
        } else if offset == 0 {
            idx
        } else if offset >= tb.len {
            idx + 1
        } else {
            let content = current.inline_content().cloned().unwrap_or_default();
            let (left, right) = split_content(content, offset);
            if let Some(slot) = container.get_mut(idx).and_then(Block::inline_content_mut) {
                *slot = left;
            }
            container.insert(idx + 1, with_content(&current, right));
            idx + 1
        };
        for (n, block) in blocks.into_iter().enumerate() {
            container.insert(at + n, block);
        }
        Some((parent, at))
    }

    fn insert_table(&mut self, rows: usize, cols: usize, with_header_row: bool) {
        if rows == 0 || cols == 0 {
            return;
        }
        let table = TableEditor::build(rows, cols, with_header_row);
        if let Some((parent, at)) = self.insert_blocks_at_caret(vec![table]) {
            let path = join_path(&parent, at);
            self.selection = Selection::collapsed(self.doc.position_at_or_after(&path));
        }
    }

    fn set_horizontal_rule(&mut self) {
        let Some((parent, at)) = self.insert_blocks_at_caret(vec![Block::horizontal_rule()]) else { return };
        let Some(container) = self.doc.container_mut(&parent) else { return };
        let next_is_text = container.get(at + 1).map_or(false, Block::is_textblock);
        if !next_is_text {
            container.insert(at + 1, Block::empty_paragraph());
        }
        let path = join_path(&parent, at + 1);
        self.selection = Selection::collapsed(self.doc.position_at_or_after(&path));
    }

    fn set_content(&mut self, html: &str) {
        self.doc.blocks = parse_html(html);
        self.doc.normalize();
        self.selection = Selection::collapsed(0);
        self.stored_marks = None;
    }

    fn insert_content(&mut self, html: &str) {
        let fragment = Document::from_blocks(parse_html(html));
        let mut blocks = fragment.blocks;
        if blocks.len() == 1 {
            if let Block::Paragraph { content, .. } = &mut blocks[0] {
                let items = std::mem::take(content);
                if items.is_empty() {
                    return;
                }
                self.delete_selection();
                let pos = self.caret();
                let Some((tb, offset)) = self.doc.resolve(pos) else { return };
                let Some(block) = self.doc.block_at_mut(&tb.path) else { return };
                let items = if matches!(block, Block::CodeBlock { .. }) { code_text(&items) } else { items };
                let len = content_len(&items);
                if let Some(target) = block.inline_content_mut() {
                    insert_in_content(target, offset, items);
                }
                self.selection = Selection::collapsed(pos + len);
                return;
            }
        }
        let count = blocks.len();
        if let Some((parent, at)) = self.insert_blocks_at_caret(blocks) {
            let last = join_path(&parent, at + count - 1);
            let end = self
                .doc
                .textblocks()
                .into_iter()
                .filter(|tb| tb.path.starts_with(&last))
                .last()
                .map(|tb| tb.end());
            if let Some(end) = end {
                self.selection = Selection::collapsed(end);
            }
        }
    }

    // ---- tables ----

    fn table_cell_path(&self) -> Option<Vec<usize>> {
        let tb = self.from_tb()?;
        nearest_ancestor(&self.doc, &tb.path, |b| matches!(b, Block::TableCell { .. }))
    }

    fn table_op(&mut self, op: TableOp) {
        let Some(cell_path) = self.table_cell_path() else { return };
        if cell_path.len() < 3 {
            return;
        }
        let table_path = cell_path[..cell_path.len() - 2].to_vec();
        let row = cell_path[cell_path.len() - 2];
        let col = cell_path[cell_path.len() - 1];
        let Some(table) = self.doc.block_at_mut(&table_path) else { return };
        let Some((rows, cols)) = TableEditor::dimensions(table) else { return };
        let (target_row, target_col) = match op {
            TableOp::AddRowBefore => {
                TableEditor::insert_row(table, row);
                (row + 1, col)
            }
            TableOp::AddRowAfter => {
                TableEditor::insert_row(table, row + 1);
                (row, col)
            }
            TableOp::DeleteRow if rows <= 1 => return self.delete_table(),
            TableOp::DeleteRow => {
                TableEditor::delete_row(table, row);
                (row.min(rows - 2), col)
            }
            TableOp::AddColumnBefore => {
                TableEditor::insert_column(table, col);
                (row, col + 1)
            }
            TableOp::AddColumnAfter => {
                TableEditor::insert_column(table, col + 1);
                (row, col)
            }
            TableOp::DeleteColumn if cols <= 1 => return self.delete_table(),
            TableOp::DeleteColumn => {
                TableEditor::delete_column(table, col);
                (row, col.min(cols - 2))
            }
        };
        let mut path = table_path;
        path.push(target_row);
        path.push(target_col);
        self.selection = Selection::collapsed(self.doc.position_at_or_after(&path));
    }

    fn delete_table(&mut self) {
        let Some(tb) = self.from_tb() else { return };
        let Some(path) = nearest_ancestor(&self.doc, &tb.path, |b| matches!(b, Block::Table { .. })) else { return };
        remove_block(&mut self.doc, &path);
        self.doc.normalize();
        self.selection = Selection::collapsed(self.doc.position_at_or_after(&path));
    }

    // ---- formatting reset ----

    fn clear_formatting(&mut self) {
        self.unset_all_marks();
        self.set_textblock_type(|b| match b {
            Block::Paragraph { align: None, .. } => None,
            Block::Paragraph { id, content, .. } => Some(Block::Paragraph { id: *id, align: None, content: content.clone() }),
            other => to_paragraph(other),
        });
        let range = self.selection;
        for _ in 0..64 {
            let wrapped = textblocks_in_range(&self.doc, range.from(), range.to()).into_iter().find_map(|tb| {
                nearest_ancestor(&self.doc, &tb.path, |b| b.is_list_item() || matches!(b, Block::Blockquote { .. }))
                    .map(|path| (tb.start, path))
            });
            let Some((start, path)) = wrapped else { break };
            if self.doc.block_at(&path).map_or(false, Block::is_list_item) {
                self.selection = Selection::collapsed(start);
                self.lift_list_item();
            } else {
                self.unwrap_at(&path);
            }
        }
        self.selection = range;
    }
}

#[derive(Debug, Clone, Copy)]
enum TableOp {
    AddRowBefore,
    AddRowAfter,
    DeleteRow,
    AddColumnBefore,
    AddColumnAfter,
    DeleteColumn,
}
