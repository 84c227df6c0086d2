use crate::{
    heading_font_size, link_at, marks_at, marks_in_range, nearest_ancestor, plain_text, slice_content, Block,
    Document, Inline, LinkAttrs, Mark, MarkKind, Marks, NodeType, Query, Selection, TextAlign, TextblockRef,
};

/// Textblocks touched by `[from, to]`. A caret touches only its own textblock.
pub fn textblocks_in_range(doc: &Document, from: usize, to: usize) -> Vec<TextblockRef> {
    if from == to {
        return doc.resolve(from).map(|(tb, _)| vec![tb]).unwrap_or_default();
    }
    doc.textblocks()
        .into_iter()
        .filter(|tb| tb.end() >= from && tb.start <= to)
        .filter(|tb| tb.len == 0 || tb.end() != from)
        .collect()
}

/// Marks relevant to the selection: the stored or inherited marks for a
/// caret, otherwise the marks of every text run in range outside code blocks.
pub fn selection_marks(doc: &Document, selection: Selection, stored: Option<&Marks>) -> Vec<Marks> {
    if selection.is_collapsed() {
        if let Some(stored) = stored {
            return vec![stored.clone()];
        }
        let Some((tb, offset)) = doc.resolve(selection.focus) else { return Vec::new() };
        return match doc.block_at(&tb.path) {
            Some(Block::CodeBlock { .. }) | None => vec![Marks::default()],
            Some(block) => vec![block.inline_content().map(|c| marks_at(c, offset)).unwrap_or_default()],
        };
    }
    let (from, to) = (selection.from(), selection.to());
    let mut out = Vec::new();
    for tb in textblocks_in_range(doc, from, to) {
        let Some(block) = doc.block_at(&tb.path) else { continue };
        if matches!(block, Block::CodeBlock { .. }) {
            continue;
        }
        let Some(content) = block.inline_content() else { continue };
        let local_from = from.saturating_sub(tb.start).min(tb.len);
        let local_to = to.saturating_sub(tb.start).min(tb.len);
        out.extend(marks_in_range(content, local_from, local_to).into_iter().cloned());
    }
    out
}

pub fn selected_text(doc: &Document, selection: Selection) -> String {
    if selection.is_collapsed() {
        return String::new();
    }
    let (from, to) = (selection.from(), selection.to());
    let mut parts = Vec::new();
    for tb in textblocks_in_range(doc, from, to) {
        let Some(content) = doc.block_at(&tb.path).and_then(Block::inline_content) else { continue };
        let local_from = from.saturating_sub(tb.start).min(tb.len);
        let local_to = to.saturating_sub(tb.start).min(tb.len);
        parts.push(plain_text(&slice_content(content, local_from, local_to)));
    }
    parts.join("\n")
}

/// Link under the caret, or covering the start of the selection.
pub fn link_at_selection(doc: &Document, selection: Selection) -> Option<LinkAttrs> {
    let (tb, offset) = doc.resolve(selection.from())?;
    let content = doc.block_at(&tb.path)?.inline_content()?;
    if selection.is_collapsed() {
        link_at(content, offset)
    } else {
        marks_in_range(content, offset, offset + 1).first().and_then(|m| m.link.clone())
    }
}

fn all_textblocks<F>(doc: &Document, selection: Selection, pred: F) -> bool
where
    F: Fn(&Block) -> bool,
{
    let blocks = textblocks_in_range(doc, selection.from(), selection.to());
    !blocks.is_empty() && blocks.iter().all(|tb| doc.block_at(&tb.path).map(&pred).unwrap_or(false))
}

fn caret_block(doc: &Document, selection: Selection) -> Option<(TextblockRef, &Block)> {
    let (tb, _) = doc.resolve(selection.from())?;
    let block = doc.block_at(&tb.path)?;
    Some((tb, block))
}

fn image_selected(doc: &Document, selection: Selection) -> bool {
    if selection.to() != selection.from() + 1 {
        return false;
    }
    let Some((tb, offset)) = doc.resolve(selection.from()) else { return false };
    let Some(content) = doc.block_at(&tb.path).and_then(Block::inline_content) else { return false };
    matches!(
        slice_content(content, offset, offset + 1).first(),
        Some(Inline::Image { .. })
    )
}

pub fn query_active(doc: &Document, selection: Selection, stored: Option<&Marks>, query: &Query) -> bool {
    match query {
        Query::Mark(kind) => {
            let marks = selection_marks(doc, selection, stored);
            !marks.is_empty() && marks.iter().all(|m| m.has_kind(*kind))
        }
        Query::MarkWith(mark) => {
            let marks = selection_marks(doc, selection, stored);
            !marks.is_empty() && marks.iter().all(|m| m.has(mark))
        }
        Query::Heading(level) => {
            all_textblocks(doc, selection, |b| matches!(b, Block::Heading { level: l, .. } if l == level))
        }
        Query::CodeLanguage(language) => matches!(
            caret_block(doc, selection),
            Some((_, Block::CodeBlock { language: Some(l), .. })) if l.as_ref() == language
        ),
        Query::Align(align) => match caret_block(doc, selection) {
            Some((_, block)) if block.is_textblock() => {
                block.align().unwrap_or(TextAlign::Left) == *align && !matches!(block, Block::CodeBlock { .. })
            }
            _ => false,
        },
        Query::Node(node) => match node {
            NodeType::Paragraph | NodeType::Heading | NodeType::CodeBlock => {
                all_textblocks(doc, selection, |b| b.node_type() == *node)
            }
            NodeType::Image => image_selected(doc, selection),
            NodeType::HorizontalRule => false,
            NodeType::TableCell => caret_block(doc, selection)
                .and_then(|(tb, _)| nearest_ancestor(doc, &tb.path, |b| matches!(b, Block::TableCell { .. })))
                .is_some(),
            container => caret_block(doc, selection)
                .and_then(|(tb, _)| nearest_ancestor(doc, &tb.path, |b| b.node_type() == *container))
                .is_some(),
        },
    }
}

/// Attributes of `kind` at the selection, first match wins.
pub fn selection_attributes(doc: &Document, selection: Selection, stored: Option<&Marks>, kind: MarkKind) -> Option<Mark> {
    selection_marks(doc, selection, stored).iter().find_map(|m| m.get(kind))
}

/// Size shown by the font size control. Headings report their level's size.
pub fn selection_font_size(doc: &Document, selection: Selection, stored: Option<&Marks>, default: &str) -> String {
    if let Some((_, Block::Heading { level, .. })) = caret_block(doc, selection) {
        return heading_font_size(*level).to_string();
    }
    match selection_attributes(doc, selection, stored, MarkKind::FontSize) {
        Some(Mark::FontSize { value }) => value.to_string(),
        _ => default.to_string(),
    }
}

pub fn active_heading_level(doc: &Document, selection: Selection) -> Option<u8> {
    match caret_block(doc, selection) {
        Some((_, Block::Heading { level, .. })) => Some(*level),
        _ => None,
    }
}

pub fn active_code_language(doc: &Document, selection: Selection) -> Option<String> {
    match caret_block(doc, selection) {
        Some((_, Block::CodeBlock { language, .. })) => Some(language.as_deref().unwrap_or_default().to_string()),
        _ => None,
    }
}
