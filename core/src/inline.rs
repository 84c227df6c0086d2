use crate::{Inline, LinkAttrs, MarkKind, Marks};
use std::sync::Arc;

pub fn inline_len(inline: &Inline) -> usize {
    match inline {
        Inline::Text { value, .. } => value.chars().count(),
        Inline::Image { .. } | Inline::HardBreak => 1,
    }
}

pub fn content_len(content: &[Inline]) -> usize {
    content.iter().map(inline_len).sum()
}

pub fn plain_text(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::Text { value, .. } => out.push_str(value.as_ref()),
            Inline::HardBreak => out.push('\n'),
            Inline::Image { .. } => {}
        }
    }
    out
}

pub(crate) fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}

/// Splits inline content at a character offset.
pub fn split_content(content: Vec<Inline>, offset: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0usize;
    for inline in content {
        let len = inline_len(&inline);
        if pos + len <= offset {
            left.push(inline);
        } else if pos >= offset {
            right.push(inline);
        } else if let Inline::Text { value, marks } = inline {
            let at = char_to_byte_idx(&value, offset - pos);
            let (a, b) = value.split_at(at);
            left.push(Inline::Text { value: Arc::from(a), marks: marks.clone() });
            right.push(Inline::Text { value: Arc::from(b), marks });
        }
        pos += len;
    }
    (left, right)
}

pub fn slice_content(content: &[Inline], from: usize, to: usize) -> Vec<Inline> {
    let (_, tail) = split_content(content.to_vec(), from);
    let (mid, _) = split_content(tail, to.saturating_sub(from));
    mid
}

pub fn delete_in_content(content: &mut Vec<Inline>, from: usize, to: usize) {
    if to <= from {
        return;
    }
    let (left, rest) = split_content(std::mem::take(content), from);
    let (_, right) = split_content(rest, to - from);
    *content = left;
    content.extend(right);
    normalize_content(content);
}

pub fn insert_in_content(content: &mut Vec<Inline>, offset: usize, items: Vec<Inline>) {
    let (mut left, right) = split_content(std::mem::take(content), offset);
    left.extend(items);
    left.extend(right);
    *content = left;
    normalize_content(content);
}

/// Applies `f` to the marks of every text run inside `[from, to)`.
pub fn update_marks<F>(content: &mut Vec<Inline>, from: usize, to: usize, mut f: F)
where
    F: FnMut(&mut Marks),
{
    if to <= from {
        return;
    }
    let (left, rest) = split_content(std::mem::take(content), from);
    let (mut mid, right) = split_content(rest, to - from);
    for inline in mid.iter_mut() {
        if let Inline::Text { marks, .. } = inline {
            f(marks);
        }
    }
    *content = left;
    content.extend(mid);
    content.extend(right);
    normalize_content(content);
}

/// Marks of every text character inside `[from, to)`.
pub fn marks_in_range(content: &[Inline], from: usize, to: usize) -> Vec<&Marks> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    for inline in content {
        let len = inline_len(inline);
        if let Inline::Text { marks, .. } = inline {
            if pos < to && pos + len > from && len > 0 {
                out.push(marks);
            }
        }
        pos += len;
    }
    out
}

fn marks_of_char(content: &[Inline], index: usize) -> Option<&Marks> {
    let mut pos = 0usize;
    for inline in content {
        let len = inline_len(inline);
        if index < pos + len {
            return match inline {
                Inline::Text { marks, .. } => Some(marks),
                _ => None,
            };
        }
        pos += len;
    }
    None
}

/// Marks a character typed at `offset` inherits. Links do not extend past
/// their end.
pub fn marks_at(content: &[Inline], offset: usize) -> Marks {
    let before = if offset > 0 { marks_of_char(content, offset - 1) } else { None };
    let after = marks_of_char(content, offset);
    let mut marks = match (before, after) {
        (Some(b), _) => b.clone(),
        (None, Some(a)) if offset == 0 => a.clone(),
        _ => Marks::default(),
    };
    if let Some(link) = &marks.link {
        let continues = after.and_then(|a| a.link.as_ref()) == Some(link);
        if !continues || before.is_none() {
            marks.link = None;
        }
    }
    marks
}

/// Widest run around `offset` carrying the same `kind` value.
pub fn mark_range(content: &[Inline], offset: usize, kind: MarkKind) -> Option<(usize, usize)> {
    let before = if offset > 0 { marks_of_char(content, offset - 1) } else { None };
    let after = marks_of_char(content, offset);
    let anchor = before
        .and_then(|m| m.get(kind))
        .or_else(|| after.and_then(|m| m.get(kind)))?;
    let mut spans = Vec::new();
    let mut pos = 0usize;
    for inline in content {
        let len = inline_len(inline);
        let matches = match inline {
            Inline::Text { marks, .. } => marks.has(&anchor),
            _ => false,
        };
        spans.push((pos, pos + len, matches));
        pos += len;
    }
    let seed = spans
        .iter()
        .position(|(s, e, m)| *m && ((*s < offset && offset <= *e) || (*s <= offset && offset < *e)))?;
    let mut start = spans[seed].0;
    let mut end = spans[seed].1;
    for (s, e, m) in spans[..seed].iter().rev() {
        if *m && *e == start {
            start = *s;
        } else {
            break;
        }
    }
    for (s, e, m) in spans[seed + 1..].iter() {
        if *m && *s == end {
            end = *e;
        } else {
            break;
        }
    }
    Some((start, end))
}

pub fn link_at(content: &[Inline], offset: usize) -> Option<LinkAttrs> {
    let before = if offset > 0 { marks_of_char(content, offset - 1) } else { None };
    let after = marks_of_char(content, offset);
    before
        .and_then(|m| m.link.clone())
        .or_else(|| after.and_then(|m| m.link.clone()))
}

/// Merges adjacent runs with identical marks and drops empty ones.
pub fn normalize_content(content: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content.drain(..) {
        if let Inline::Text { value, marks } = &inline {
            if value.is_empty() {
                continue;
            }
            if let Some(Inline::Text { value: last_value, marks: last_marks }) = out.last_mut() {
                if last_marks == marks {
                    let mut merged = String::with_capacity(last_value.len() + value.len());
                    merged.push_str(last_value.as_ref());
                    merged.push_str(value.as_ref());
                    *last_value = Arc::from(merged);
                    continue;
                }
            }
        }
        out.push(inline);
    }
    *content = out;
}

pub fn strip_marks(content: &mut Vec<Inline>) {
    for inline in content.iter_mut() {
        if let Inline::Text { marks, .. } = inline {
            *marks = Marks::default();
        }
    }
    normalize_content(content);
}

/// Plain-text view for code blocks: marks and images removed, breaks as newlines.
pub fn code_text(content: &[Inline]) -> Vec<Inline> {
    let text = plain_text(content);
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Inline::text(text)]
    }
}

pub fn trim_content(content: &mut Vec<Inline>) {
    if let Some(Inline::Text { value, .. }) = content.first_mut() {
        let trimmed = value.trim_start_matches(|c: char| c.is_ascii_whitespace());
        if trimmed.len() != value.len() {
            *value = Arc::from(trimmed);
        }
    }
    if let Some(Inline::Text { value, .. }) = content.last_mut() {
        let trimmed = value.trim_end_matches(|c: char| c.is_ascii_whitespace());
        if trimmed.len() != value.len() {
            *value = Arc::from(trimmed);
        }
    }
    normalize_content(content);
}
