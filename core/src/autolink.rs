use crate::{Block, Document, EditorCommand, Inline, LinkAttrs, Selection};

const LINK_PATTERN: &str = concat!(
    r#"(?:[Hh][Tt][Tt][Pp][Ss]?://|[Ww][Ww][Ww]\.)[^\s<>"'\x{fffc}]+"#,
    r"|(?P<email>[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,})",
    r"|\b(?:[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?\.)+",
    r"(?i:com|org|net|edu|gov|io|dev|app|co|me|ai|info|blog|site|tech|xyz|uk|de|fr|jp|cn|ru|us|ca|au|in|nl|br|es|it)\b",
    r#"(?:[/?#][^\s<>"'\x{fffc}]*)?"#,
);

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\''];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    Url,
    Email,
}

/// A bare URL or email found in unlinked text. Positions are in the flat
/// document space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autolink {
    pub from: usize,
    pub to: usize,
    pub text: String,
    pub kind: AutolinkKind,
}

impl Autolink {
    pub fn href(&self) -> String {
        match self.kind {
            AutolinkKind::Email => format!("mailto:{}", self.text),
            AutolinkKind::Url => {
                let lower = self.text.to_ascii_lowercase();
                if lower.starts_with("http://") || lower.starts_with("https://") {
                    self.text.clone()
                } else {
                    format!("https://{}", self.text)
                }
            }
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::range(self.from, self.to)
    }

    /// Command that turns the decorated span into a real link.
    pub fn promote(&self) -> EditorCommand {
        EditorCommand::SetLink { attrs: LinkAttrs::new(self.href(), Some("_blank")), text: None }
    }
}

/// Flattens a textblock into one char per position; `eligible` is false for
/// characters that already sit under a link or code mark.
fn flatten(content: &[Inline]) -> (String, Vec<bool>) {
    let mut text = String::new();
    let mut eligible = Vec::new();
    for inline in content {
        match inline {
            Inline::Text { value, marks } => {
                let free = marks.link.is_none() && !marks.code;
                for c in value.chars() {
                    text.push(c);
                    eligible.push(free);
                }
            }
            Inline::Image { .. } => {
                text.push('\u{fffc}');
                eligible.push(false);
            }
            Inline::HardBreak => {
                text.push('\n');
                eligible.push(false);
            }
        }
    }
    (text, eligible)
}

/// Decoration pass: every bare URL, domain or email outside links and code.
pub fn find_autolinks(doc: &Document) -> Vec<Autolink> {
    let Some(re) = cached_regex!(LINK_PATTERN) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for tb in doc.textblocks() {
        let Some(block) = doc.block_at(&tb.path) else { continue };
        if matches!(block, Block::CodeBlock { .. }) {
            continue;
        }
        let Some(content) = block.inline_content() else { continue };
        let (text, eligible) = flatten(content);
        for caps in re.captures_iter(&text) {
            let Some(m) = caps.get(0) else { continue };
            let matched = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if matched.is_empty() {
                continue;
            }
            let start = text[..m.start()].chars().count();
            let len = matched.chars().count();
            if !eligible[start..start + len].iter().all(|free| *free) {
                continue;
            }
            let kind = if caps.name("email").is_some() { AutolinkKind::Email } else { AutolinkKind::Url };
            found.push(Autolink { from: tb.start + start, to: tb.start + start + len, text: matched.to_string(), kind });
        }
    }
    found
}

/// The decorated span under `pos`, if any.
pub fn autolink_at(doc: &Document, pos: usize) -> Option<Autolink> {
    find_autolinks(doc).into_iter().find(|link| link.from <= pos && pos < link.to)
}
