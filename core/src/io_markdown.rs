//! Best-effort Markdown conversion. Export runs a fixed, order-sensitive chain
//! of regex rewrites over serialized HTML; formatting Markdown cannot express
//! (underline, colors, font family/size, highlight, alignment, sub/superscript)
//! is reduced to its text.

use crate::{decode_entities, escape_attr, escape_text, parse_html, to_html, Document};
use regex_lite::{Captures, Regex};

fn replace_with<F>(text: &str, re: Option<&Regex>, f: F) -> String
where
    F: FnMut(&Captures<'_>) -> String,
{
    match re {
        Some(re) => re.replace_all(text, f).into_owned(),
        None => text.to_string(),
    }
}

fn group<'a>(caps: &'a Captures<'_>, idx: usize) -> &'a str {
    caps.get(idx).map_or("", |m| m.as_str())
}

fn attr_of(tag: &str, name: &str) -> Option<String> {
    let re = match name {
        "src" => cached_regex!(r#"(?i)\ssrc\s*=\s*"([^"]*)""#),
        "alt" => cached_regex!(r#"(?i)\salt\s*=\s*"([^"]*)""#),
        "href" => cached_regex!(r#"(?i)\shref\s*=\s*"([^"]*)""#),
        "class" => cached_regex!(r#"(?i)\sclass\s*=\s*"([^"]*)""#),
        "start" => cached_regex!(r#"(?i)\sstart\s*=\s*"([^"]*)""#),
        "data-checked" => cached_regex!(r#"(?i)\sdata-checked\s*=\s*"([^"]*)""#),
        _ => None,
    }?;
    re.captures(tag).map(|caps| group(&caps, 1).to_string())
}

/// Stashes fragments that later rules must not touch.
#[derive(Default)]
struct Stash {
    items: Vec<String>,
}

impl Stash {
    fn put(&mut self, value: String) -> String {
        self.items.push(value);
        format!("\u{1}{}\u{1}", self.items.len() - 1)
    }

    fn restore(&self, mut text: String) -> String {
        for (idx, value) in self.items.iter().enumerate().rev() {
            text = text.replace(&format!("\u{1}{idx}\u{1}"), value);
        }
        text
    }
}

fn strip_tags(html: &str) -> String {
    replace_with(html, cached_regex!(r"<[^>]*>"), |_| String::new())
}

/// Text of a fragment with paragraph tags turned into line breaks.
fn flatten_paragraphs(html: &str) -> String {
    let text = replace_with(html, cached_regex!(r"(?i)</p>|</div>|<br\s*/?>"), |_| "\n".to_string());
    let text = replace_with(&text, cached_regex!(r"(?i)<p(?:\s[^>]*)?>|<div(?:\s[^>]*)?>"), |_| String::new());
    text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()).collect::<Vec<_>>().join("\n")
}

fn convert_table(inner: &str) -> String {
    let mut rows: Vec<(bool, Vec<String>)> = Vec::new();
    let (Some(row_re), Some(cell_re)) =
        (cached_regex!(r"(?is)<tr[^>]*>(.*?)</tr>"), cached_regex!(r"(?is)<(th|td)[^>]*>(.*?)</t[hd]>"))
    else {
        return strip_tags(inner);
    };
    for row in row_re.captures_iter(inner) {
        let mut header = false;
        let mut cells = Vec::new();
        for cell in cell_re.captures_iter(group(&row, 1)) {
            header |= group(&cell, 1).eq_ignore_ascii_case("th");
            cells.push(flatten_paragraphs(group(&cell, 2)).replace('\n', " ").replace('|', "\\|"));
        }
        if !cells.is_empty() {
            rows.push((header, cells));
        }
    }
    let Some(cols) = rows.iter().map(|(_, c)| c.len()).max() else { return String::new() };
    let render = |cells: &[String]| {
        let mut padded = cells.to_vec();
        padded.resize(cols, String::new());
        format!("| {} |", padded.join(" | "))
    };
    let separator = format!("|{}|", vec![" --- "; cols].join("|"));
    let mut lines = Vec::new();
    let mut body = rows.iter();
    match rows.first() {
        Some((true, cells)) => {
            lines.push(render(cells));
            body.next();
        }
        _ => lines.push(render(&[])),
    }
    lines.push(separator);
    lines.extend(body.map(|(_, cells)| render(cells)));
    format!("\n\n{}\n\n", lines.join("\n"))
}

/// Converts the innermost `<ul>`/`<ol>` first so nested lists become indented
/// Markdown before their parents are processed.
fn convert_lists(html: &str) -> String {
    let mut text = html.to_string();
    loop {
        let lower = text.to_ascii_lowercase();
        let close_ul = lower.find("</ul>");
        let close_ol = lower.find("</ol>");
        let (close_at, tag) = match (close_ul, close_ol) {
            (Some(u), Some(o)) if o < u => (o, "ol"),
            (Some(u), _) => (u, "ul"),
            (None, Some(o)) => (o, "ol"),
            (None, None) => break,
        };
        let open_at = lower[..close_at]
            .match_indices(&format!("<{tag}"))
            .map(|(i, _)| i)
            .filter(|i| matches!(lower.as_bytes().get(i + 3), Some(b'>' | b' ' | b'\t' | b'\n')))
            .last();
        let Some(open_at) = open_at else {
            text.replace_range(close_at..close_at + 5, "");
            continue;
        };
        let Some(open_end) = lower[open_at..].find('>').map(|i| open_at + i + 1) else { break };
        let open_tag = &text[open_at..open_end];
        let ordered = tag == "ol";
        let start: usize = attr_of(open_tag, "start").and_then(|s| s.parse().ok()).unwrap_or(1);
        let inner = text[open_end..close_at].to_string();
        let mut lines = Vec::new();
        if let Some(item_re) = cached_regex!(r"(?is)<li([^>]*)>(.*?)</li>") {
            for (n, item) in item_re.captures_iter(&inner).enumerate() {
                let attrs = group(&item, 1);
                let body = flatten_paragraphs(group(&item, 2));
                let marker = if ordered {
                    format!("{}. ", start + n)
                } else {
                    match attr_of(attrs, "data-checked").as_deref() {
                        Some("true") => "- [x] ".to_string(),
                        Some(_) => "- [ ] ".to_string(),
                        None => "- ".to_string(),
                    }
                };
                let indent = " ".repeat(if ordered { marker.len() } else { 2 });
                let mut body_lines = body.lines();
                lines.push(format!("{marker}{}", body_lines.next().unwrap_or_default()));
                for line in body_lines {
                    lines.push(format!("{indent}{line}"));
                }
            }
        }
        let replacement = format!("\n\n{}\n\n", lines.join("\n"));
        text.replace_range(open_at..close_at + 5, &replacement);
    }
    text
}

fn convert_blockquotes(html: &str) -> String {
    let mut text = html.to_string();
    loop {
        let lower = text.to_ascii_lowercase();
        let Some(close_at) = lower.find("</blockquote>") else { break };
        let Some(open_at) = lower[..close_at].rfind("<blockquote") else {
            text.replace_range(close_at..close_at + 13, "");
            continue;
        };
        let Some(open_end) = lower[open_at..].find('>').map(|i| open_at + i + 1) else { break };
        let inner = text[open_end..close_at].to_string();
        let quoted = flatten_paragraphs(&inner)
            .lines()
            .map(|l| format!("> {l}"))
            .collect::<Vec<_>>()
            .join("\n");
        text.replace_range(open_at..close_at + 13, &format!("\n\n{quoted}\n\n"));
    }
    text
}

pub fn html_to_markdown(html: &str) -> String {
    let mut stash = Stash::default();

    let text = replace_with(html, cached_regex!(r"(?is)<pre[^>]*>\s*(<code[^>]*>)?(.*?)(</code>)?\s*</pre>"), |caps| {
        let lang = caps
            .get(1)
            .and_then(|open| attr_of(open.as_str(), "class"))
            .and_then(|class| {
                class.split_whitespace().find_map(|c| c.strip_prefix("language-").map(str::to_string))
            })
            .unwrap_or_default();
        let code = decode_entities(&strip_tags(group(caps, 2)));
        let fence = stash.put(format!("```{lang}\n{}\n```", code.trim_end_matches('\n')));
        format!("\n\n{fence}\n\n")
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<code[^>]*>(.*?)</code>"), |caps| {
        stash.put(format!("`{}`", decode_entities(&strip_tags(group(caps, 1)))))
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<label[^>]*>.*?</label>"), |_| String::new());
    let text = replace_with(&text, cached_regex!(r"(?is)<table[^>]*>(.*?)</table>"), |caps| {
        convert_table(group(caps, 1))
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>"), |caps| {
        let level: usize = group(caps, 1).parse().unwrap_or(1);
        format!("\n\n{} {}\n\n", "#".repeat(level), group(caps, 2).trim())
    });
    let text = convert_lists(&text);
    let text = convert_blockquotes(&text);
    let text = replace_with(&text, cached_regex!(r"(?i)<hr[^>]*>"), |_| "\n\n---\n\n".to_string());
    let text = replace_with(&text, cached_regex!(r"(?i)<img[^>]*>"), |caps| {
        let tag = group(caps, 0);
        let src = attr_of(tag, "src").unwrap_or_default();
        let alt = attr_of(tag, "alt").unwrap_or_default();
        format!("![{alt}]({src})")
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<a(\s[^>]*)?>(.*?)</a>"), |caps| {
        let label = group(caps, 2);
        match attr_of(group(caps, 0), "href") {
            Some(href) => format!("[{label}]({href})"),
            None => label.to_string(),
        }
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>"), |caps| {
        format!("**{}**", group(caps, 1))
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>"), |caps| {
        format!("*{}*", group(caps, 1))
    });
    let text = replace_with(&text, cached_regex!(r"(?is)<(?:s|del|strike)(?:\s[^>]*)?>(.*?)</(?:s|del|strike)>"), |caps| {
        format!("~~{}~~", group(caps, 1))
    });
    let text = replace_with(&text, cached_regex!(r"(?i)<br\s*/?>"), |_| "  \n".to_string());
    let text = replace_with(&text, cached_regex!(r"(?i)</p>"), |_| "\n\n".to_string());
    let text = strip_tags(&text);
    let text = decode_entities(&text).replace('\u{a0}', " ");
    let text = stash.restore(text);
    let text = text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n");
    let text = replace_with(&text, cached_regex!(r"\n{3,}"), |_| "\n\n".to_string());
    text.trim().to_string()
}

pub fn export_markdown(doc: &Document) -> String {
    html_to_markdown(&to_html(doc))
}

pub fn import_markdown(md: &str) -> Document {
    Document::from_blocks(parse_html(&markdown_to_html(md)))
}

// ---- Markdown to HTML ----

/// Quotes an already text-escaped value for use inside an attribute.
fn quote_attr(escaped: &str) -> String {
    escaped.replace('"', "&quot;")
}

fn inline_markdown(raw: &str) -> String {
    let mut stash = Stash::default();
    let text = replace_with(raw, cached_regex!(r"`([^`]+)`"), |caps| {
        stash.put(format!("<code>{}</code>", escape_text(group(caps, 1))))
    });
    let text = escape_text(&text);
    let text = replace_with(&text, cached_regex!(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"([^"]*)")?\)"#), |caps| {
        let mut tag = format!("<img src=\"{}\"", quote_attr(group(caps, 2)));
        if !group(caps, 1).is_empty() {
            tag.push_str(&format!(" alt=\"{}\"", quote_attr(group(caps, 1))));
        }
        if let Some(title) = caps.get(3) {
            tag.push_str(&format!(" title=\"{}\"", quote_attr(title.as_str())));
        }
        tag.push('>');
        stash.put(tag)
    });
    let text = replace_with(&text, cached_regex!(r"\[([^\]]+)\]\(([^)\s]+)\)"), |caps| {
        format!("<a href=\"{}\">{}</a>", quote_attr(group(caps, 2)), group(caps, 1))
    });
    let text = replace_with(&text, cached_regex!(r"\*\*(.+?)\*\*|__(.+?)__"), |caps| {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<strong>{inner}</strong>")
    });
    let text = replace_with(&text, cached_regex!(r"\*([^*\s][^*]*)\*|\b_([^_]+)_\b"), |caps| {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("<em>{inner}</em>")
    });
    let text = replace_with(&text, cached_regex!(r"~~(.+?)~~"), |caps| format!("<s>{}</s>", group(caps, 1)));
    stash.restore(text)
}

struct MdItem {
    indent: usize,
    ordered: bool,
    number: usize,
    task: Option<bool>,
    text: String,
}

fn parse_list_line(line: &str) -> Option<MdItem> {
    let caps = cached_regex!(r"^(\s*)([-*+]|(\d+)[.)])\s+(.*)$")?.captures(line)?;
    let indent = group(&caps, 1).replace('\t', "    ").len();
    let ordered = caps.get(3).is_some();
    let number = group(&caps, 3).parse().unwrap_or(1);
    let body = group(&caps, 4);
    let (task, text) = if ordered {
        (None, body)
    } else if let Some(rest) = body.strip_prefix("[ ] ") {
        (Some(false), rest)
    } else if let Some(rest) = body.strip_prefix("[x] ").or_else(|| body.strip_prefix("[X] ")) {
        (Some(true), rest)
    } else {
        (None, body)
    };
    Some(MdItem { indent, ordered, number, task, text: text.to_string() })
}

fn render_list(items: &[MdItem]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < items.len() {
        let head = &items[i];
        let kind = (head.ordered, head.task.is_some());
        match kind {
            (true, _) if head.number != 1 => out.push_str(&format!("<ol start=\"{}\">", head.number)),
            (true, _) => out.push_str("<ol>"),
            (false, true) => out.push_str("<ul data-type=\"taskList\">"),
            (false, false) => out.push_str("<ul>"),
        }
        while i < items.len() && items[i].indent <= head.indent && (items[i].ordered, items[i].task.is_some()) == kind {
            let item = &items[i];
            i += 1;
            let mut j = i;
            while j < items.len() && items[j].indent > item.indent {
                j += 1;
            }
            match item.task {
                Some(checked) => out.push_str(&format!("<li data-type=\"taskItem\" data-checked=\"{checked}\">")),
                None => out.push_str("<li>"),
            }
            out.push_str(&format!("<p>{}</p>", inline_markdown(&item.text)));
            out.push_str(&render_list(&items[i..j]));
            out.push_str("</li>");
            i = j;
        }
        out.push_str(if kind.0 { "</ol>" } else { "</ul>" });
    }
    out
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && (compact.chars().all(|c| c == '-') || compact.chars().all(|c| c == '*') || compact.chars().all(|c| c == '_'))
}

fn is_table_separator(line: &str) -> bool {
    cached_regex!(r"^\s*\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?\s*$").map_or(false, |re| re.is_match(line))
}

fn table_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim().trim_start_matches('|').trim_end_matches('|');
    trimmed.split('|').map(|c| inline_markdown(c.trim())).collect()
}

fn flush_paragraph(out: &mut String, buf: &mut Vec<String>) {
    if buf.is_empty() {
        return;
    }
    let mut html = String::new();
    for (idx, line) in buf.iter().enumerate() {
        if idx > 0 {
            html.push(if buf[idx - 1].ends_with("  ") { '\u{0}' } else { ' ' });
        }
        html.push_str(&inline_markdown(line.trim()));
    }
    out.push_str(&format!("<p>{}</p>", html.replace('\u{0}', "<br>")));
    buf.clear();
}

pub fn markdown_to_html(md: &str) -> String {
    let lines: Vec<&str> = md.lines().collect();
    let mut out = String::new();
    let mut para: Vec<String> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end_matches('\r');
        let trimmed = line.trim();

        if let Some(fence) = trimmed.strip_prefix("```") {
            flush_paragraph(&mut out, &mut para);
            let lang = fence.trim();
            let mut code = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code.push(lines[i].trim_end_matches('\r'));
                i += 1;
            }
            i += 1;
            if lang.is_empty() {
                out.push_str("<pre><code>");
            } else {
                out.push_str(&format!("<pre><code class=\"language-{}\">", escape_attr(lang)));
            }
            out.push_str(&escape_text(&code.join("\n")));
            out.push_str("</code></pre>");
            continue;
        }
        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut para);
            i += 1;
            continue;
        }
        if let Some(caps) = cached_regex!(r"^(#{1,6})\s+(.*?)\s*#*\s*$").and_then(|re| re.captures(trimmed)) {
            flush_paragraph(&mut out, &mut para);
            let level = group(&caps, 1).len();
            out.push_str(&format!("<h{level}>{}</h{level}>", inline_markdown(group(&caps, 2))));
            i += 1;
            continue;
        }
        if is_rule(trimmed) && para.is_empty() {
            out.push_str("<hr>");
            i += 1;
            continue;
        }
        if trimmed.starts_with('>') {
            flush_paragraph(&mut out, &mut para);
            let mut quoted = Vec::new();
            while i < lines.len() && lines[i].trim_start().starts_with('>') {
                let inner = lines[i].trim_start().trim_start_matches('>');
                quoted.push(inner.strip_prefix(' ').unwrap_or(inner).to_string());
                i += 1;
            }
            out.push_str(&format!("<blockquote>{}</blockquote>", markdown_to_html(&quoted.join("\n"))));
            continue;
        }
        if trimmed.starts_with('|') && lines.get(i + 1).map_or(false, |next| is_table_separator(next)) {
            flush_paragraph(&mut out, &mut para);
            out.push_str("<table><tbody><tr>");
            for cell in table_cells(trimmed) {
                out.push_str(&format!("<th><p>{cell}</p></th>"));
            }
            out.push_str("</tr>");
            i += 2;
            while i < lines.len() && lines[i].trim().starts_with('|') {
                out.push_str("<tr>");
                for cell in table_cells(lines[i]) {
                    out.push_str(&format!("<td><p>{cell}</p></td>"));
                }
                out.push_str("</tr>");
                i += 1;
            }
            out.push_str("</tbody></table>");
            continue;
        }
        if let Some(first) = parse_list_line(line) {
            flush_paragraph(&mut out, &mut para);
            let mut items = vec![first];
            i += 1;
            while i < lines.len() {
                match parse_list_line(lines[i]) {
                    Some(item) => items.push(item),
                    None if !lines[i].trim().is_empty() && lines[i].starts_with(char::is_whitespace) => {
                        if let Some(last) = items.last_mut() {
                            last.text.push(' ');
                            last.text.push_str(lines[i].trim());
                        }
                    }
                    None => break,
                }
                i += 1;
            }
            let base = items.iter().map(|it| it.indent).min().unwrap_or(0);
            for item in items.iter_mut() {
                item.indent -= base;
            }
            out.push_str(&render_list(&items));
            continue;
        }
        para.push(line.to_string());
        i += 1;
    }
    flush_paragraph(&mut out, &mut para);
    out
}
