use crate::{
    escape_attr, escape_text, parse_fragment, trim_content, Block, Document, Highlight, HtmlElement, HtmlNode, Inline,
    LinkAttrs, Marks, TextAlign,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn to_html(doc: &Document) -> String {
    blocks_to_html(&doc.blocks)
}

pub fn blocks_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block);
    }
    out
}

fn align_attr(align: &Option<TextAlign>) -> String {
    match align {
        Some(a) => format!(" style=\"text-align: {}\"", a.as_str()),
        None => String::new(),
    }
}

fn write_children(out: &mut String, children: &[Block]) {
    for child in children {
        write_block(out, child);
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { align, content, .. } => {
            out.push_str(&format!("<p{}>", align_attr(align)));
            write_inlines(out, content);
            out.push_str("</p>");
        }
        Block::Heading { level, align, content, .. } => {
            out.push_str(&format!("<h{level}{}>", align_attr(align)));
            write_inlines(out, content);
            out.push_str(&format!("</h{level}>"));
        }
        Block::CodeBlock { language, content, .. } => {
            match language {
                Some(lang) => out.push_str(&format!("<pre><code class=\"language-{}\">", escape_attr(lang))),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_text(&crate::plain_text(content)));
            out.push_str("</code></pre>");
        }
        Block::Blockquote { children, .. } => {
            out.push_str("<blockquote>");
            write_children(out, children);
            out.push_str("</blockquote>");
        }
        Block::BulletList { children, .. } => {
            out.push_str("<ul>");
            write_children(out, children);
            out.push_str("</ul>");
        }
        Block::OrderedList { start, children, .. } => {
            if *start == 1 {
                out.push_str("<ol>");
            } else {
                out.push_str(&format!("<ol start=\"{start}\">"));
            }
            write_children(out, children);
            out.push_str("</ol>");
        }
        Block::TaskList { children, .. } => {
            out.push_str("<ul data-type=\"taskList\">");
            write_children(out, children);
            out.push_str("</ul>");
        }
        Block::ListItem { children, .. } => {
            out.push_str("<li>");
            write_children(out, children);
            out.push_str("</li>");
        }
        Block::TaskItem { checked, children, .. } => {
            out.push_str(&format!("<li data-type=\"taskItem\" data-checked=\"{checked}\">"));
            out.push_str("<label><input type=\"checkbox\"");
            if *checked {
                out.push_str(" checked=\"checked\"");
            }
            out.push_str("><span></span></label><div>");
            write_children(out, children);
            out.push_str("</div></li>");
        }
        Block::Table { children, .. } => {
            out.push_str("<table><tbody>");
            write_children(out, children);
            out.push_str("</tbody></table>");
        }
        Block::TableRow { children, .. } => {
            out.push_str("<tr>");
            write_children(out, children);
            out.push_str("</tr>");
        }
        Block::TableCell { header, colspan, rowspan, children, .. } => {
            let tag = if *header { "th" } else { "td" };
            out.push('<');
            out.push_str(tag);
            if *colspan != 1 {
                out.push_str(&format!(" colspan=\"{colspan}\""));
            }
            if *rowspan != 1 {
                out.push_str(&format!(" rowspan=\"{rowspan}\""));
            }
            out.push('>');
            write_children(out, children);
            out.push_str(&format!("</{tag}>"));
        }
        Block::HorizontalRule { .. } => out.push_str("<hr>"),
    }
}

/// Opening tag plus closing tag for each mark of a run, outermost first.
fn mark_tags(marks: &Marks) -> Vec<(String, &'static str)> {
    let mut tags = Vec::new();
    if let Some(link) = &marks.link {
        let mut open = format!("<a href=\"{}\"", escape_attr(&link.href));
        if let Some(target) = &link.target {
            open.push_str(&format!(" target=\"{}\"", escape_attr(target)));
        }
        if let Some(rel) = &link.rel {
            open.push_str(&format!(" rel=\"{}\"", escape_attr(rel)));
        }
        open.push('>');
        tags.push((open, "</a>"));
    }
    let simple = [
        (marks.bold, "<strong>", "</strong>"),
        (marks.italic, "<em>", "</em>"),
        (marks.underline, "<u>", "</u>"),
        (marks.strike, "<s>", "</s>"),
        (marks.subscript, "<sub>", "</sub>"),
        (marks.superscript, "<sup>", "</sup>"),
    ];
    for (on, open, close) in simple {
        if on {
            tags.push((open.to_string(), close));
        }
    }
    if let Some(highlight) = &marks.highlight {
        let open = match &highlight.color {
            Some(color) => format!(
                "<mark data-color=\"{0}\" style=\"background-color: {0}; color: inherit\">",
                escape_attr(color)
            ),
            None => "<mark>".to_string(),
        };
        tags.push((open, "</mark>"));
    }
    if marks.has_text_style() {
        let mut styles = Vec::new();
        if let Some(color) = &marks.color {
            styles.push(format!("color: {color}"));
        }
        if let Some(family) = &marks.font_family {
            styles.push(format!("font-family: {family}"));
        }
        if let Some(size) = &marks.font_size {
            styles.push(format!("font-size: {size}"));
        }
        tags.push((format!("<span style=\"{}\">", escape_attr(&styles.join("; "))), "</span>"));
    }
    if marks.code {
        tags.push(("<code>".to_string(), "</code>"));
    }
    tags
}

fn write_inlines(out: &mut String, content: &[Inline]) {
    let mut open: Vec<(String, &'static str)> = Vec::new();
    for inline in content {
        let wanted = match inline {
            Inline::Text { marks, .. } => mark_tags(marks),
            Inline::HardBreak => open.clone(),
            Inline::Image { .. } => Vec::new(),
        };
        let keep = open.iter().zip(wanted.iter()).take_while(|(a, b)| a.0 == b.0).count();
        while open.len() > keep {
            if let Some((_, close)) = open.pop() {
                out.push_str(close);
            }
        }
        for tag in wanted.into_iter().skip(keep) {
            out.push_str(&tag.0);
            open.push(tag);
        }
        match inline {
            Inline::Text { value, .. } => out.push_str(&escape_text(value)),
            Inline::HardBreak => out.push_str("<br>"),
            Inline::Image { src, alt, title } => {
                out.push_str(&format!("<img src=\"{}\"", escape_attr(src)));
                if let Some(alt) = alt {
                    out.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
                }
                if let Some(title) = title {
                    out.push_str(&format!(" title=\"{}\"", escape_attr(title)));
                }
                out.push('>');
            }
        }
    }
    while let Some((_, close)) = open.pop() {
        out.push_str(close);
    }
}

// ---- parsing ----

/// Parses serialized HTML into blocks. Unknown markup degrades to its text.
pub fn parse_html(html: &str) -> Vec<Block> {
    let nodes = parse_fragment(html);
    let mut blocks = blocks_from(&nodes);
    if blocks.is_empty() {
        blocks.push(Block::empty_paragraph());
    }
    blocks
}

const SKIPPED: [&str; 6] = ["head", "title", "meta", "link", "input", "label"];
const TRANSPARENT: [&str; 15] = [
    "html", "body", "div", "section", "article", "header", "footer", "main", "aside", "nav", "figure", "thead",
    "tbody", "tfoot", "form",
];

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre" | "blockquote" | "ul" | "ol" | "li" | "table" | "tr"
            | "td" | "th" | "hr"
    ) || TRANSPARENT.contains(&tag)
        || SKIPPED.contains(&tag)
}

fn flush_loose(loose: &mut Vec<Inline>, out: &mut Vec<Block>) {
    if loose.is_empty() {
        return;
    }
    let mut content = std::mem::take(loose);
    trim_content(&mut content);
    if !content.is_empty() {
        out.push(Block::paragraph(content));
    }
}

fn blocks_from(nodes: &[HtmlNode]) -> Vec<Block> {
    let mut out = Vec::new();
    let mut loose = Vec::new();
    for node in nodes {
        let el = match node {
            HtmlNode::Element(el) if is_block_tag(&el.tag) => el,
            other => {
                collect_inlines(std::slice::from_ref(other), &Marks::default(), &mut loose);
                continue;
            }
        };
        flush_loose(&mut loose, &mut out);
        if SKIPPED.contains(&el.tag.as_str()) {
            continue;
        }
        if TRANSPARENT.contains(&el.tag.as_str()) {
            out.extend(blocks_from(&el.children));
            continue;
        }
        if let Some(block) = block_from(el) {
            out.push(block);
        }
    }
    flush_loose(&mut loose, &mut out);
    out
}

fn align_of(el: &HtmlElement) -> Option<TextAlign> {
    el.style("text-align").and_then(|v| TextAlign::parse(&v)).or_else(|| el.attr("align").and_then(TextAlign::parse))
}

fn textblock_content(el: &HtmlElement) -> Vec<Inline> {
    let mut content = Vec::new();
    collect_inlines(&el.children, &Marks::default(), &mut content);
    trim_content(&mut content);
    content
}

fn list_items(el: &HtmlElement, task: bool) -> Vec<Block> {
    let mut items = Vec::new();
    let mut stray = Vec::new();
    for child in &el.children {
        match child {
            HtmlNode::Element(li) if li.tag == "li" => {
                if !stray.is_empty() {
                    let blocks = blocks_from(&std::mem::take(&mut stray));
                    if !blocks.is_empty() {
                        items.push(Block::list_item(blocks));
                    }
                }
                items.push(list_item(li, task));
            }
            other => stray.push(other.clone()),
        }
    }
    let blocks = blocks_from(&stray);
    if !blocks.is_empty() {
        items.push(Block::list_item(blocks));
    }
    items
}

fn list_item(li: &HtmlElement, task: bool) -> Block {
    let children = blocks_from(&li.children);
    let is_task = task || li.attr("data-type") == Some("taskItem");
    if is_task {
        let checked = match li.attr("data-checked") {
            Some(v) => v == "true",
            None => li.children.iter().any(|c| has_checked_box(c)),
        };
        Block::task_item(checked, children)
    } else {
        Block::list_item(children)
    }
}

fn has_checked_box(node: &HtmlNode) -> bool {
    match node {
        HtmlNode::Element(el) if el.tag == "input" => el.attr("checked").is_some(),
        HtmlNode::Element(el) if el.tag == "label" => el.children.iter().any(has_checked_box),
        _ => false,
    }
}

fn table_rows(el: &HtmlElement, out: &mut Vec<Block>) {
    for child in &el.children {
        let HtmlNode::Element(child) = child else { continue };
        match child.tag.as_str() {
            "thead" | "tbody" | "tfoot" => table_rows(child, out),
            "tr" => {
                let cells = child
                    .children
                    .iter()
                    .filter_map(|c| match c {
                        HtmlNode::Element(cell) if cell.tag == "td" || cell.tag == "th" => Some(table_cell(cell)),
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                out.push(Block::TableRow { id: Uuid::new_v4(), children: cells });
            }
            _ => {}
        }
    }
}

fn span_attr(el: &HtmlElement, name: &str) -> u32 {
    el.attr(name).and_then(|v| v.trim().parse().ok()).filter(|v| *v > 0).unwrap_or(1)
}

fn table_cell(cell: &HtmlElement) -> Block {
    Block::TableCell {
        id: Uuid::new_v4(),
        header: cell.tag == "th",
        colspan: span_attr(cell, "colspan"),
        rowspan: span_attr(cell, "rowspan"),
        children: blocks_from(&cell.children),
    }
}

fn code_language(pre: &HtmlElement) -> Option<String> {
    let from_class = |el: &HtmlElement| {
        el.attr("class")?
            .split_whitespace()
            .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
            .map(str::to_string)
    };
    let code = pre.children.iter().find_map(|c| match c {
        HtmlNode::Element(el) if el.tag == "code" => Some(el),
        _ => None,
    });
    code.and_then(from_class).or_else(|| from_class(pre)).or_else(|| pre.attr("data-language").map(str::to_string))
}

fn block_from(el: &HtmlElement) -> Option<Block> {
    let tag = el.tag.as_str();
    Some(match tag {
        "p" => Block::Paragraph { id: Uuid::new_v4(), align: align_of(el), content: textblock_content(el) },
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Block::Heading {
            id: Uuid::new_v4(),
            level: tag[1..].parse().unwrap_or(1),
            align: align_of(el),
            content: textblock_content(el),
        },
        "pre" => {
            let text = el.text_content();
            let text = text.strip_suffix('\n').unwrap_or(&text);
            Block::code_block(code_language(el).as_deref(), text)
        }
        "blockquote" => Block::Blockquote { id: Uuid::new_v4(), children: blocks_from(&el.children) },
        "ul" if el.attr("data-type") == Some("taskList") => {
            Block::TaskList { id: Uuid::new_v4(), children: list_items(el, true) }
        }
        "ul" => Block::BulletList { id: Uuid::new_v4(), children: list_items(el, false) },
        "ol" => Block::OrderedList {
            id: Uuid::new_v4(),
            start: el.attr("start").and_then(|v| v.trim().parse().ok()).unwrap_or(1),
            children: list_items(el, false),
        },
        "li" => list_item(el, false),
        "table" => {
            let mut rows = Vec::new();
            table_rows(el, &mut rows);
            Block::Table { id: Uuid::new_v4(), children: rows }
        }
        "tr" => {
            let mut rows = Vec::new();
            let wrapper = HtmlElement { tag: "table".into(), attrs: Vec::new(), children: vec![HtmlNode::Element(el.clone())] };
            table_rows(&wrapper, &mut rows);
            Block::Table { id: Uuid::new_v4(), children: rows }
        }
        "td" | "th" => return blocks_from(&el.children).into_iter().next(),
        "hr" => Block::horizontal_rule(),
        _ => return None,
    })
}

fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn ends_with_space(content: &[Inline]) -> bool {
    match content.last() {
        Some(Inline::Text { value, .. }) => value.ends_with(' '),
        Some(Inline::HardBreak) | None => true,
        Some(Inline::Image { .. }) => false,
    }
}

fn link_attrs(el: &HtmlElement) -> Option<LinkAttrs> {
    let href = el.attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    Some(LinkAttrs {
        href: Arc::from(href),
        target: el.attr("target").filter(|t| !t.is_empty()).map(Arc::from),
        rel: el.attr("rel").filter(|r| !r.is_empty()).map(Arc::from),
    })
}

fn collect_inlines(nodes: &[HtmlNode], marks: &Marks, out: &mut Vec<Inline>) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => {
                let mut text = collapse_whitespace(text);
                if text.starts_with(' ') && ends_with_space(out) {
                    text.remove(0);
                }
                if !text.is_empty() {
                    out.push(Inline::styled(text, marks.clone()));
                }
            }
            HtmlNode::Element(el) => {
                let tag = el.tag.as_str();
                match tag {
                    "br" => {
                        if let Some(Inline::Text { value, .. }) = out.last_mut() {
                            if value.ends_with(' ') {
                                *value = Arc::from(value.trim_end_matches(' '));
                            }
                        }
                        out.push(Inline::HardBreak);
                        continue;
                    }
                    "img" => {
                        if let Some(src) = el.attr("src").filter(|s| !s.trim().is_empty()) {
                            out.push(Inline::Image {
                                src: Arc::from(src.trim()),
                                alt: el.attr("alt").filter(|a| !a.is_empty()).map(Arc::from),
                                title: el.attr("title").filter(|t| !t.is_empty()).map(Arc::from),
                            });
                        }
                        continue;
                    }
                    "input" | "label" | "script" | "style" => continue,
                    _ => {}
                }
                let mut inner = marks.clone();
                match tag {
                    "strong" | "b" => inner.bold = true,
                    "em" | "i" => inner.italic = true,
                    "u" | "ins" => inner.underline = true,
                    "s" | "strike" | "del" => inner.strike = true,
                    "sub" => {
                        inner.subscript = true;
                        inner.superscript = false;
                    }
                    "sup" => {
                        inner.superscript = true;
                        inner.subscript = false;
                    }
                    "code" | "kbd" | "tt" => inner.code = true,
                    "mark" => {
                        let color = el.attr("data-color").map(str::to_string).or_else(|| el.style("background-color"));
                        inner.highlight = Some(Highlight { color: color.map(Arc::from) });
                    }
                    "a" => {
                        if let Some(link) = link_attrs(el) {
                            inner.link = Some(link);
                        }
                    }
                    _ => {}
                }
                if let Some(color) = el.style("color").filter(|c| c != "inherit") {
                    if tag != "mark" {
                        inner.color = Some(Arc::from(color));
                    }
                }
                if let Some(family) = el.style("font-family") {
                    inner.font_family = Some(Arc::from(family));
                }
                if let Some(size) = el.style("font-size") {
                    inner.font_size = Some(Arc::from(size));
                }
                if matches!(el.style("font-weight").as_deref(), Some("bold" | "700" | "800" | "900")) {
                    inner.bold = true;
                }
                if el.style("font-style").as_deref() == Some("italic") {
                    inner.italic = true;
                }
                collect_inlines(&el.children, &inner, out);
            }
        }
    }
}
