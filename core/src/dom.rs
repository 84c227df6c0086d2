//! Forgiving HTML fragment parser. Good enough for editor output, pasted
//! markup and imported files; not a conforming HTML5 tree builder.

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HtmlElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Value of a CSS property from the inline `style` attribute.
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.attr("style")?;
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            if key.trim().eq_ignore_ascii_case(property) {
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            } else {
                None
            }
        })
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        push_text(&self.children, &mut out);
        out
    }
}

fn push_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(el) if el.tag == "br" => out.push('\n'),
            HtmlNode::Element(el) => push_text(&el.children, out),
        }
    }
}

const VOID_TAGS: [&str; 12] = ["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr"];
const RAW_TEXT_TAGS: [&str; 4] = ["script", "style", "template", "textarea"];
const BLOCK_TAGS: [&str; 25] = [
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "pre", "section", "table", "ul",
];

#[derive(Debug)]
enum Token {
    Start { tag: String, attrs: Vec<(String, String)>, self_closing: bool },
    End(String),
    Text(String),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Parses a start or end tag at the beginning of `s` (which starts with `<`).
fn read_tag(s: &str) -> Option<(Token, usize)> {
    let body = &s[1..];
    let (closing, body, offset) = match body.strip_prefix('/') {
        Some(rest) => (true, rest, 2),
        None => (false, body, 1),
    };
    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_len = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
    let tag = body[..name_len].to_ascii_lowercase();
    let mut rest = &body[name_len..];
    let mut consumed = offset + name_len;
    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        let trimmed = rest.trim_start();
        consumed += rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() {
            break;
        }
        if rest.starts_with("/>") {
            self_closing = true;
            consumed += 2;
            break;
        }
        if rest.starts_with('>') {
            consumed += 1;
            break;
        }
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len())
            .max(1);
        let name = rest[..name_len].to_ascii_lowercase();
        consumed += name_len;
        rest = &rest[name_len..];
        let trimmed = rest.trim_start();
        let mut value = String::new();
        if let Some(after_eq) = trimmed.strip_prefix('=') {
            let after_eq_trimmed = after_eq.trim_start();
            consumed += rest.len() - after_eq_trimmed.len();
            rest = after_eq_trimmed;
            match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &rest[1..];
                    let end = inner.find(quote).unwrap_or(inner.len());
                    value = decode_entities(&inner[..end]);
                    let used = (1 + end + 1).min(rest.len());
                    consumed += used;
                    rest = &rest[used..];
                }
                _ => {
                    let end = rest.find(|c: char| c.is_whitespace() || c == '>').unwrap_or(rest.len());
                    value = decode_entities(&rest[..end]);
                    consumed += end;
                    rest = &rest[end..];
                }
            }
        }
        if name != "/" && !closing {
            attrs.push((name, value));
        }
    }
    let token = if closing { Token::End(tag) } else { Token::Start { tag, attrs, self_closing } };
    Some((token, consumed.min(s.len())))
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = html;
    let mut text = String::new();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = rest.find('>').map(|end| &rest[end + 1..]).unwrap_or("");
            continue;
        }
        if rest.starts_with('<') {
            if let Some((token, used)) = read_tag(rest) {
                if !text.is_empty() {
                    tokens.push(Token::Text(decode_entities(&std::mem::take(&mut text))));
                }
                rest = &rest[used..];
                if let Token::Start { tag, self_closing: false, .. } = &token {
                    if RAW_TEXT_TAGS.contains(&tag.as_str()) {
                        let close = format!("</{tag}");
                        rest = match find_ignore_case(rest, &close) {
                            Some(at) => {
                                let tail = &rest[at..];
                                tail.find('>').map(|end| &tail[end + 1..]).unwrap_or("")
                            }
                            None => "",
                        };
                        continue;
                    }
                }
                tokens.push(token);
                continue;
            }
        }
        // a stray '<' that does not open a tag stays text
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
        text.push_str(&rest[..end]);
        rest = &rest[end..];
    }
    if !text.is_empty() {
        tokens.push(Token::Text(decode_entities(&text)));
    }
    tokens
}

struct TreeBuilder {
    root: Vec<HtmlNode>,
    stack: Vec<HtmlElement>,
}

impl TreeBuilder {
    fn push_node(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn pop(&mut self) {
        if let Some(el) = self.stack.pop() {
            self.push_node(HtmlNode::Element(el));
        }
    }

    fn open_index(&self, tag: &str, boundaries: &[&str]) -> Option<usize> {
        for (idx, el) in self.stack.iter().enumerate().rev() {
            if el.tag == tag {
                return Some(idx);
            }
            if boundaries.contains(&el.tag.as_str()) {
                return None;
            }
        }
        None
    }

    fn close_to(&mut self, idx: usize) {
        while self.stack.len() > idx {
            self.pop();
        }
    }

    fn close_implied(&mut self, tag: &str) {
        let targets: &[(&str, &[&str])] = match tag {
            "li" => &[("li", &["ul", "ol"])],
            "tr" => &[("tr", &["table"])],
            "td" | "th" => &[("td", &["tr", "table"]), ("th", &["tr", "table"])],
            "thead" | "tbody" | "tfoot" => &[("thead", &["table"]), ("tbody", &["table"]), ("tfoot", &["table"])],
            "p" => &[("p", &["li", "td", "th", "blockquote", "div"])],
            t if BLOCK_TAGS.contains(&t) => &[("p", &["li", "td", "th", "blockquote", "div"])],
            _ => &[],
        };
        for (target, boundaries) in targets {
            if let Some(idx) = self.open_index(target, boundaries) {
                self.close_to(idx);
            }
        }
    }

    fn start(&mut self, tag: String, attrs: Vec<(String, String)>, self_closing: bool) {
        self.close_implied(&tag);
        let el = HtmlElement { tag, attrs, children: Vec::new() };
        if self_closing || VOID_TAGS.contains(&el.tag.as_str()) {
            self.push_node(HtmlNode::Element(el));
        } else {
            self.stack.push(el);
        }
    }

    fn end(&mut self, tag: &str) {
        if let Some(idx) = self.stack.iter().rposition(|el| el.tag == tag) {
            self.close_to(idx);
        }
    }

    fn finish(mut self) -> Vec<HtmlNode> {
        self.close_to(0);
        self.root
    }
}

pub fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let mut builder = TreeBuilder { root: Vec::new(), stack: Vec::new() };
    for token in tokenize(html) {
        match token {
            Token::Start { tag, attrs, self_closing } => builder.start(tag, attrs, self_closing),
            Token::End(tag) => builder.end(&tag),
            Token::Text(text) => builder.push_node(HtmlNode::Text(text)),
        }
    }
    builder.finish()
}

pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let end = rest[1..].find(|c: char| c == ';' || c == '&' || c.is_whitespace()).map(|i| i + 1);
        let decoded = match end {
            Some(end) if rest[end..].starts_with(';') => decode_entity(&rest[1..end]).map(|c| (c, end + 1)),
            _ => None,
        };
        match decoded {
            Some((c, used)) => {
                out.push(c);
                rest = &rest[used..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        _ => return None,
    })
}

pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}
