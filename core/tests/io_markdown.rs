use pe_core::{export_markdown, html_to_markdown, import_markdown, markdown_to_html, parse_html, to_html, Document};

fn doc(html: &str) -> Document {
    Document::from_blocks(parse_html(html))
}

#[test]
fn headings_emphasis_and_links_round_trip() {
    let html = r#"<h1>Title</h1><p>Some <strong>bold</strong> and <em>italic</em> with <a href="https://example.com">a link</a>.</p>"#;
    let md = export_markdown(&doc(html));
    assert_eq!(md, "# Title\n\nSome **bold** and *italic* with [a link](https://example.com).");
    assert_eq!(to_html(&import_markdown(&md)), html);
}

#[test]
fn nested_lists_export_with_indentation() {
    let html = "<ul><li><p>one</p><ul><li><p>nested</p></li></ul></li><li><p>two</p></li></ul>";
    assert_eq!(html_to_markdown(html), "- one\n  - nested\n- two");
    assert_eq!(to_html(&import_markdown("- one\n  - nested\n- two")), html);
}

#[test]
fn ordered_list_keeps_its_start() {
    let md = "3. three\n4. four";
    assert_eq!(markdown_to_html(md), "<ol start=\"3\"><li><p>three</p></li><li><p>four</p></li></ol>");
}

#[test]
fn task_items_export_checkboxes() {
    let html = to_html(&doc(
        r#"<ul data-type="taskList"><li data-type="taskItem" data-checked="true"><p>done</p></li><li data-type="taskItem" data-checked="false"><p>todo</p></li></ul>"#,
    ));
    assert_eq!(html_to_markdown(&html), "- [x] done\n- [ ] todo");
}

#[test]
fn code_fences_keep_language_and_escape_text() {
    let md = html_to_markdown(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#);
    assert_eq!(md, "```rust\nfn main() {}\n```");

    let imported = import_markdown("```rust\nlet a = 1 < 2;\n```");
    assert_eq!(to_html(&imported), r#"<pre><code class="language-rust">let a = 1 &lt; 2;</code></pre>"#);
}

#[test]
fn tables_convert_both_ways() {
    let html = "<table><tbody><tr><th><p>A</p></th><th><p>B</p></th></tr><tr><td><p>1</p></td><td><p>2</p></td></tr></tbody></table>";
    let md = html_to_markdown(html);
    assert_eq!(md, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    assert_eq!(to_html(&import_markdown(&md)), html);
}

#[test]
fn unsupported_formatting_degrades_to_text() {
    let md = html_to_markdown(r#"<p><u>under</u> <span style="color: red">red</span></p>"#);
    assert_eq!(md, "under red");
}

#[test]
fn blockquotes_breaks_and_inline_code() {
    assert_eq!(html_to_markdown("<blockquote><p>quoted</p></blockquote>"), "> quoted");
    assert_eq!(to_html(&import_markdown("> quoted")), "<blockquote><p>quoted</p></blockquote>");
    assert_eq!(markdown_to_html("line one  \nline two"), "<p>line one<br>line two</p>");
    assert_eq!(to_html(&import_markdown("use `a < b` here")), "<p>use <code>a &lt; b</code> here</p>");
}
