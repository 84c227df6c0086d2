use pe_core::{parse_html, to_html, Block, Document, Inline};

fn round_trip(html: &str) -> String {
    to_html(&Document::from_blocks(parse_html(html)))
}

#[test]
fn serializer_output_is_stable() {
    let cases = [
        "<p>plain</p>",
        "<h3 style=\"text-align: right\">Side</h3>",
        "<p><strong><em>both</em></strong> and <u>under</u> <s>gone</s> H<sub>2</sub>O x<sup>2</sup></p>",
        "<ol start=\"3\"><li><p>three</p></li></ol>",
        "<blockquote><p>quoted</p></blockquote><hr><p></p>",
        "<pre><code class=\"language-js\">if (a &lt; b) {}</code></pre>",
        "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer nofollow\">site</a></p>",
    ];
    for html in cases {
        assert_eq!(round_trip(html), html, "case {html}");
    }
}

#[test]
fn task_list_round_trip() {
    let html = "<ul data-type=\"taskList\"><li data-type=\"taskItem\" data-checked=\"true\"><label><input type=\"checkbox\" checked=\"checked\"><span></span></label><div><p>done</p></div></li></ul>";
    assert_eq!(round_trip(html), html);
    let blocks = parse_html(html);
    match blocks.first().and_then(Block::children).and_then(|items| items.first()) {
        Some(Block::TaskItem { checked, .. }) => assert!(*checked),
        other => panic!("expected task item, got {other:?}"),
    }
}

#[test]
fn table_spans_survive() {
    let html = "<table><tbody><tr><th colspan=\"2\"><p>head</p></th></tr><tr><td><p>a</p></td><td><p>b</p></td></tr></tbody></table>";
    assert_eq!(round_trip(html), html);
}

#[test]
fn text_style_span_and_highlight() {
    let html = "<p><mark data-color=\"#fef08a\" style=\"background-color: #fef08a; color: inherit\">hi</mark><span style=\"color: #ef4444; font-size: 18px\">red</span></p>";
    assert_eq!(round_trip(html), html);
}

#[test]
fn loose_markup_is_tolerated() {
    let blocks = parse_html("Hello <b>there</b><p>next<p>last");
    let doc = Document::from_blocks(blocks);
    assert_eq!(doc.plain_text(), "Hello there\nnext\nlast");
    assert_eq!(to_html(&doc), "<p>Hello <strong>there</strong></p><p>next</p><p>last</p>");

    let doc = Document::from_blocks(parse_html("<script>alert(1)</script><div>kept</div>"));
    assert_eq!(doc.plain_text(), "kept");
}

#[test]
fn images_and_breaks_are_inline() {
    let blocks = parse_html("<p>a<br>b<img src=\"x.png\" alt=\"x\"></p>");
    let content = blocks[0].inline_content().unwrap();
    assert!(matches!(content[1], Inline::HardBreak));
    assert!(matches!(content[3], Inline::Image { .. }));
}

#[test]
fn entities_are_decoded_and_escaped() {
    let doc = Document::from_blocks(parse_html("<p>Tom &amp; Jerry &lt;3 &copy;</p>"));
    assert_eq!(doc.plain_text(), "Tom & Jerry <3 ©");
    assert_eq!(to_html(&doc), "<p>Tom &amp; Jerry &lt;3 ©</p>");
}
