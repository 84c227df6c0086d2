use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use pe_core::{
    export_json_into, export_markdown, find_autolinks, import_markdown, parse_html, to_html, Document,
    DocumentCommands, Editor, EditorCommand, Mark, Selection,
};

fn build_post(sections: usize) -> String {
    let mut html = String::new();
    for i in 0..sections {
        html.push_str(&format!(
            "<h2>Section {i}</h2>\
<p>Some <strong>bold</strong> and <em>italic</em> text with <a href=\"https://example.com/{i}\">a link</a> \
and a bare www.example.org/{i} reference.</p>\
<ul><li><p>first</p></li><li><p>second <code>inline</code></p></li></ul>\
<pre><code class=\"language-rust\">fn main() {{ println!(\"{i}\"); }}</code></pre>\
<table><tbody><tr><th><p>A</p></th><th><p>B</p></th></tr><tr><td><p>1</p></td><td><p>2</p></td></tr></tbody></table>"
        ));
    }
    html
}

fn parse_post(c: &mut Criterion) {
    let html = build_post(200);
    c.bench_function("parse_html_200_sections", |b| b.iter(|| parse_html(&html)));
}

fn serialize_post(c: &mut Criterion) {
    let doc = Document::from_blocks(parse_html(&build_post(200)));
    c.bench_function("to_html_200_sections", |b| b.iter(|| to_html(&doc)));
}

fn markdown_round_trip(c: &mut Criterion) {
    let doc = Document::from_blocks(parse_html(&build_post(100)));
    let md = export_markdown(&doc);
    c.bench_function("export_markdown", |b| b.iter(|| export_markdown(&doc)));
    c.bench_function("import_markdown", |b| b.iter(|| import_markdown(&md)));
}

fn serialize_json(c: &mut Criterion) {
    let doc = Document::from_blocks(parse_html(&build_post(200)));
    let mut buf = Vec::with_capacity(64 * 1024);
    c.bench_function("serialize_json", |b| {
        b.iter(|| {
            export_json_into(&doc, &mut buf).unwrap();
        })
    });
}

fn scan_autolinks(c: &mut Criterion) {
    let doc = Document::from_blocks(parse_html(&build_post(200)));
    c.bench_function("find_autolinks", |b| b.iter(|| find_autolinks(&doc)));
}

fn typing_latency(c: &mut Criterion) {
    let mut editor = Editor::from_html(&build_post(50));
    editor.set_selection(Selection::collapsed(3));
    c.bench_function("typing_latency", |b| {
        b.iter(|| {
            editor.execute(EditorCommand::InsertText("x".to_string()));
        })
    });
}

fn toggle_bold_and_undo(c: &mut Criterion) {
    let html = build_post(50);
    c.bench_function("toggle_bold_undo_100", |b| {
        b.iter_batched(
            || {
                let mut editor = Editor::from_html(&html);
                editor.select_all();
                editor
            },
            |mut editor| {
                for _ in 0..100 {
                    editor.execute(EditorCommand::ToggleMark(Mark::Bold));
                }
                while editor.undo() {}
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    parse_post,
    serialize_post,
    markdown_round_trip,
    serialize_json,
    scan_autolinks,
    typing_latency,
    toggle_bold_and_undo
);
criterion_main!(benches);
