use pe_core::{export_json, parse_html, to_html, Document, PostEditor};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() {
    let _profiler = dhat::Profiler::new_heap();
    let mut html = String::new();
    for i in 0..2000 {
        html.push_str(&format!("<p>Paragraph {i}: <strong>{}</strong></p>", "text ".repeat(10)));
    }
    let doc = Document::from_blocks(parse_html(&html));
    let _ = to_html(&doc);
    let _ = export_json(&doc).unwrap();
    let post = PostEditor::from_html(&html);
    let _ = post.autolinks();
}
