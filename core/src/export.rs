use crate::{escape_text, html_to_markdown};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_CSS: &str = "body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;\
line-height:1.6;max-width:800px;margin:0 auto;padding:2rem;color:#1f2937}\
h1,h2,h3,h4,h5,h6{line-height:1.25;margin:1.5em 0 .5em}\
img{max-width:100%;height:auto}\
pre{background:#f3f4f6;padding:1rem;border-radius:6px;overflow-x:auto}\
code{font-family:ui-monospace,monospace;font-size:.9em}\
blockquote{border-left:4px solid #d1d5db;margin:1em 0;padding-left:1em;color:#4b5563}\
table{border-collapse:collapse;width:100%;margin:1em 0}\
th,td{border:1px solid #d1d5db;padding:.5rem;text-align:left}\
th{background:#f9fafb}\
ul[data-type=taskList]{list-style:none;padding-left:0}\
ul[data-type=taskList] li{display:flex;gap:.5rem}\
mark{border-radius:2px;padding:0 2px}";

const PRINT_CSS: &str = "@media print{body{max-width:none;padding:0}\
a{color:inherit;text-decoration:underline}\
pre,blockquote,table,img{page-break-inside:avoid}\
h1,h2,h3{page-break-after:avoid}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Html,
    Markdown,
    Word,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "md",
            ExportFormat::Word => "doc",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Word => "application/msword",
        }
    }
}

/// A produced download: name, MIME type and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: String,
    pub contents: String,
}

/// Lowercase ASCII slug of a post title; falls back to `post`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug.to_string()
    }
}

pub fn export_html_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{}</title>\n<style>{BASE_CSS}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_text(title)
    )
}

pub fn export_word_document(body: &str, title: &str) -> String {
    format!(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
xmlns:w=\"urn:schemas-microsoft-com:office:word\" \
xmlns=\"http://www.w3.org/TR/REC-html40\">\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n\
<!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View><w:Zoom>100</w:Zoom></w:WordDocument></xml><![endif]-->\n\
<style>{BASE_CSS}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_text(title)
    )
}

pub fn export_file(format: ExportFormat, body: &str, title: &str) -> ExportedFile {
    let contents = match format {
        ExportFormat::Html => export_html_document(body, title),
        ExportFormat::Markdown => html_to_markdown(body),
        ExportFormat::Word => export_word_document(body, title),
    };
    ExportedFile {
        file_name: format!("{}.{}", slugify(title), format.extension()),
        mime_type: format.mime_type().to_string(),
        contents,
    }
}

/// Print-ready page plus how long the host should wait before opening the
/// print dialog so images can load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub html: String,
    pub delay: Duration,
}

pub fn print_document(body: &str, title: &str, delay: Duration) -> PrintJob {
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n\
<style>{BASE_CSS}{PRINT_CSS}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_text(title)
    );
    PrintJob { html, delay }
}
