use crate::{escape_text, markdown_to_html};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Html,
    Text,
    Markdown,
}

impl ImportKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension().and_then(|s| s.to_str()).unwrap_or("").to_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(ImportKind::Html),
            "txt" => Some(ImportKind::Text),
            "md" | "markdown" => Some(ImportKind::Markdown),
            _ => None,
        }
    }
}

/// Converts an imported file's contents into editor HTML. Unknown extensions
/// yield `None` and leave the document alone.
pub fn import_file(name: &str, contents: &str) -> Option<String> {
    let kind = ImportKind::from_file_name(name)?;
    info!(file = name, ?kind, bytes = contents.len(), "importing file");
    Some(match kind {
        ImportKind::Html => contents.to_string(),
        ImportKind::Text => import_plaintext(contents),
        ImportKind::Markdown => markdown_to_html(contents),
    })
}

/// Reads a file from disk and converts it like [`import_file`].
pub fn import_any(path: &Path) -> Result<String, ImportError> {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    if ImportKind::from_file_name(&name).is_none() {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_lowercase();
        return Err(ImportError::Unsupported(ext));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|source| ImportError::Io { path: path.display().to_string(), source })?;
    import_file(&name, &raw).ok_or(ImportError::Unsupported(name))
}

/// One paragraph per line; blank lines stay as empty paragraphs.
pub fn import_plaintext(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                "<p></p>".to_string()
            } else {
                format!("<p>{}</p>", escape_text(line))
            }
        })
        .collect()
}
