/// Compiles a regex once per call site. `None` only if the pattern is invalid.
macro_rules! cached_regex {
    ($pattern:expr) => {{
        static CELL: std::sync::OnceLock<Option<regex_lite::Regex>> = std::sync::OnceLock::new();
        CELL.get_or_init(|| regex_lite::Regex::new($pattern).ok()).as_ref()
    }};
}

mod ast;
mod autolink;
mod commands;
mod config;
mod container;
mod dialog_image;
mod dialog_link;
mod dialog_table;
mod dom;
mod editor;
mod export;
mod font_size;
mod history;
mod inline;
mod io_any;
mod io_html;
mod io_json;
mod io_markdown;
mod query;
mod selection;
mod table;
mod templates;
mod toolbar;
mod transform;

pub use ast::*;
pub use autolink::*;
pub use commands::*;
pub use config::*;
pub use container::*;
pub use dialog_image::*;
pub use dialog_link::*;
pub use dialog_table::*;
pub use dom::*;
pub use editor::*;
pub use export::*;
pub use font_size::*;
pub use history::*;
pub use inline::*;
pub use io_any::*;
pub use io_html::*;
pub use io_json::*;
pub use io_markdown::*;
pub use query::*;
pub use selection::*;
pub use table::*;
pub use templates::*;
pub use toolbar::*;
pub(crate) use transform::{nearest_ancestor, Transaction};
