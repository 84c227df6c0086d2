pub const DEFAULT_FONT_SIZE: &str = "14px";

pub const FONT_SIZES: [&str; 10] = ["12px", "14px", "16px", "18px", "20px", "24px", "28px", "32px", "36px", "48px"];

pub const FONT_FAMILIES: [(&str, &str); 6] = [
    ("Default", ""),
    ("Inter", "Inter, sans-serif"),
    ("Serif", "Georgia, serif"),
    ("Monospace", "ui-monospace, monospace"),
    ("Comic Sans", "\"Comic Sans MS\", \"Comic Sans\", cursive"),
    ("Cursive", "cursive"),
];

/// Size a heading renders at when it carries no explicit font-size mark.
pub fn heading_font_size(level: u8) -> &'static str {
    match level {
        1 => "40px",
        2 => "32px",
        3 => "28px",
        4 => "24px",
        5 => "20px",
        _ => "18px",
    }
}

/// Accepts `16`, `16px`, `1.5em`, `120%`; bare numbers become pixels.
pub fn normalize_font_size(raw: &str) -> Option<String> {
    let raw = raw.trim().to_ascii_lowercase();
    if raw.is_empty() {
        return None;
    }
    let unit_at = raw.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(raw.len());
    let (number, unit) = raw.split_at(unit_at);
    let value: f32 = number.parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    match unit {
        "" => Some(format!("{number}px")),
        "px" | "em" | "rem" | "pt" | "%" => Some(raw.clone()),
        _ => None,
    }
}
