use crate::LinkAttrs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("URL is required")]
    Empty,
    #[error("invalid URL: {0}")]
    Invalid(String),
    #[error("links are not allowed inside code blocks")]
    InCodeBlock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    #[default]
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    Current,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkTarget::Blank => "_blank",
            LinkTarget::Current => "_self",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "_self" {
            LinkTarget::Current
        } else {
            LinkTarget::Blank
        }
    }
}

fn has_scheme(raw: &str) -> bool {
    cached_regex!(r"^[A-Za-z][A-Za-z0-9+.\-]*:").is_some_and(|re| re.is_match(raw))
}

fn looks_like_domain(raw: &str) -> bool {
    cached_regex!(r"^(localhost|[A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,})(:\d+)?([/?#]\S*)?$")
        .is_some_and(|re| re.is_match(raw))
}

/// Checks a user-entered link and returns the href to store.
pub fn validate_url(raw: &str) -> Result<String, LinkError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(LinkError::Empty);
    }
    if url.chars().any(char::is_whitespace) {
        return Err(LinkError::Invalid(url.to_string()));
    }
    let lower = url.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("https://").or_else(|| lower.strip_prefix("http://")) {
        if rest.is_empty() || rest.starts_with('/') {
            return Err(LinkError::Invalid(url.to_string()));
        }
        return Ok(url.to_string());
    }
    if url.starts_with('/') && !url.starts_with("//") {
        return Ok(url.to_string());
    }
    if let Some(address) = lower.strip_prefix("mailto:") {
        if address.is_empty() {
            return Err(LinkError::Invalid(url.to_string()));
        }
        return Ok(url.to_string());
    }
    if !has_scheme(url) && looks_like_domain(url) {
        return Ok(format!("https://{url}"));
    }
    Err(LinkError::Invalid(url.to_string()))
}

/// Prepends `https://` to bare domains; anything else is returned trimmed.
pub fn normalize_href(raw: &str) -> String {
    let url = raw.trim();
    let schemeless = !has_scheme(url) && !url.starts_with('/') && !url.starts_with('#');
    if schemeless && looks_like_domain(url) {
        format!("https://{url}")
    } else {
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Set { href: String, text: Option<String>, target: LinkTarget },
    Clear,
}

impl LinkOutcome {
    pub fn attrs(&self) -> Option<LinkAttrs> {
        match self {
            LinkOutcome::Set { href, target, .. } => Some(LinkAttrs::new(href.clone(), Some(target.as_str()))),
            LinkOutcome::Clear => None,
        }
    }
}

/// Draft state of the link dialog. Nothing touches the document until
/// [`LinkDialog::save`] yields an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDialog {
    url: String,
    text: String,
    target: LinkTarget,
    editing_existing: bool,
    error: Option<LinkError>,
}

impl LinkDialog {
    pub fn open(initial_url: Option<&str>, initial_text: &str, initial_target: Option<&str>) -> Self {
        let url = initial_url.unwrap_or_default().to_string();
        Self {
            editing_existing: !url.trim().is_empty(),
            url,
            text: initial_text.to_string(),
            target: initial_target.map(LinkTarget::parse).unwrap_or_default(),
            error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn target(&self) -> LinkTarget {
        self.target
    }

    pub fn error(&self) -> Option<&LinkError> {
        self.error.as_ref()
    }

    pub fn is_editing_existing(&self) -> bool {
        self.editing_existing
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
        self.error = None;
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn set_target(&mut self, target: LinkTarget) {
        self.target = target;
    }

    pub fn is_url_valid(&self) -> bool {
        validate_url(&self.url).is_ok()
    }

    /// Validates the draft. An empty URL on an existing link clears it.
    pub fn save(&mut self) -> Result<LinkOutcome, LinkError> {
        if self.url.trim().is_empty() && self.editing_existing {
            return Ok(LinkOutcome::Clear);
        }
        match validate_url(&self.url) {
            Ok(href) => {
                let text = Some(self.text.trim()).filter(|t| !t.is_empty()).map(str::to_string);
                Ok(LinkOutcome::Set { href, text, target: self.target })
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Enter inside the URL field: submits only when the URL is valid.
    pub fn key_enter(&mut self) -> Option<LinkOutcome> {
        if !self.is_url_valid() {
            return None;
        }
        self.save().ok()
    }
}
