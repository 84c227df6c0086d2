use crate::validate_url;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, warn};

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// A file picked or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime_type: mime_type.into(), bytes }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// What the host's upload function resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("invalid upload response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("{0} is not an image")]
    NotAnImage(String),
    #[error("image is {size} bytes, the limit is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("image URL is required")]
    MissingUrl,
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),
    #[error("no file selected")]
    NoFile,
    #[error("editor is read-only")]
    ReadOnly,
    #[error(transparent)]
    Upload(#[from] UploadError),
}

pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<UploadedImage, UploadError>> + 'a>>;

/// Host-provided upload function. The future is not `Send`, so browser
/// promises can back it.
pub trait ImageUploader {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> UploadFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageTab {
    #[default]
    Upload,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Uploading,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub size: u64,
    pub preview_data_url: String,
    pub status: UploadStatus,
}

/// Proof that an upload was started for the dialog's current file. Results
/// carrying a ticket from an earlier generation are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
    pub file: ImageFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDialog {
    tab: ImageTab,
    max_bytes: u64,
    generation: u64,
    pending: Option<PendingUpload>,
    url: String,
    alt: String,
    preview_broken: bool,
    error: Option<ImageError>,
}

impl Default for ImageDialog {
    fn default() -> Self {
        Self::new(MAX_IMAGE_BYTES)
    }
}

impl ImageDialog {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            tab: ImageTab::Upload,
            max_bytes,
            generation: 0,
            pending: None,
            url: String::new(),
            alt: String::new(),
            preview_broken: false,
            error: None,
        }
    }

    pub fn tab(&self) -> ImageTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ImageTab) {
        if self.tab != tab {
            self.tab = tab;
            self.error = None;
        }
    }

    pub fn pending(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    pub fn error(&self) -> Option<&ImageError> {
        self.error.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.status == UploadStatus::Uploading)
    }

    pub fn validate_file(&self, file: &ImageFile) -> Result<(), ImageError> {
        if !file.mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(ImageError::NotAnImage(file.mime_type.clone()));
        }
        if file.size() > self.max_bytes {
            return Err(ImageError::TooLarge { size: file.size(), max: self.max_bytes });
        }
        Ok(())
    }

    /// Validates a selected file, shows its preview and starts a new upload
    /// generation. A rejected file leaves nothing pending.
    pub fn select_file(&mut self, file: ImageFile) -> Result<UploadTicket, ImageError> {
        self.generation += 1;
        if let Err(err) = self.validate_file(&file) {
            warn!(file = %file.name, error = %err, "image rejected");
            self.pending = None;
            self.error = Some(err.clone());
            return Err(err);
        }
        self.error = None;
        self.pending = Some(PendingUpload {
            file_name: file.name.clone(),
            size: file.size(),
            preview_data_url: file.data_url(),
            status: UploadStatus::Uploading,
        });
        debug!(file = %file.name, bytes = file.size(), "image upload started");
        Ok(UploadTicket { generation: self.generation, file })
    }

    /// Applies an upload result. Returns the image to insert on success;
    /// stale tickets and failures return `None`.
    pub fn finish_upload(
        &mut self,
        ticket: &UploadTicket,
        result: Result<UploadedImage, UploadError>,
    ) -> Option<UploadedImage> {
        if ticket.generation != self.generation {
            debug!(file = %ticket.file.name, "stale upload result ignored");
            return None;
        }
        let pending = self.pending.as_mut()?;
        match result {
            Ok(image) => {
                pending.status = UploadStatus::Done;
                Some(image)
            }
            Err(err) => {
                warn!(file = %ticket.file.name, error = %err, "image upload failed");
                pending.status = UploadStatus::Error;
                self.error = Some(ImageError::Upload(err));
                None
            }
        }
    }

    /// Select, upload and settle in one call.
    pub async fn upload_with(
        &mut self,
        uploader: &dyn ImageUploader,
        file: ImageFile,
    ) -> Result<UploadedImage, ImageError> {
        let ticket = self.select_file(file)?;
        let result = uploader.upload(&ticket.file).await;
        match self.finish_upload(&ticket, result) {
            Some(image) => Ok(image),
            None => Err(self.error.clone().unwrap_or(ImageError::NoFile)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
        self.preview_broken = false;
        self.error = None;
    }

    pub fn set_alt(&mut self, alt: &str) {
        self.alt = alt.to_string();
    }

    /// Live preview source for the URL tab; `None` once the host reports the
    /// image failed to load.
    pub fn url_preview(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() || self.preview_broken {
            None
        } else {
            Some(url)
        }
    }

    pub fn mark_preview_broken(&mut self) {
        self.preview_broken = true;
    }

    /// Returns `(src, alt)` for the URL tab.
    pub fn submit_url(&mut self) -> Result<(String, Option<String>), ImageError> {
        let url = self.url.trim();
        let src = if url.is_empty() {
            Err(ImageError::MissingUrl)
        } else if url.starts_with("data:image/") {
            Ok(url.to_string())
        } else {
            validate_url(url).map_err(|_| ImageError::InvalidUrl(url.to_string()))
        };
        match src {
            Ok(src) => {
                let alt = Some(self.alt.trim()).filter(|a| !a.is_empty()).map(str::to_string);
                Ok((src, alt))
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drops every draft field and abandons any upload in flight.
    pub fn close(&mut self) {
        let max_bytes = self.max_bytes;
        let generation = self.generation + 1;
        *self = Self::new(max_bytes);
        self.generation = generation;
    }
}
