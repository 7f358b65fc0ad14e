//! Product images live on a third-party image CDN; only their URL and the
//! host's public id are stored locally.

mod http;

pub use http::HttpImageHost;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content types accepted for product images
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image hosting is not configured")]
    NotConfigured,

    #[error("Invalid image host configuration: {0}")]
    Config(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("No image data received")]
    Empty,

    #[error("Image host responded with {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Image host request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// What the host returns for a stored asset. The public id is what a later
/// `destroy` needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, content_type: &str) -> Result<UploadedImage, ImageError>;

    async fn destroy(&self, public_id: &str) -> Result<(), ImageError>;
}

/// Rejects anything that is not one of [`ALLOWED_MIME_TYPES`]. Parameters
/// such as `; charset=` are ignored.
pub fn check_content_type(content_type: &str) -> Result<&'static str, ImageError> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    ALLOWED_MIME_TYPES
        .iter()
        .find(|allowed| **allowed == essence)
        .copied()
        .ok_or_else(|| ImageError::UnsupportedMediaType(content_type.to_string()))
}
