use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use super::{ImageError, ImageHost, UploadedImage};
use crate::config::ImageConfig;

/// Signed-upload client for the image CDN
pub struct HttpImageHost {
    client: reqwest::Client,
    upload_url: Url,
    destroy_url: Url,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl HttpImageHost {
    /// `Ok(None)` when no upload endpoint is configured at all
    pub fn from_config(config: &ImageConfig) -> Result<Option<Self>, ImageError> {
        let Some(upload_url) = config.upload_url.as_deref() else {
            return Ok(None);
        };
        let destroy_url = config
            .destroy_url
            .as_deref()
            .ok_or_else(|| ImageError::Config("IMAGES_DESTROY_URL is required".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ImageError::Config("IMAGES_API_KEY is required".to_string()))?;
        let api_secret = config
            .api_secret
            .clone()
            .ok_or_else(|| ImageError::Config("IMAGES_API_SECRET is required".to_string()))?;

        Self::new(
            upload_url,
            destroy_url,
            api_key,
            api_secret,
            config.folder.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    pub fn new(
        upload_url: &str,
        destroy_url: &str,
        api_key: String,
        api_secret: String,
        folder: String,
        timeout: Duration,
    ) -> Result<Self, ImageError> {
        let parse = |raw: &str| Url::parse(raw).map_err(|e| ImageError::Config(format!("{}: {}", raw, e)));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            upload_url: parse(upload_url)?,
            destroy_url: parse(destroy_url)?,
            api_key,
            api_secret,
            folder,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ImageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ImageError::Upstream { status: status.as_u16(), message })
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, content_type: &str) -> Result<UploadedImage, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let public_id = Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.folder.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.api_secret,
        );

        let file = Part::bytes(bytes).file_name(file_name.to_string()).mime_str(content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("public_id", public_id)
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self.client.post(self.upload_url.clone()).multipart(form).send().await?;
        let body: UploadResponse = Self::check_status(response).await?.json().await?;
        tracing::info!("Uploaded image {}", body.public_id);

        Ok(UploadedImage { url: body.secure_url, public_id: body.public_id })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), ImageError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&[("public_id", public_id), ("timestamp", timestamp.as_str())], &self.api_secret);

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self.client.post(self.destroy_url.clone()).multipart(form).send().await?;
        let body: DestroyResponse = Self::check_status(response).await?.json().await?;

        // Already gone counts as destroyed
        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::info!("Destroyed image {}", public_id);
                Ok(())
            }
            other => Err(ImageError::Upstream { status: 200, message: other.to_string() }),
        }
    }
}

/// Hex SHA-256 of the `key=value` pairs sorted by key, joined with `&`, with
/// the API secret appended.
pub(crate) fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(key, _)| *key);
    let payload = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_ignores_parameter_order() {
        let a = sign(&[("timestamp", "1700000000"), ("public_id", "abc")], "secret");
        let b = sign(&[("public_id", "abc"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_covers_the_secret() {
        let expected = hex::encode(Sha256::digest(b"public_id=abc&timestamp=1secret"));
        assert_eq!(sign(&[("timestamp", "1"), ("public_id", "abc")], "secret"), expected);
        assert_ne!(sign(&[("public_id", "abc")], "one"), sign(&[("public_id", "abc")], "two"));
    }

    #[test]
    fn unconfigured_host_is_none() {
        let config = ImageConfig {
            upload_url: None,
            destroy_url: None,
            api_key: None,
            api_secret: None,
            folder: "products".into(),
            timeout_secs: 5,
        };
        assert!(HttpImageHost::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn partial_configuration_is_an_error() {
        let config = ImageConfig {
            upload_url: Some("http://127.0.0.1:9/upload".into()),
            destroy_url: None,
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            folder: "products".into(),
            timeout_secs: 5,
        };
        assert!(matches!(HttpImageHost::from_config(&config), Err(ImageError::Config(_))));
    }
}
