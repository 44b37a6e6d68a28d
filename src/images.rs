//! External asset host used to store doctor portraits before creation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{PanelError, PanelResult};
use crate::models::DoctorImage;

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload the image and return its public URL.
    async fn upload(&self, image: &DoctorImage) -> PanelResult<String>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Unsigned multipart upload (`file` + `upload_preset`) returning `secure_url`.
/// Runs under the long upload timeout, not the per-request one.
pub struct HttpImageHost {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    timeout: Duration,
}

impl HttpImageHost {
    pub fn new(api: &ApiClient, upload_url: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            http: api.http().clone(),
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
            timeout: api.upload_timeout(),
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, image: &DoctorImage) -> PanelResult<String> {
        debug!(file = %image.file_name, bytes = image.bytes.len(), "uploading doctor image");
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| PanelError::Upload(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PanelError::Upload(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Upload(format!("asset host answered {status}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PanelError::Upload(e.to_string()))?;
        let url = body
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PanelError::Upload("no secure_url in response".to_string()))?;
        info!(url = %url, "doctor image uploaded");
        Ok(url)
    }
}
