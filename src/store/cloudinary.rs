use super::{serve, ImageStore};
use crate::config::Credentials;
use crate::{Error, Result};
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use reqwest::{multipart, redirect, Client, Url};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Successful response from the upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub secure_url: Option<String>,
    pub public_id: Option<String>,
    pub format: Option<String>,
    pub bytes: Option<u64>,
}

impl UploadResponse {
    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {} bytes) at {}",
            self.public_id.as_deref().unwrap_or("?"),
            self.format.as_deref().unwrap_or("unknown format"),
            self.bytes.unwrap_or(0),
            self.secure_url.as_deref().unwrap_or(&self.url)
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

pub struct CloudinaryStore {
    client: Client,
    probe_client: Client,
    credentials: Credentials,
    images_path: PathBuf,
    api_base_url: String,
}

impl CloudinaryStore {
    pub fn new(
        credentials: Credentials,
        images_path: PathBuf,
        api_base_url: String,
    ) -> Result<Self> {
        // Redirects are reported as-is so a 3xx reads as "absent".
        let probe_client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client: Client::new(),
            probe_client,
            credentials,
            images_path,
            api_base_url,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base_url.trim_end_matches('/'),
            self.credentials.cloud_name
        )
    }

    async fn upload(&self, local_path: &Path) -> Result<UploadResponse> {
        let data = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("timestamp", timestamp.as_str())],
            &self.credentials.api_secret,
        );

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data).file_name(file_name))
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        tracing::debug!("Uploading {} to Cloudinary", local_path.display());

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(Error::Upload(format!(
                "Cloudinary API error (status {}): {}",
                status, message
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn probe(&self, remote_url: &str) -> Result<bool> {
        let url = Url::parse(remote_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", remote_url, e)))?;
        let request = self.probe_client.head(url).build()?;
        let response = self.probe_client.execute(request).await?;

        Ok(response.status().as_u16() / 100 == 2)
    }
}

/// Sign request parameters the way the upload API expects.
///
/// Empty values are skipped, the rest are sorted by name and joined as
/// `k=v&k=v`, then the API secret is appended and the whole string is
/// SHA-1 hashed.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn store(&self, local_path: &Path) -> Result<String> {
        match self.upload(local_path).await {
            Ok(uploaded) => {
                tracing::info!(
                    "Uploaded {} as {}",
                    local_path.display(),
                    uploaded.summary()
                );
                Ok(uploaded.url)
            }
            Err(e) => {
                tracing::error!("Failed to upload {}: {}", local_path.display(), e);
                Err(e)
            }
        }
    }

    // Unlike `store`, a failed probe is never surfaced: callers treat any
    // error as "does not exist" and rely on this returning a plain bool.
    // Connection-level failures are folded in the same way.
    async fn exists_at(&self, remote_url: &str) -> bool {
        match self.probe(remote_url).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::error!("Existence check for {} failed: {}", remote_url, e);
                false
            }
        }
    }

    fn serve(&self) -> Router {
        serve::static_images(&self.images_path)
    }
}
