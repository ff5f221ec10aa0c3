use super::{serve, ImageStore};
use crate::{Error, Result};
use async_trait::async_trait;
use axum::Router;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory store for dry runs and tests.
#[derive(Clone)]
pub struct MockImageStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    images_path: PathBuf,
    fail_uploads: bool,
    upload_count: Arc<Mutex<usize>>,
    probe_count: Arc<Mutex<usize>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://res.cloudinary.com/mock/image/upload".to_string(),
            images_path: PathBuf::from("content/images"),
            fail_uploads: false,
            upload_count: Arc::new(Mutex::new(0)),
            probe_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_images_path(mut self, images_path: PathBuf) -> Self {
        self.images_path = images_path;
        self
    }

    /// Seed a hosted file so `exists_at(url)` reports it.
    pub fn with_file(self, url: String, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(url, content);
        self
    }

    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_probe_count(&self) -> usize {
        *self.probe_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    async fn upload(&self, local_path: &Path) -> Result<String> {
        if self.fail_uploads {
            return Err(Error::Upload(format!(
                "Mock upload rejected: {}",
                local_path.display()
            )));
        }

        let data = tokio::fs::read(local_path).await?;
        let extension = local_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        // Hosted names are assigned by the service, not taken from the file.
        let url = format!("{}/{}{}", self.base_url, Uuid::new_v4().simple(), extension);
        self.files.lock().unwrap().insert(url.clone(), data);
        Ok(url)
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn store(&self, local_path: &Path) -> Result<String> {
        *self.upload_count.lock().unwrap() += 1;

        self.upload(local_path).await.map_err(|e| {
            tracing::error!("Failed to upload {}: {}", local_path.display(), e);
            e
        })
    }

    async fn exists_at(&self, remote_url: &str) -> bool {
        *self.probe_count.lock().unwrap() += 1;
        self.files.lock().unwrap().contains_key(remote_url)
    }

    fn serve(&self) -> Router {
        serve::static_images(&self.images_path)
    }
}
