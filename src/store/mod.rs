//! Image storage backends
//!
//! Uploads images to a hosted media service, checks whether hosted images
//! still resolve, and serves the local images directory.

pub mod cloudinary;
pub mod mock;
pub mod serve;

pub use cloudinary::CloudinaryStore;
pub use mock::MockImageStore;

use crate::config::StoreConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use axum::Router;
use std::path::Path;
use tracing::info;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload the file at `local_path` and return its hosted URL.
    ///
    /// Failures are logged and returned to the caller.
    async fn store(&self, local_path: &Path) -> Result<String>;

    /// Check whether `remote_url` currently resolves with a 2xx status.
    ///
    /// Never fails: any error is logged and reported as `false`.
    async fn exists_at(&self, remote_url: &str) -> bool;

    /// Router serving the local images directory.
    fn serve(&self) -> Router;
}

/// Build the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> Result<Box<dyn ImageStore>> {
    if config.dry_run {
        info!("DRY_RUN enabled, uploads will be kept in memory");
        return Ok(Box::new(
            MockImageStore::new().with_images_path(config.images_path.clone()),
        ));
    }

    let credentials = config
        .credentials
        .clone()
        .ok_or_else(|| Error::Config("Cloudinary credentials not configured".to_string()))?;

    Ok(Box::new(CloudinaryStore::new(
        credentials,
        config.images_path.clone(),
        config.api_base_url.clone(),
    )?))
}
