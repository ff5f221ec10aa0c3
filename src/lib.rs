//! Image storage backed by the Cloudinary media service
//!
//! Uploads local images to Cloudinary, probes whether hosted images still
//! resolve, and serves the local images directory with long-lived caching.

pub mod config;
pub mod error;
pub mod store;

pub use config::{Credentials, StoreConfig};
pub use error::{Error, Result};
pub use store::{CloudinaryStore, ImageStore, MockImageStore};
