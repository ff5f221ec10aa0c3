//! Store configuration
//!
//! Cloudinary credentials and local paths, loaded once at startup and passed
//! into the store explicitly.

use crate::{Error, Result};
use std::path::PathBuf;

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";
const DEFAULT_IMAGES_PATH: &str = "content/images";

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `None` only in dry-run mode.
    pub credentials: Option<Credentials>,
    /// Directory served by [`crate::ImageStore::serve`].
    pub images_path: PathBuf,
    pub api_base_url: String,
    pub dry_run: bool,
}

impl StoreConfig {
    pub fn new(credentials: Credentials, images_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials: Some(credentials),
            images_path: images_path.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            dry_run: false,
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: String) -> Self {
        self.api_base_url = api_base_url;
        self
    }

    pub fn from_env() -> Result<Self> {
        ignore_missing_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dry_run = lookup("DRY_RUN")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let credentials = if dry_run {
            None
        } else {
            Some(Credentials {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            })
        };

        Ok(Self {
            credentials,
            images_path: lookup("IMAGES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_PATH)),
            api_base_url: lookup("CLOUDINARY_API_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            dry_run,
        })
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn ignore_missing_env_file<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_credentials_and_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "1234"),
            ("CLOUDINARY_API_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(
            config.credentials,
            Some(Credentials {
                cloud_name: "demo".to_string(),
                api_key: "1234".to_string(),
                api_secret: "s3cret".to_string(),
            })
        );
        assert_eq!(config.images_path, PathBuf::from("content/images"));
        assert_eq!(config.api_base_url, "https://api.cloudinary.com");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let err = StoreConfig::from_lookup(lookup_from(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "1234"),
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("CLOUDINARY_API_SECRET"));
    }

    #[test]
    fn test_from_lookup_empty_value_counts_as_missing() {
        let err = StoreConfig::from_lookup(lookup_from(&[
            ("CLOUDINARY_CLOUD_NAME", ""),
            ("CLOUDINARY_API_KEY", "1234"),
            ("CLOUDINARY_API_SECRET", "s3cret"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("CLOUDINARY_CLOUD_NAME"));
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = dotenvy::from_path(dir.path().join(".env"));

        assert!(ignore_missing_env_file(loaded).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "!!!=not a key\n").unwrap();

        let err = ignore_missing_env_file(dotenvy::from_path(&env_file)).unwrap_err();
        assert!(matches!(err, Error::EnvVar(_)));
    }

    #[test]
    fn test_dry_run_skips_credentials() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("DRY_RUN", "true"),
            ("IMAGES_PATH", "/srv/images"),
        ]))
        .unwrap();

        assert!(config.dry_run);
        assert!(config.credentials.is_none());
        assert_eq!(config.images_path, PathBuf::from("/srv/images"));
    }
}
