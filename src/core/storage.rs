// src/core/storage.rs
//! Local object storage for uploaded images, served under `/storage`

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::app_log;
use crate::core::FsOps;
use crate::types::DomainError;
use crate::utils::validate_file_extension;

// No svg: uploads are served from the API origin and svg can carry script
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];
pub const PUBLIC_PREFIX: &str = "/storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Articles,
    Cases,
    Resumes,
}

impl Bucket {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "articles" | "news" => Some(Bucket::Articles),
            "cases" => Some(Bucket::Cases),
            "resumes" | "avatars" => Some(Bucket::Resumes),
            _ => None,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Bucket::Articles => "articles",
            Bucket::Cases => "cases",
            Bucket::Resumes => "resumes",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Reserve a fresh key for an upload; the caller writes to `path`
    pub async fn allocate(&self, bucket: Bucket, original_name: &str) -> Result<StoredObject> {
        let ext = validate_file_extension(original_name, IMAGE_EXTENSIONS)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let key = format!("{}/{}.{}", bucket.dir_name(), uuid::Uuid::new_v4().simple(), ext);
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }

        Ok(StoredObject {
            url: format!("{}/{}", PUBLIC_PREFIX, key),
            key,
            path,
        })
    }

    pub async fn put_bytes(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject> {
        let object = self.allocate(bucket, original_name).await?;
        FsOps::write_bytes(&object.path, bytes).await?;
        app_log!(info, "Stored {} ({} bytes)", object.key, bytes.len());
        Ok(object)
    }

    /// Accepts either a key or a public URL
    pub async fn delete(&self, key_or_url: &str) -> Result<bool> {
        let key = key_or_url
            .strip_prefix(PUBLIC_PREFIX)
            .map(|k| k.trim_start_matches('/'))
            .unwrap_or(key_or_url);

        if !FsOps::is_safe_relative(key) {
            return Err(DomainError::validation(format!("Invalid storage key: {}", key)).into());
        }
        FsOps::remove_file(&self.root.join(key)).await
    }
}
