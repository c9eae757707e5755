//! Cloud upload of backup artifacts.
//!
//! One artifact, one whole-object PUT. The object key embeds the
//! wall-clock date and time of the upload call; two uploads of the same
//! artifact within the same second therefore collide on the key, which is
//! accepted (runs are scheduled minutes apart, and the store keeps the
//! last write).

mod store;

pub use store::ObjectStoreSink;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::UploadError;

/// Descriptor of a stored backup object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadObject {
    /// Backend label ("aws" or "azure").
    pub backend: &'static str,

    /// Bucket or container name.
    pub bucket: String,

    /// Object key within the bucket.
    pub key: String,

    /// Uploaded size in bytes.
    pub size_bytes: u64,
}

/// Abstraction over the cloud object-storage backend.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Upload the artifact file under the given destination prefix.
    async fn upload(
        &self,
        artifact: &std::path::Path,
        prefix: &str,
    ) -> Result<UploadObject, UploadError>;
}

/// Build the object key for an upload.
///
/// Pure in its inputs: the same prefix, file name parts, and instant
/// always produce the same key.
pub fn object_key(prefix: &str, base_name: &str, ext: &str, at: &DateTime<Local>) -> String {
    let date_part = at.format("%Y-%m-%d");
    let time_part = at.format("%H%M%S");
    format!("{prefix}/{base_name}_{date_part}_{time_part}{ext}")
}

/// Split a file name into (base name, extension-with-dot).
pub fn split_artifact_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => (&file_name[..dot], &file_name[dot..]),
        _ => (file_name, ""),
    }
}
