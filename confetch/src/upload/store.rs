//! Object-store backed upload sink.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use log::{debug, info};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use secrecy::ExposeSecret;

use super::{UploadObject, UploadSink, object_key, split_artifact_name};
use crate::config::{CloudBackend, UploadSettings};
use crate::error::UploadError;

/// Upload sink over an `object_store` backend (S3 or Azure Blob).
#[derive(Debug)]
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    backend: &'static str,
    bucket: String,
}

impl ObjectStoreSink {
    /// Build the sink selected by configuration.
    ///
    /// Returns `Ok(None)` when uploading is disabled. An enabled backend
    /// with incomplete destination settings is a `MissingConfig` failure,
    /// classified at upload time rather than at startup so the run still
    /// records it.
    pub fn from_settings(settings: &UploadSettings) -> Result<Option<Self>, UploadError> {
        let Some(backend) = settings.backend else {
            return Ok(None);
        };

        let bucket = settings
            .bucket
            .clone()
            .ok_or_else(|| UploadError::MissingConfig("BUCKET_NAME unset".to_string()))?;

        let store: Arc<dyn ObjectStore> = match backend {
            CloudBackend::Aws => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
                if let Some(region) = &settings.aws_region {
                    builder = builder.with_region(region);
                }
                if let Some(key_id) = &settings.aws_access_key_id {
                    builder = builder.with_access_key_id(key_id);
                }
                if let Some(secret) = &settings.aws_secret_access_key {
                    builder = builder.with_secret_access_key(secret.expose_secret());
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| UploadError::Client(e.to_string()))?,
                )
            }
            CloudBackend::Azure => {
                let missing: Vec<&str> = [
                    ("AZURE_STORAGE_ACCOUNT", settings.azure_account.is_none()),
                    ("AZURE_TENANT_ID", settings.azure_tenant_id.is_none()),
                    ("AZURE_CLIENT_ID", settings.azure_client_id.is_none()),
                    ("AZURE_CLIENT_SECRET", settings.azure_client_secret.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(key, _)| *key)
                .collect();
                if !missing.is_empty() {
                    return Err(UploadError::MissingConfig(missing.join(", ") + " unset"));
                }

                let builder = MicrosoftAzureBuilder::new()
                    .with_account(settings.azure_account.as_deref().unwrap_or_default())
                    .with_container_name(&bucket)
                    .with_tenant_id(settings.azure_tenant_id.as_deref().unwrap_or_default())
                    .with_client_id(settings.azure_client_id.as_deref().unwrap_or_default())
                    .with_client_secret(
                        settings
                            .azure_client_secret
                            .as_ref()
                            .map(|s| s.expose_secret().to_string())
                            .unwrap_or_default(),
                    );
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| UploadError::Client(e.to_string()))?,
                )
            }
        };

        Ok(Some(Self {
            store,
            backend: backend.as_str(),
            bucket,
        }))
    }

    /// Build a sink over an arbitrary store (tests).
    #[cfg(test)]
    pub fn with_store(store: Arc<dyn ObjectStore>, backend: &'static str, bucket: &str) -> Self {
        Self {
            store,
            backend,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl UploadSink for ObjectStoreSink {
    async fn upload(&self, artifact: &Path, prefix: &str) -> Result<UploadObject, UploadError> {
        if !artifact.is_file() {
            return Err(UploadError::FileNotFound {
                path: artifact.display().to_string(),
            });
        }

        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::FileNotFound {
                path: artifact.display().to_string(),
            })?;
        let (base_name, ext) = split_artifact_name(file_name);
        let key = object_key(prefix, base_name, ext, &Local::now());

        let bytes = tokio::fs::read(artifact)
            .await
            .map_err(|e| UploadError::Transfer(format!("reading {}: {e}", artifact.display())))?;
        let size_bytes = bytes.len() as u64;

        debug!("uploading {} bytes to {}/{}", size_bytes, self.bucket, key);
        self.store
            .put(&ObjectPath::from(key.clone()), PutPayload::from(bytes))
            .await
            .map_err(|e| UploadError::Transfer(e.to_string()))?;

        info!(
            "uploaded {} to {} bucket '{}' as '{}'",
            artifact.display(),
            self.backend,
            self.bucket,
            key
        );

        Ok(UploadObject {
            backend: self.backend,
            bucket: self.bucket.clone(),
            key,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use secrecy::SecretString;

    fn aws_settings(bucket: Option<&str>) -> UploadSettings {
        UploadSettings {
            backend: Some(CloudBackend::Aws),
            bucket: bucket.map(|b| b.to_string()),
            ..UploadSettings::default()
        }
    }

    #[test]
    fn test_disabled_backend_builds_no_sink() {
        let sink = ObjectStoreSink::from_settings(&UploadSettings::default()).unwrap();
        assert!(sink.is_none());
    }

    #[test]
    fn test_missing_bucket_is_missing_config() {
        let err = ObjectStoreSink::from_settings(&aws_settings(None)).unwrap_err();
        assert_eq!(err.error_type(), "missing_destination_config");
    }

    #[test]
    fn test_azure_missing_credentials_is_missing_config() {
        let settings = UploadSettings {
            backend: Some(CloudBackend::Azure),
            bucket: Some("backups".to_string()),
            azure_account: Some("acct".to_string()),
            azure_client_secret: Some(SecretString::from("s".to_string())),
            ..UploadSettings::default()
        };
        let err = ObjectStoreSink::from_settings(&settings).unwrap_err();
        assert_eq!(err.error_type(), "missing_destination_config");
        assert!(err.to_string().contains("AZURE_TENANT_ID"));
    }

    #[tokio::test]
    async fn test_upload_missing_artifact_is_file_not_found() {
        let sink = ObjectStoreSink::with_store(Arc::new(InMemory::new()), "aws", "backups");
        let err = sink
            .upload(Path::new("/nonexistent/fortigate_backup.conf"), "backup-fw")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "file_not_found");
    }

    #[tokio::test]
    async fn test_upload_stores_object_with_timestamped_key() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("fortigate_backup.conf");
        std::fs::write(&artifact, "config system global\nend\n").unwrap();

        let store = Arc::new(InMemory::new());
        let sink = ObjectStoreSink::with_store(store.clone(), "aws", "backups");

        let object = sink.upload(&artifact, "backup-fw").await.unwrap();
        assert_eq!(object.backend, "aws");
        assert_eq!(object.bucket, "backups");
        assert_eq!(object.size_bytes, 25);
        assert!(object.key.starts_with("backup-fw/fortigate_backup_"));
        assert!(object.key.ends_with(".conf"));

        let stored = store
            .get(&ObjectPath::from(object.key.clone()))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&stored[..], b"config system global\nend\n");
    }
}
