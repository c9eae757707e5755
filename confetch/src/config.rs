//! Run configuration from the process environment.
//!
//! The binary is launched by a scheduler (cron job, Nomad/Kubernetes
//! CronJob) with a fully-specified environment; there are no config files
//! and no CLI flags. Every knob is an environment variable, resolved once
//! at startup. Device endpoint fields are deliberately kept optional here:
//! a missing host or credential is classified at fetch time so the run
//! still reports its failure through metrics.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::device::{DeviceProfile, ProfileRegistry};
use crate::error::FetchError;

/// Configuration errors surfaced at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable was present but malformed.
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    /// DEVICE_TYPE was not set.
    #[error("DEVICE_TYPE must be set (available: {available})")]
    MissingProfile { available: String },

    /// DEVICE_TYPE named an unregistered profile.
    #[error("Unknown device type '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },
}

/// Which cloud backend receives the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudBackend {
    /// AWS S3.
    Aws,
    /// Azure Blob Storage.
    Azure,
}

impl CloudBackend {
    /// Backend label used in logs and upload descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
        }
    }
}

/// Device endpoint and credential settings.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,

    /// Appliance name as it appears in its prompt.
    pub device_name: Option<String>,

    /// Explicit completion marker override.
    pub prompt_marker: Option<String>,

    /// Verify TLS certificates on the REST path.
    pub verify_tls: bool,
}

/// Endpoint with every required field present.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl DeviceSettings {
    /// Resolve the endpoint, or classify the missing configuration as a
    /// connection failure for this attempt.
    pub fn endpoint(&self, default_port: u16) -> Result<Endpoint, FetchError> {
        let (Some(host), Some(username), Some(password)) =
            (&self.host, &self.username, &self.password)
        else {
            return Err(FetchError::Connection(
                "HOST, USERNAME, and PASSWORD must be set".to_string(),
            ));
        };
        Ok(Endpoint {
            host: host.clone(),
            port: self.port.unwrap_or(default_port),
            username: username.clone(),
            password: password.clone(),
        })
    }
}

/// Cloud upload settings. `backend == None` means uploading is disabled
/// and the artifact is retained locally.
#[derive(Debug, Clone, Default)]
pub struct UploadSettings {
    pub backend: Option<CloudBackend>,

    /// S3 bucket or Azure container name.
    pub bucket: Option<String>,

    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<SecretString>,

    pub azure_account: Option<String>,
    pub azure_tenant_id: Option<String>,
    pub azure_client_id: Option<String>,
    pub azure_client_secret: Option<SecretString>,
}

impl UploadSettings {
    /// Whether uploading is enabled at all.
    pub fn enabled(&self) -> bool {
        self.backend.is_some()
    }
}

/// Push-gateway settings.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub enabled: bool,
    pub addr: String,
    pub job: String,
    pub instance: String,
}

/// Complete configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub profile: DeviceProfile,
    pub device: DeviceSettings,
    pub upload: UploadSettings,
    pub gateway: GatewaySettings,

    /// Directory the artifact file is written to.
    pub artifact_dir: PathBuf,

    /// SSH / keygen connection timeout.
    pub connect_timeout: Duration,

    /// Overall deadline for the scrape loop.
    pub scrape_deadline: Duration,
}

impl RunConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let registry = ProfileRegistry::builtin();
        let available = || registry.names().cloned().collect::<Vec<_>>().join(", ");

        let profile_name = get("DEVICE_TYPE").ok_or_else(|| ConfigError::MissingProfile {
            available: available(),
        })?;
        let profile = registry
            .get(&profile_name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: profile_name,
                available: available(),
            })?;

        let host = get("HOST");
        let device = DeviceSettings {
            host: host.clone(),
            port: parse_u16(get("PORT"), "PORT")?,
            username: get("USERNAME"),
            password: get("PASSWORD").map(SecretString::from),
            device_name: get("DEVICE_NAME"),
            prompt_marker: get("PROMPT_MARKER"),
            verify_tls: parse_bool(get("VERIFY_SSL"), false),
        };

        let backend = match get("CLOUD_BACKEND").as_deref() {
            None => None,
            Some("aws") => Some(CloudBackend::Aws),
            Some("azure") => Some(CloudBackend::Azure),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CLOUD_BACKEND",
                    message: format!("expected 'aws' or 'azure', got '{other}'"),
                });
            }
        };
        let upload = UploadSettings {
            backend,
            bucket: get("BUCKET_NAME"),
            aws_region: get("AWS_REGION"),
            aws_access_key_id: get("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: get("AWS_SECRET_ACCESS_KEY").map(SecretString::from),
            azure_account: get("AZURE_STORAGE_ACCOUNT"),
            azure_tenant_id: get("AZURE_TENANT_ID"),
            azure_client_id: get("AZURE_CLIENT_ID"),
            azure_client_secret: get("AZURE_CLIENT_SECRET").map(SecretString::from),
        };

        let gateway = GatewaySettings {
            enabled: parse_bool(get("METRICS_PUSHGW"), false),
            addr: get("PUSHGATEWAY_ADDR").unwrap_or_else(|| "pushgateway:9091".to_string()),
            job: get("PUSHGATEWAY_JOB")
                .unwrap_or_else(|| format!("backup-{}", profile.name)),
            instance: get("PUSHGATEWAY_INSTANCE")
                .or(host)
                .unwrap_or_else(|| "unknown".to_string()),
        };

        Ok(Self {
            profile,
            device,
            upload,
            gateway,
            artifact_dir: get("ARTIFACT_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            connect_timeout: parse_secs(get("CONNECT_TIMEOUT_SECS"), "CONNECT_TIMEOUT_SECS", 10)?,
            scrape_deadline: parse_secs(get("SCRAPE_TIMEOUT_SECS"), "SCRAPE_TIMEOUT_SECS", 300)?,
        })
    }

    /// Path of the local artifact file for this run.
    pub fn artifact_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.profile.artifact_name)
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => v.eq_ignore_ascii_case("true"),
        None => default,
    }
}

fn parse_u16(value: Option<String>, key: &'static str) -> Result<Option<u16>, ConfigError> {
    value
        .map(|v| {
            v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key,
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_secs(
    value: Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match value {
        Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
