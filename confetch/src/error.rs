//! Error types for confetch.
//!
//! One enum per stage, matching how failures are counted: the
//! orchestrator consumes each stage's error where the stage runs and
//! derives an exit code, so there is no crate-wide rollup type.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Which stage of an attempt a fetch failure belongs to.
///
/// Failure counters are scoped per stage, so every [`FetchError`] maps to
/// exactly one stage and one `error_type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Establishing and authenticating the session (SSH or REST keygen).
    Connection,
    /// Retrieving and finalizing the configuration document.
    Configuration,
}

/// Configuration retrieval errors.
///
/// Exactly one of these is attached to a failed attempt; the first failure
/// encountered wins and later errors during cleanup do not overwrite it.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The device rejected the supplied credentials.
    #[error("Authentication failed for user '{user}'")]
    Authentication { user: String },

    /// The session or API answered, but not in the dialect we expected.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Could not reach the device at all.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The device was reachable but the retrieval itself failed.
    #[error("Configuration retrieval failed: {0}")]
    Configuration(String),

    /// The completion marker never appeared within the overall deadline.
    #[error("Completion marker not seen within {0:?}")]
    Timeout(Duration),

    /// Anything that escaped classification.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// The stage this error is counted under.
    pub fn stage(&self) -> FetchStage {
        match self {
            Self::Authentication { .. } | Self::Protocol(_) | Self::Connection(_) => {
                FetchStage::Connection
            }
            Self::Configuration(_) | Self::Timeout(_) => FetchStage::Configuration,
            // Unclassified failures land on the connection counter, the
            // widest net, where unexpected errors historically surfaced.
            Self::Unknown(_) => FetchStage::Connection,
        }
    }

    /// The `error_type` label value for failure counters.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication_error",
            Self::Protocol(_) => "protocol_error",
            Self::Connection(_) => "connection_error",
            Self::Configuration(_) => "configuration_error",
            Self::Timeout(_) => "timeout_error",
            Self::Unknown(_) => "unknown_error",
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::AuthenticationFailed { user } => Self::Authentication { user },
            TransportError::Ssh(e) => Self::Protocol(e.to_string()),
            TransportError::Key(msg) => Self::Protocol(msg),
            e @ (TransportError::ConnectionFailed { .. }
            | TransportError::Disconnected
            | TransportError::Timeout(_)
            | TransportError::Io(_)) => Self::Connection(e.to_string()),
        }
    }
}

/// Cloud upload errors.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The local artifact to upload does not exist.
    #[error("Backup artifact not found: {path}")]
    FileNotFound { path: String },

    /// Uploading is enabled but the destination is not fully configured.
    #[error("Upload destination not configured: {0}")]
    MissingConfig(String),

    /// The storage client could not be constructed.
    #[error("Storage client error: {0}")]
    Client(String),

    /// The transfer itself failed.
    #[error("Transfer failed: {0}")]
    Transfer(String),
}

impl UploadError {
    /// The `error_type` label value for the upload failure counter.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file_not_found",
            Self::MissingConfig(_) => "missing_destination_config",
            Self::Client(_) => "client_error",
            Self::Transfer(_) => "transfer_error",
        }
    }
}

/// Metrics reconciliation errors.
///
/// These are reported but never change the process exit code.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The collector could not be reached for the baseline fetch.
    #[error("Collector unreachable: {0}")]
    Unreachable(String),

    /// The collector's exposition text could not be parsed.
    #[error("Exposition parse failure: {0}")]
    Parse(String),

    /// Publishing the merged snapshot failed.
    #[error("Publish failed: {0}")]
    Publish(String),
}
