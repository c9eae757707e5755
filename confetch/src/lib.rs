//! # Confetch
//!
//! Network appliance configuration backup: fetch a full configuration
//! snapshot over an interactive SSH session or a REST API, upload it to
//! cloud object storage (or keep it locally), and publish run metrics to
//! a push gateway with cross-run counter reconciliation.
//!
//! ## Features
//!
//! - Async SSH scraping via russh with pager handling and prompt-based
//!   completion detection
//! - Multi-vendor device profiles (FortiGate, Juniper switches, Palo Alto)
//! - S3 and Azure Blob upload through one object-store seam
//! - Push-gateway reconciliation that makes ephemeral-process counters
//!   behave like monotonic cumulative counters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confetch::{Orchestrator, RunConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RunConfig::from_env().expect("invalid configuration");
//!     let outcome = Orchestrator::new(config).run().await;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod run;
pub mod scrape;
pub mod transport;
pub mod upload;

// Re-export main types for convenience
pub use config::{CloudBackend, RunConfig};
pub use device::{DeviceProfile, ProfileRegistry};
pub use error::{FetchError, MetricsError, TransportError, UploadError};
pub use fetch::{ApiFetcher, ConfigFetcher, InteractiveFetcher};
pub use metrics::{Reconciler, RunMetrics};
pub use run::{Orchestrator, RunOutcome, UploadOutcome};
pub use scrape::{ConfigDocument, ScrapeEngine};
pub use upload::{UploadObject, UploadSink};
