//! Run orchestration: fetch, upload, reconcile, exit status.

use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{FetchError, FetchStage, UploadError};
use crate::fetch::build_fetcher;
use crate::metrics::{self, GatewayClient, Reconciler, RunMetrics};
use crate::upload::{ObjectStoreSink, UploadSink};

/// Orchestration stage. Strictly forward; reconciliation runs no matter
/// how the earlier stages went, so failure visibility is guaranteed even
/// when nothing else succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    Fetching,
    Uploading,
    Reconciling,
    Done,
}

/// Outcome of the upload stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The artifact was uploaded and the local copy removed.
    Succeeded,

    /// Uploading is disabled; the local artifact is the deliverable.
    Disabled,

    /// The upload was attempted and failed.
    Failed,

    /// Fetch failed, so upload was never attempted.
    NotAttempted,
}

/// Final outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub fetch_ok: bool,
    pub upload: UploadOutcome,
}

impl RunOutcome {
    /// Process exit code: 0 only when the fetch succeeded and the upload
    /// either succeeded or was intentionally disabled. Metrics failures
    /// never factor in.
    pub fn exit_code(&self) -> i32 {
        let upload_ok = matches!(
            self.upload,
            UploadOutcome::Succeeded | UploadOutcome::Disabled
        );
        if self.fetch_ok && upload_ok { 0 } else { 1 }
    }
}

/// Sequences one backup run through its stages.
pub struct Orchestrator {
    config: RunConfig,
    metrics: RunMetrics,
    stage: Stage,
}

impl Orchestrator {
    /// Create an orchestrator for the given run configuration.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            metrics: RunMetrics::new(),
            stage: Stage::Idle,
        }
    }

    /// Run all stages and report the outcome.
    pub async fn run(mut self) -> RunOutcome {
        self.execute().await
    }

    async fn execute(&mut self) -> RunOutcome {
        let overall_start = Instant::now();

        self.advance(Stage::Fetching);
        let fetch_ok = self.fetch_stage().await;

        self.advance(Stage::Uploading);
        let upload = if fetch_ok {
            self.upload_stage().await
        } else {
            info!("configuration retrieval failed, skipping upload");
            UploadOutcome::NotAttempted
        };

        self.advance(Stage::Reconciling);
        self.metrics.observe(
            &metrics::DURATION_SECONDS,
            &[("operation", "total")],
            overall_start.elapsed().as_secs_f64(),
        );
        self.reconcile_stage().await;

        self.advance(Stage::Done);
        RunOutcome { fetch_ok, upload }
    }

    async fn fetch_stage(&mut self) -> bool {
        let start = Instant::now();

        let result = match build_fetcher(&self.config) {
            Ok(fetcher) => fetcher.fetch(&mut self.metrics).await,
            Err(e) => Err(e),
        };

        let document = match result {
            Ok(document) => document,
            Err(e) => {
                error!("configuration retrieval failed: {e}");
                self.record_fetch_failure(&e);
                return false;
            }
        };

        let path = self.config.artifact_path();
        if let Err(e) = document.write_to(&path) {
            let err = FetchError::Configuration(format!(
                "writing artifact {}: {e}",
                path.display()
            ));
            error!("{err}");
            self.record_fetch_failure(&err);
            return false;
        }
        info!("configuration saved to {}", path.display());

        self.metrics.inc(&metrics::CONFIGURATION_SUCCESS_TOTAL, &[]);
        self.metrics.set(
            &metrics::LAST_SUCCESS_TIMESTAMP,
            &[("operation", "configuration")],
            metrics::unix_now(),
        );
        self.metrics.observe(
            &metrics::DURATION_SECONDS,
            &[("operation", "configuration")],
            start.elapsed().as_secs_f64(),
        );
        true
    }

    fn record_fetch_failure(&mut self, err: &FetchError) {
        let (family, operation) = match err.stage() {
            FetchStage::Connection => (&metrics::CONNECTION_FAILURE_TOTAL, "connection"),
            FetchStage::Configuration => (&metrics::CONFIGURATION_FAILURE_TOTAL, "configuration"),
        };
        self.metrics
            .inc(family, &[("error_type", err.error_type())]);
        self.metrics.set(
            &metrics::LAST_FAILURE_TIMESTAMP,
            &[("operation", operation)],
            metrics::unix_now(),
        );
    }

    async fn upload_stage(&mut self) -> UploadOutcome {
        let start = Instant::now();
        let path = self.config.artifact_path();

        let sink = match ObjectStoreSink::from_settings(&self.config.upload) {
            Ok(Some(sink)) => sink,
            Ok(None) => {
                if path.is_file() {
                    let shown = path.canonicalize().unwrap_or(path);
                    info!("upload disabled, artifact retained at {}", shown.display());
                } else {
                    warn!("upload disabled and no artifact file found");
                }
                return UploadOutcome::Disabled;
            }
            Err(e) => {
                self.record_upload_failure(&e);
                return UploadOutcome::Failed;
            }
        };

        match sink.upload(&path, &self.config.profile.object_prefix).await {
            Ok(object) => {
                self.metrics.inc(&metrics::UPLOAD_SUCCESS_TOTAL, &[]);
                self.metrics.record_upload_success(object.size_bytes);
                self.metrics.set(
                    &metrics::LAST_SUCCESS_TIMESTAMP,
                    &[("operation", "upload")],
                    metrics::unix_now(),
                );
                self.metrics.observe(
                    &metrics::DURATION_SECONDS,
                    &[("operation", "upload")],
                    start.elapsed().as_secs_f64(),
                );

                // The store holds the sole durable copy now.
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("could not remove local artifact {}: {e}", path.display());
                }
                UploadOutcome::Succeeded
            }
            Err(e) => {
                self.record_upload_failure(&e);
                UploadOutcome::Failed
            }
        }
    }

    fn record_upload_failure(&mut self, err: &UploadError) {
        error!("upload failed: {err}");
        self.metrics
            .inc(&metrics::UPLOAD_FAILURE_TOTAL, &[("error_type", err.error_type())]);
        self.metrics.set(
            &metrics::LAST_FAILURE_TIMESTAMP,
            &[("operation", "upload")],
            metrics::unix_now(),
        );
    }

    async fn reconcile_stage(&mut self) {
        if !self.config.gateway.enabled {
            info!("metrics disabled; set METRICS_PUSHGW=true to publish to the push gateway");
            return;
        }

        let gateway = &self.config.gateway;
        info!(
            "reconciling metrics for job={} instance={}",
            gateway.job, gateway.instance
        );
        let client = match GatewayClient::new(&gateway.addr, &gateway.job, &gateway.instance) {
            Ok(client) => client,
            Err(e) => {
                error!("could not build gateway client: {e}");
                return;
            }
        };

        // Metrics failures are reported but never change the run outcome.
        if let Err(e) = Reconciler::new(client).reconcile(&self.metrics).await {
            error!("metrics publish failed: {e}");
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stages only move forward");
        if next > self.stage {
            debug!("stage: {:?} -> {:?}", self.stage, next);
            self.stage = next;
        }
    }
}
