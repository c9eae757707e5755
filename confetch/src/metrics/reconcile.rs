//! Push-gateway reconciliation.
//!
//! The gateway keeps exactly one snapshot per (job, instance) grouping
//! key, and a push replaces that snapshot wholesale. Since every run
//! starts from zero, publishing local values directly would reset history
//! on every run; instead the reconciler fetches the currently published
//! snapshot, folds this run's deltas into it per metric semantics, and
//! publishes the merged result.
//!
//! There is no locking around fetch-merge-publish: two runs racing on the
//! same grouping key can both read the same baseline and last writer
//! wins. That lost-update window is an accepted property of the gateway,
//! not something this module tries to solve.

use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::exposition::{SampleKey, Snapshot};
use super::recorder::RunMetrics;
use super::MergeSemantics;
use crate::error::MetricsError;

/// HTTP timeout for gateway requests.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Grouping-key label names.
const GROUPING_LABELS: [&str; 2] = ["job", "instance"];

/// HTTP client for one push gateway and grouping key.
pub struct GatewayClient {
    client: reqwest::Client,
    base: String,
    job: String,
    instance: String,
}

impl GatewayClient {
    /// Create a client for the given gateway address and grouping key.
    ///
    /// The address may omit the scheme; plain `host:port` gets `http://`
    /// prepended.
    pub fn new(
        addr: &str,
        job: impl Into<String>,
        instance: impl Into<String>,
    ) -> Result<Self, MetricsError> {
        let base = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", addr.trim_end_matches('/'))
        };

        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| MetricsError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base,
            job: job.into(),
            instance: instance.into(),
        })
    }

    /// The grouping-key labels the gateway attaches to exported samples.
    pub fn grouping(&self) -> [(&str, &str); 2] {
        [("job", &self.job), ("instance", &self.instance)]
    }

    /// Fetch the gateway's full exposition document.
    pub async fn fetch_exposition(&self) -> Result<String, MetricsError> {
        let url = format!("{}/metrics", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetricsError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::Unreachable(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| MetricsError::Unreachable(e.to_string()))
    }

    /// Publish an exposition document under this grouping key.
    ///
    /// PUT semantics: the gateway replaces everything previously stored
    /// under the grouping key with exactly this body.
    pub async fn publish(&self, body: String) -> Result<(), MetricsError> {
        let url = format!(
            "{}/metrics/job/{}/instance/{}",
            self.base, self.job, self.instance
        );
        let response = self
            .client
            .put(&url)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(body)
            .send()
            .await
            .map_err(|e| MetricsError::Publish(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetricsError::Publish(format!(
                "PUT {url} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Merge this run's local values with the remote snapshot.
///
/// Counters and cumulative gauges publish `remote + local`; last-value
/// gauges keep the local value when set this run and otherwise carry the
/// remote value forward. Remote samples under this grouping key with no
/// local counterpart are carried forward so a narrow run cannot erase
/// unrelated history.
pub fn merge_with_remote(
    local: &RunMetrics,
    remote: &Snapshot,
    grouping: &[(&str, &str)],
) -> IndexMap<SampleKey, f64> {
    let mut merged: IndexMap<SampleKey, f64> = IndexMap::new();

    for (key, local_value) in local.scalar_samples() {
        let Some(family) = super::family(key.name()) else {
            continue;
        };
        let remote_value = remote.value(&key.with_extra(grouping));

        let published = match family.merge {
            MergeSemantics::Accumulate => match remote_value {
                Some(r) => r + local_value,
                None => {
                    debug!("no published baseline for {}, starting from local", key.name());
                    local_value
                }
            },
            MergeSemantics::LastValue => {
                if local.was_set(key) {
                    local_value
                } else {
                    remote_value.unwrap_or(local_value)
                }
            }
            MergeSemantics::Replace => local_value,
        };
        merged.insert(key.clone(), published);
    }

    // Carry forward remote samples this run never touched (for example a
    // last-success timestamp for an operation that did not happen today).
    for (remote_key, remote_value) in remote.iter() {
        if super::family(remote_key.name()).is_none() {
            continue;
        }
        if !remote_key.has_labels(grouping) {
            continue;
        }
        let stripped = remote_key.without(&GROUPING_LABELS);
        merged.entry(stripped).or_insert(remote_value);
    }

    merged
}

/// Fetch-merge-publish driver.
pub struct Reconciler {
    client: GatewayClient,
}

impl Reconciler {
    /// Create a reconciler over the given gateway client.
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Run one reconciliation.
    ///
    /// A failed baseline fetch degrades to local-only values (history for
    /// the affected metrics restarts) and is not an error; only a failed
    /// publish is reported, and even that never fails the backup itself.
    pub async fn reconcile(&self, metrics: &RunMetrics) -> Result<(), MetricsError> {
        let remote = match self.client.fetch_exposition().await {
            Ok(text) => match Snapshot::parse(&text) {
                Ok(snapshot) => {
                    debug!("fetched {} published samples", snapshot.len());
                    snapshot
                }
                Err(e) => {
                    warn!("could not parse published metrics, publishing local-only values: {e}");
                    Snapshot::empty()
                }
            },
            Err(e) => {
                warn!("could not fetch published metrics, publishing local-only values: {e}");
                Snapshot::empty()
            }
        };

        let merged = merge_with_remote(metrics, &remote, &self.client.grouping());
        let body = metrics.encode(&merged);

        self.client.publish(body).await?;
        info!("metrics published to gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        CONNECTION_SUCCESS_TOTAL, LAST_FILE_SIZE_BYTES, LAST_SUCCESS_TIMESTAMP,
        TOTAL_BYTES_UPLOADED,
    };
    use super::*;

    const GROUPING: [(&str, &str); 2] = [("job", "backup-fw"), ("instance", "fw1")];

    fn remote_with(lines: &str) -> Snapshot {
        Snapshot::parse(lines).unwrap()
    }

    #[test]
    fn test_counter_merge_adds_remote_and_local() {
        let mut local = RunMetrics::new();
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);

        let remote = remote_with(
            r#"backup_connection_success_total{instance="fw1",job="backup-fw"} 5"#,
        );

        let merged = merge_with_remote(&local, &remote, &GROUPING);
        let key = SampleKey::new(CONNECTION_SUCCESS_TOTAL.name, &[]);
        assert_eq!(merged.get(&key), Some(&7.0));
    }

    #[test]
    fn test_counter_merge_degrades_to_local_only() {
        let mut local = RunMetrics::new();
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);

        let merged = merge_with_remote(&local, &Snapshot::empty(), &GROUPING);
        let key = SampleKey::new(CONNECTION_SUCCESS_TOTAL.name, &[]);
        assert_eq!(merged.get(&key), Some(&3.0));
    }

    #[test]
    fn test_label_order_in_remote_is_irrelevant() {
        let mut local = RunMetrics::new();
        local.inc(&CONNECTION_SUCCESS_TOTAL, &[]);

        for line in [
            r#"backup_connection_success_total{instance="fw1",job="backup-fw"} 5"#,
            r#"backup_connection_success_total{job="backup-fw",instance="fw1"} 5"#,
        ] {
            let merged = merge_with_remote(&local, &remote_with(line), &GROUPING);
            let key = SampleKey::new(CONNECTION_SUCCESS_TOTAL.name, &[]);
            assert_eq!(merged.get(&key), Some(&6.0), "line: {line}");
        }
    }

    #[test]
    fn test_cumulative_gauge_accumulates() {
        let mut local = RunMetrics::new();
        local.record_upload_success(100);

        let remote = remote_with(
            r#"backup_total_bytes_uploaded{instance="fw1",job="backup-fw"} 900"#,
        );

        let merged = merge_with_remote(&local, &remote, &GROUPING);
        let key = SampleKey::new(TOTAL_BYTES_UPLOADED.name, &[]);
        assert_eq!(merged.get(&key), Some(&1000.0));
    }

    #[test]
    fn test_last_value_gauge_prefers_local_when_set() {
        let mut local = RunMetrics::new();
        local.record_upload_success(64);

        let remote = remote_with(
            r#"backup_last_file_size_bytes{instance="fw1",job="backup-fw"} 4096"#,
        );

        let merged = merge_with_remote(&local, &remote, &GROUPING);
        let key = SampleKey::new(LAST_FILE_SIZE_BYTES.name, &[]);
        assert_eq!(merged.get(&key), Some(&64.0));
    }

    #[test]
    fn test_last_value_gauge_carries_remote_when_unset() {
        let local = RunMetrics::new();

        let remote = remote_with(
            r#"backup_last_file_size_bytes{instance="fw1",job="backup-fw"} 4096"#,
        );

        let merged = merge_with_remote(&local, &remote, &GROUPING);
        let key = SampleKey::new(LAST_FILE_SIZE_BYTES.name, &[]);
        assert_eq!(merged.get(&key), Some(&4096.0));
    }

    #[test]
    fn test_remote_only_samples_are_carried_forward() {
        let local = RunMetrics::new();

        let remote = remote_with(concat!(
            r#"backup_last_success_timestamp{instance="fw1",job="backup-fw",operation="upload"} 1700000000"#,
            "\n",
            r#"backup_last_success_timestamp{instance="other",job="backup-sw",operation="upload"} 99"#,
        ));

        let merged = merge_with_remote(&local, &remote, &GROUPING);
        let key = SampleKey::new(LAST_SUCCESS_TIMESTAMP.name, &[("operation", "upload")]);
        assert_eq!(merged.get(&key), Some(&1700000000.0));
    }

    #[test]
    fn test_gateway_meta_metrics_are_ignored() {
        let local = RunMetrics::new();
        let remote = remote_with(
            r#"push_time_seconds{instance="fw1",job="backup-fw"} 1.7e9"#,
        );
        let merged = merge_with_remote(&local, &remote, &GROUPING);
        assert!(!merged.keys().any(|k| k.name() == "push_time_seconds"));
    }

    #[tokio::test]
    async fn test_reconcile_fetch_merge_publish() {
        let mut server = mockito::Server::new_async().await;

        let fetch = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(
                r#"backup_connection_success_total{instance="fw1",job="backup-fw"} 5"#,
            )
            .create_async()
            .await;
        let publish = server
            .mock("PUT", "/metrics/job/backup-fw/instance/fw1")
            .match_body(mockito::Matcher::Regex(
                "backup_connection_success_total 7".to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let mut metrics = RunMetrics::new();
        metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);

        let client = GatewayClient::new(&server.url(), "backup-fw", "fw1").unwrap();
        Reconciler::new(client).reconcile(&metrics).await.unwrap();

        fetch.assert_async().await;
        publish.assert_async().await;
    }

    #[tokio::test]
    async fn test_reconcile_publishes_local_only_when_fetch_fails() {
        let mut server = mockito::Server::new_async().await;

        let fetch = server
            .mock("GET", "/metrics")
            .with_status(500)
            .create_async()
            .await;
        let publish = server
            .mock("PUT", "/metrics/job/backup-fw/instance/fw1")
            .match_body(mockito::Matcher::Regex(
                "backup_connection_success_total 3".to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let mut metrics = RunMetrics::new();
        for _ in 0..3 {
            metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        }

        let client = GatewayClient::new(&server.url(), "backup-fw", "fw1").unwrap();
        Reconciler::new(client).reconcile(&metrics).await.unwrap();

        fetch.assert_async().await;
        publish.assert_async().await;
    }

    #[tokio::test]
    async fn test_reconcile_reports_publish_failure() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;
        server
            .mock("PUT", "/metrics/job/backup-fw/instance/fw1")
            .with_status(500)
            .create_async()
            .await;

        let metrics = RunMetrics::new();
        let client = GatewayClient::new(&server.url(), "backup-fw", "fw1").unwrap();
        let err = Reconciler::new(client).reconcile(&metrics).await.unwrap_err();
        assert!(matches!(err, MetricsError::Publish(_)));
    }

    #[test]
    fn test_scheme_is_prepended_when_missing() {
        let client = GatewayClient::new("pushgateway:9091", "j", "i").unwrap();
        assert_eq!(client.base, "http://pushgateway:9091");

        let client = GatewayClient::new("https://gw.example.com/", "j", "i").unwrap();
        assert_eq!(client.base, "https://gw.example.com");
    }
}
