//! Per-run metric recorder.
//!
//! One `RunMetrics` instance is owned by a single run; nothing here is
//! global, so repeated or concurrent test invocations are independent.
//! Values are plain deltas observed this run; cross-run accumulation
//! happens in the reconciler, never here.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::exposition::{SampleKey, escape_help, format_sample};
use super::{DURATION_BUCKETS, Family, FamilyKind};

/// Histogram state for one label set.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Cumulative count per bucket bound.
    buckets: Vec<(f64, u64)>,
    sum: f64,
    count: u64,
}

impl Histogram {
    fn new(bounds: &[f64]) -> Self {
        Self {
            buckets: bounds.iter().map(|b| (*b, 0)).collect(),
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, value: f64) {
        for (bound, count) in &mut self.buckets {
            if value <= *bound {
                *count += 1;
            }
        }
        self.sum += value;
        self.count += 1;
    }
}

/// In-process counters, gauges, and histograms for the current run only.
#[derive(Debug)]
pub struct RunMetrics {
    /// Counter and gauge values.
    scalars: IndexMap<SampleKey, f64>,

    /// Gauge keys explicitly set this run (a pre-registered zero is not
    /// "set"; the distinction drives last-value merge semantics).
    touched: HashSet<SampleKey>,

    histograms: IndexMap<SampleKey, Histogram>,
}

impl RunMetrics {
    /// Create a recorder with every always-visible sample pre-registered
    /// at zero, including one zero per known failure `error_type`, so the
    /// gateway exposes the full failure surface even after clean runs.
    pub fn new() -> Self {
        let mut metrics = Self {
            scalars: IndexMap::new(),
            touched: HashSet::new(),
            histograms: IndexMap::new(),
        };

        metrics.register_zero(&super::CONNECTION_SUCCESS_TOTAL, &[]);
        metrics.register_zero(&super::CONFIGURATION_SUCCESS_TOTAL, &[]);
        metrics.register_zero(&super::UPLOAD_SUCCESS_TOTAL, &[]);
        metrics.register_zero(&super::LAST_FILE_SIZE_BYTES, &[]);
        metrics.register_zero(&super::TOTAL_BYTES_UPLOADED, &[]);

        for error_type in [
            "authentication_error",
            "protocol_error",
            "connection_error",
            "unknown_error",
        ] {
            metrics.register_zero(
                &super::CONNECTION_FAILURE_TOTAL,
                &[("error_type", error_type)],
            );
        }
        for error_type in ["configuration_error", "timeout_error"] {
            metrics.register_zero(
                &super::CONFIGURATION_FAILURE_TOTAL,
                &[("error_type", error_type)],
            );
        }
        for error_type in [
            "file_not_found",
            "missing_destination_config",
            "client_error",
            "transfer_error",
        ] {
            metrics.register_zero(&super::UPLOAD_FAILURE_TOTAL, &[("error_type", error_type)]);
        }

        metrics
    }

    fn register_zero(&mut self, family: &'static Family, labels: &[(&str, &str)]) {
        self.scalars
            .entry(SampleKey::new(family.name, labels))
            .or_insert(0.0);
    }

    /// Increment a counter by one.
    pub fn inc(&mut self, family: &'static Family, labels: &[(&str, &str)]) {
        self.add(family, labels, 1.0);
    }

    /// Add to a counter or cumulative gauge.
    pub fn add(&mut self, family: &'static Family, labels: &[(&str, &str)], value: f64) {
        let key = SampleKey::new(family.name, labels);
        *self.scalars.entry(key.clone()).or_insert(0.0) += value;
        if family.kind == FamilyKind::Gauge {
            self.touched.insert(key);
        }
    }

    /// Set a gauge to a value.
    pub fn set(&mut self, family: &'static Family, labels: &[(&str, &str)], value: f64) {
        let key = SampleKey::new(family.name, labels);
        self.scalars.insert(key.clone(), value);
        self.touched.insert(key);
    }

    /// Observe a histogram value.
    pub fn observe(&mut self, family: &'static Family, labels: &[(&str, &str)], value: f64) {
        let key = SampleKey::new(family.name, labels);
        self.histograms
            .entry(key)
            .or_insert_with(|| Histogram::new(DURATION_BUCKETS))
            .observe(value);
    }

    /// Record a successful upload: last-size gauge and running byte total.
    pub fn record_upload_success(&mut self, size_bytes: u64) {
        self.set(&super::LAST_FILE_SIZE_BYTES, &[], size_bytes as f64);
        self.add(&super::TOTAL_BYTES_UPLOADED, &[], size_bytes as f64);
    }

    /// Whether a gauge was explicitly set this run.
    pub fn was_set(&self, key: &SampleKey) -> bool {
        self.touched.contains(key)
    }

    /// Iterate counter and gauge samples.
    pub fn scalar_samples(&self) -> impl Iterator<Item = (&SampleKey, f64)> {
        self.scalars.iter().map(|(k, v)| (k, *v))
    }

    /// Look up a scalar value (tests and logging).
    pub fn scalar(&self, family: &Family, labels: &[(&str, &str)]) -> Option<f64> {
        self.scalars.get(&SampleKey::new(family.name, labels)).copied()
    }

    /// Encode an exposition document from the given scalar values plus
    /// this run's histograms.
    ///
    /// The scalar map is supplied by the caller so the reconciler can
    /// encode merged values; grouping-key labels are never included here,
    /// the gateway attaches them itself.
    pub fn encode(&self, scalars: &IndexMap<SampleKey, f64>) -> String {
        let mut out = String::new();

        for family in super::ALL {
            let mut samples: Vec<(&SampleKey, f64)> = scalars
                .iter()
                .filter(|(k, _)| k.name() == family.name)
                .map(|(k, v)| (k, *v))
                .collect();
            let histograms: Vec<(&SampleKey, &Histogram)> = self
                .histograms
                .iter()
                .filter(|(k, _)| k.name() == family.name)
                .collect();

            if samples.is_empty() && histograms.is_empty() {
                continue;
            }

            out.push_str(&format!("# HELP {} {}\n", family.name, escape_help(family.help)));
            out.push_str(&format!(
                "# TYPE {} {}\n",
                family.name,
                family.kind.type_keyword()
            ));

            samples.sort_by(|a, b| a.0.labels().cmp(b.0.labels()));
            for (key, value) in samples {
                out.push_str(&format_sample(family.name, key.labels(), value));
                out.push('\n');
            }

            for (key, histogram) in histograms {
                for (bound, count) in &histogram.buckets {
                    let mut labels = key.labels().to_vec();
                    labels.push(("le".to_string(), format_bound(*bound)));
                    out.push_str(&format_sample(
                        &format!("{}_bucket", family.name),
                        &labels,
                        *count as f64,
                    ));
                    out.push('\n');
                }
                let mut labels = key.labels().to_vec();
                labels.push(("le".to_string(), "+Inf".to_string()));
                out.push_str(&format_sample(
                    &format!("{}_bucket", family.name),
                    &labels,
                    histogram.count as f64,
                ));
                out.push('\n');
                out.push_str(&format_sample(
                    &format!("{}_sum", family.name),
                    key.labels(),
                    histogram.sum,
                ));
                out.push('\n');
                out.push_str(&format_sample(
                    &format!("{}_count", family.name),
                    key.labels(),
                    histogram.count as f64,
                ));
                out.push('\n');
            }
        }

        out
    }

    /// Encode this run's local values as-is (no remote merge).
    pub fn encode_local(&self) -> String {
        self.encode(&self.scalars)
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn format_bound(bound: f64) -> String {
    if bound == bound.trunc() {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        CONNECTION_FAILURE_TOTAL, CONNECTION_SUCCESS_TOTAL, DURATION_SECONDS,
        LAST_FILE_SIZE_BYTES, TOTAL_BYTES_UPLOADED,
    };
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.scalar(&CONNECTION_SUCCESS_TOTAL, &[]), Some(0.0));
        assert_eq!(
            metrics.scalar(
                &CONNECTION_FAILURE_TOTAL,
                &[("error_type", "authentication_error")]
            ),
            Some(0.0)
        );
    }

    #[test]
    fn test_inc_and_add() {
        let mut metrics = RunMetrics::new();
        metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        assert_eq!(metrics.scalar(&CONNECTION_SUCCESS_TOTAL, &[]), Some(2.0));
    }

    #[test]
    fn test_upload_success_updates_both_gauges() {
        let mut metrics = RunMetrics::new();
        metrics.record_upload_success(100);
        metrics.record_upload_success(250);
        assert_eq!(metrics.scalar(&LAST_FILE_SIZE_BYTES, &[]), Some(250.0));
        assert_eq!(metrics.scalar(&TOTAL_BYTES_UPLOADED, &[]), Some(350.0));
        assert!(metrics.was_set(&SampleKey::new(LAST_FILE_SIZE_BYTES.name, &[])));
    }

    #[test]
    fn test_untouched_gauge_is_not_set() {
        let metrics = RunMetrics::new();
        assert!(!metrics.was_set(&SampleKey::new(LAST_FILE_SIZE_BYTES.name, &[])));
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let mut metrics = RunMetrics::new();
        metrics.observe(&DURATION_SECONDS, &[("operation", "total")], 7.0);
        metrics.observe(&DURATION_SECONDS, &[("operation", "total")], 40.0);

        let encoded = metrics.encode_local();
        assert!(encoded.contains(r#"backup_duration_seconds_bucket{operation="total",le="5"} 0"#));
        assert!(encoded.contains(r#"backup_duration_seconds_bucket{operation="total",le="10"} 1"#));
        assert!(encoded.contains(r#"backup_duration_seconds_bucket{operation="total",le="60"} 2"#));
        assert!(
            encoded.contains(r#"backup_duration_seconds_bucket{operation="total",le="+Inf"} 2"#)
        );
        assert!(encoded.contains(r#"backup_duration_seconds_sum{operation="total"} 47"#));
        assert!(encoded.contains(r#"backup_duration_seconds_count{operation="total"} 2"#));
    }

    #[test]
    fn test_encode_has_help_and_type() {
        let metrics = RunMetrics::new();
        let encoded = metrics.encode_local();
        assert!(encoded.contains("# HELP backup_connection_success_total"));
        assert!(encoded.contains("# TYPE backup_connection_success_total counter"));
        assert!(encoded.contains("# TYPE backup_last_file_size_bytes gauge"));
        assert!(encoded.contains("backup_connection_success_total 0"));
    }

    #[test]
    fn test_encode_parses_back() {
        let mut metrics = RunMetrics::new();
        metrics.inc(&CONNECTION_SUCCESS_TOTAL, &[]);
        metrics.record_upload_success(42);

        let snapshot =
            crate::metrics::exposition::Snapshot::parse(&metrics.encode_local()).unwrap();
        assert_eq!(
            snapshot.value(&SampleKey::new(CONNECTION_SUCCESS_TOTAL.name, &[])),
            Some(1.0)
        );
        assert_eq!(
            snapshot.value(&SampleKey::new(LAST_FILE_SIZE_BYTES.name, &[])),
            Some(42.0)
        );
    }
}
