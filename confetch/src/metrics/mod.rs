//! Run metrics and push-gateway reconciliation.
//!
//! Each run starts from a zero-valued, run-owned counter set
//! ([`RunMetrics`]); cross-run continuity is reconstructed at publish time
//! by merging with whatever the push gateway currently holds for this
//! run's grouping key. Metric names and semantics are declared centrally
//! here so the recorder, the encoder, and the reconciler cannot drift
//! apart.

pub mod exposition;
mod recorder;
mod reconcile;

pub use recorder::RunMetrics;
pub use reconcile::{GatewayClient, Reconciler, merge_with_remote};

/// Exposition metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    Counter,
    Gauge,
    Histogram,
}

impl FamilyKind {
    /// The `# TYPE` keyword for this kind.
    pub fn type_keyword(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

/// How a published value is derived from remote state and this run's
/// locally observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSemantics {
    /// `remote + local`: counters, and gauges that are cumulative totals.
    Accumulate,

    /// Local value if observed this run, otherwise the remote value is
    /// carried forward unchanged.
    LastValue,

    /// Local values only; whatever the gateway held is replaced.
    Replace,
}

/// One metric family: name, help text, kind, and merge semantics.
#[derive(Debug, Clone, Copy)]
pub struct Family {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: FamilyKind,
    pub merge: MergeSemantics,
}

pub const CONNECTION_SUCCESS_TOTAL: Family = Family {
    name: "backup_connection_success_total",
    help: "Total number of successful device connections",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const CONNECTION_FAILURE_TOTAL: Family = Family {
    name: "backup_connection_failure_total",
    help: "Total number of failed device connections",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const CONFIGURATION_SUCCESS_TOTAL: Family = Family {
    name: "backup_configuration_success_total",
    help: "Total number of successful configuration retrievals",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const CONFIGURATION_FAILURE_TOTAL: Family = Family {
    name: "backup_configuration_failure_total",
    help: "Total number of failed configuration retrievals",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const UPLOAD_SUCCESS_TOTAL: Family = Family {
    name: "backup_upload_success_total",
    help: "Total number of successful artifact uploads",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const UPLOAD_FAILURE_TOTAL: Family = Family {
    name: "backup_upload_failure_total",
    help: "Total number of failed artifact uploads",
    kind: FamilyKind::Counter,
    merge: MergeSemantics::Accumulate,
};

pub const DURATION_SECONDS: Family = Family {
    name: "backup_duration_seconds",
    help: "Duration of backup operations in seconds",
    kind: FamilyKind::Histogram,
    merge: MergeSemantics::Replace,
};

pub const LAST_FILE_SIZE_BYTES: Family = Family {
    name: "backup_last_file_size_bytes",
    help: "Size of the last uploaded artifact in bytes",
    kind: FamilyKind::Gauge,
    merge: MergeSemantics::LastValue,
};

pub const TOTAL_BYTES_UPLOADED: Family = Family {
    name: "backup_total_bytes_uploaded",
    help: "Total bytes uploaded across runs",
    kind: FamilyKind::Gauge,
    merge: MergeSemantics::Accumulate,
};

pub const LAST_SUCCESS_TIMESTAMP: Family = Family {
    name: "backup_last_success_timestamp",
    help: "Unix timestamp of the last successful operation",
    kind: FamilyKind::Gauge,
    merge: MergeSemantics::LastValue,
};

pub const LAST_FAILURE_TIMESTAMP: Family = Family {
    name: "backup_last_failure_timestamp",
    help: "Unix timestamp of the last failed operation",
    kind: FamilyKind::Gauge,
    merge: MergeSemantics::LastValue,
};

/// Every family, in exposition order.
pub const ALL: &[&Family] = &[
    &CONNECTION_SUCCESS_TOTAL,
    &CONNECTION_FAILURE_TOTAL,
    &CONFIGURATION_SUCCESS_TOTAL,
    &CONFIGURATION_FAILURE_TOTAL,
    &UPLOAD_SUCCESS_TOTAL,
    &UPLOAD_FAILURE_TOTAL,
    &DURATION_SECONDS,
    &LAST_FILE_SIZE_BYTES,
    &TOTAL_BYTES_UPLOADED,
    &LAST_SUCCESS_TIMESTAMP,
    &LAST_FAILURE_TIMESTAMP,
];

/// Histogram bucket bounds for [`DURATION_SECONDS`].
pub const DURATION_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// Look up a family by metric name.
pub fn family(name: &str) -> Option<&'static Family> {
    ALL.iter().copied().find(|f| f.name == name)
}

/// Current unix time as a gauge value.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}
