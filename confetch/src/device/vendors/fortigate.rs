//! Fortinet FortiGate profile.
//!
//! FortiGate firewalls land directly in their CLI on login and page long
//! output with a `--More--` prompt that a single space advances. The
//! pager cannot reliably be disabled per-session on all firmware lines,
//! so the scrape answers it instead.

use std::time::Duration;

use crate::device::{AccessMethod, DeviceProfile, InteractiveSpec};
use crate::scrape::NormalizePolicy;

/// Profile name for FortiGate firewalls.
pub const PROFILE_NAME: &str = "fortigate";

/// Create the FortiGate device profile.
pub fn profile() -> DeviceProfile {
    let spec = InteractiveSpec::new("show full-configuration")
        .with_pagination_marker("--More--")
        .with_poll_timeout(Duration::from_secs(1))
        .with_settle(Duration::from_secs(1));

    DeviceProfile::new(PROFILE_NAME, AccessMethod::Interactive(spec))
        .with_normalize(NormalizePolicy::RAW)
        .with_artifact_name("fortigate_backup.conf")
        .with_object_prefix("backup-fw")
}
