//! Palo Alto PAN-OS profile.
//!
//! PAN-OS exposes its running configuration over the XML API: a keygen
//! exchange yields a short-lived API key, then an operational request
//! returns the configuration as an XML payload. The payload is stored
//! as-is; no scraping or normalization applies.

use crate::device::{AccessMethod, ApiSpec, DeviceProfile};
use crate::scrape::NormalizePolicy;

/// Profile name for Palo Alto firewalls.
pub const PROFILE_NAME: &str = "palo_alto";

/// Create the Palo Alto device profile.
pub fn profile() -> DeviceProfile {
    let spec = ApiSpec {
        retrieval_cmd: "<show><config><running></running></config></show>".to_string(),
        default_port: 443,
    };

    DeviceProfile::new(PROFILE_NAME, AccessMethod::Api(spec))
        .with_normalize(NormalizePolicy::RAW)
        .with_artifact_name("palo_alto_backup.xml")
        .with_object_prefix("backup-palo-alto")
}
