//! Juniper EX/QFX switch profile.
//!
//! Juniper switches drop into a Unix shell first; the session enters the
//! JUNOS CLI and disables paging before asking for the configuration in
//! `display set` form. With the pager off there is no pagination marker,
//! and the set-style output is normalized (space runs collapsed, blank
//! lines dropped) the way downstream diff tooling expects it.

use std::time::Duration;

use crate::device::{AccessMethod, DeviceProfile, InteractiveSpec, PromptStyle};
use crate::scrape::NormalizePolicy;

/// Profile name for Juniper switches.
pub const PROFILE_NAME: &str = "juniper_sw";

/// Create the Juniper switch device profile.
pub fn profile() -> DeviceProfile {
    let spec = InteractiveSpec::new("show configuration | display set")
        .with_setup_command("cli")
        .with_setup_command("set cli screen-length 0")
        .with_prompt_style(PromptStyle::UserAndDeviceName)
        .with_poll_timeout(Duration::from_secs(3))
        .with_settle(Duration::from_secs(2));

    DeviceProfile::new(PROFILE_NAME, AccessMethod::Interactive(spec))
        .with_normalize(NormalizePolicy::COMPACT)
        .with_artifact_name("juniper_backup.txt")
        .with_object_prefix("backup-sw-juniper")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_juniper_profile() {
        let profile = profile();
        assert_eq!(profile.name, "juniper_sw");
        assert_eq!(profile.normalize, NormalizePolicy::COMPACT);

        let AccessMethod::Interactive(spec) = &profile.access else {
            panic!("juniper_sw is an interactive profile");
        };
        assert_eq!(
            spec.setup_commands,
            vec!["cli".to_string(), "set cli screen-length 0".to_string()]
        );
        assert_eq!(spec.retrieval_command, "show configuration | display set");
        assert!(spec.pagination_marker.is_none());
        assert_eq!(spec.prompt_style, PromptStyle::UserAndDeviceName);
        assert_eq!(spec.poll_timeout, Duration::from_secs(3));
    }
}
