//! Built-in device profile registry.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::DeviceProfile;
use super::vendors;

/// Built-in profiles, constructed once.
static REGISTRY: Lazy<ProfileRegistry> = Lazy::new(|| {
    let mut registry = ProfileRegistry::new();
    registry.register(vendors::fortigate::profile());
    registry.register(vendors::juniper_sw::profile());
    registry.register(vendors::palo_alto::profile());
    registry
});

/// Registry of device profiles, looked up by name.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: IndexMap<String, DeviceProfile>,
}

impl ProfileRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            profiles: IndexMap::new(),
        }
    }

    /// The registry of built-in profiles.
    pub fn builtin() -> &'static ProfileRegistry {
        &REGISTRY
    }

    /// Register a profile.
    pub fn register(&mut self, profile: DeviceProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Get a profile by name.
    pub fn get(&self, name: &str) -> Option<&DeviceProfile> {
        self.profiles.get(name)
    }

    /// List registered profile names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.profiles.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_registered() {
        let registry = ProfileRegistry::builtin();
        assert!(registry.get("fortigate").is_some());
        assert!(registry.get("juniper_sw").is_some());
        assert!(registry.get("palo_alto").is_some());
        assert!(registry.get("cisco_iosxe").is_none());
    }

    #[test]
    fn test_names_lists_all() {
        let names: Vec<_> = ProfileRegistry::builtin().names().cloned().collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"fortigate".to_string()));
    }
}
