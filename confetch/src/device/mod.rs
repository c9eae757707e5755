//! Device profiles for multi-vendor support.
//!
//! A profile carries everything vendor-specific about one appliance type:
//! how to reach it (interactive shell or REST API), the exact retrieval
//! command, pager behavior, whitespace policy, and where the resulting
//! artifact lives locally and in the object store. The fetchers themselves
//! are vendor-agnostic and are parametrized entirely by a profile.

mod registry;
pub mod vendors;

pub use registry::ProfileRegistry;

use std::time::Duration;

use crate::scrape::NormalizePolicy;

/// How a device exposes its configuration.
#[derive(Debug, Clone)]
pub enum AccessMethod {
    /// Screen-scraped interactive shell session.
    Interactive(InteractiveSpec),

    /// REST API with a keygen authentication exchange.
    Api(ApiSpec),
}

/// How the completion marker (the returning prompt) is derived from the
/// run's device settings when no explicit override is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// The prompt contains the appliance name.
    DeviceName,

    /// The prompt is the login user name immediately followed by the
    /// appliance name.
    UserAndDeviceName,
}

/// Parameters for the interactive (scraped) retrieval path.
#[derive(Debug, Clone)]
pub struct InteractiveSpec {
    /// Mode-setup commands sent before the retrieval command
    /// (entering the CLI, disabling the pager).
    pub setup_commands: Vec<String>,

    /// The command whose output is the configuration snapshot.
    pub retrieval_command: String,

    /// Pager marker the device prints when holding output, if any.
    pub pagination_marker: Option<String>,

    /// Keystroke that answers the pager.
    pub continuation: String,

    /// How the default completion marker is derived.
    pub prompt_style: PromptStyle,

    /// Per-poll receive timeout while scraping.
    pub poll_timeout: Duration,

    /// Quiet period after connect / setup commands before proceeding.
    pub settle: Duration,

    /// Default SSH port.
    pub default_port: u16,
}

/// Parameters for the REST retrieval path.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    /// Operational command requesting the running configuration.
    pub retrieval_cmd: String,

    /// Default API port.
    pub default_port: u16,
}

/// Device profile containing all vendor-specific configuration.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Profile name (e.g. "fortigate", "juniper_sw", "palo_alto").
    pub name: String,

    /// How the configuration is retrieved.
    pub access: AccessMethod,

    /// Whitespace policy for scraped output.
    pub normalize: NormalizePolicy,

    /// Local artifact file name for the snapshot.
    pub artifact_name: String,

    /// Destination prefix for uploaded objects.
    pub object_prefix: String,
}

impl DeviceProfile {
    /// Create a profile with the given name and access method.
    pub fn new(name: impl Into<String>, access: AccessMethod) -> Self {
        Self {
            name: name.into(),
            access,
            normalize: NormalizePolicy::RAW,
            artifact_name: String::new(),
            object_prefix: String::new(),
        }
    }

    /// Set the whitespace policy.
    pub fn with_normalize(mut self, normalize: NormalizePolicy) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the local artifact file name.
    pub fn with_artifact_name(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self
    }

    /// Set the object-store destination prefix.
    pub fn with_object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = prefix.into();
        self
    }

    /// Default port for this profile's access method.
    pub fn default_port(&self) -> u16 {
        match &self.access {
            AccessMethod::Interactive(spec) => spec.default_port,
            AccessMethod::Api(spec) => spec.default_port,
        }
    }
}

impl InteractiveSpec {
    /// Create a spec for the given retrieval command.
    pub fn new(retrieval_command: impl Into<String>) -> Self {
        Self {
            setup_commands: vec![],
            retrieval_command: retrieval_command.into(),
            pagination_marker: None,
            continuation: " ".to_string(),
            prompt_style: PromptStyle::DeviceName,
            poll_timeout: Duration::from_secs(1),
            settle: Duration::from_secs(1),
            default_port: 22,
        }
    }

    /// Add a mode-setup command.
    pub fn with_setup_command(mut self, command: impl Into<String>) -> Self {
        self.setup_commands.push(command.into());
        self
    }

    /// Set the pagination marker.
    pub fn with_pagination_marker(mut self, marker: impl Into<String>) -> Self {
        self.pagination_marker = Some(marker.into());
        self
    }

    /// Set the prompt style.
    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    /// Set the per-poll receive timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the post-connect settle period.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}
