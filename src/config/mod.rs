pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{ConfigLoader, CONFIG_FILE_NAME, USER_CONFIG_PATH};

use crate::logging::LogFormat;

/// Options consulted by the registry rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteOptions {
    pub forwarding: ForwardingOptions,
    pub diagnostics: DiagnosticsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingOptions {
    /// What `forward` does when both keys are the same service
    pub duplicate_keys: DuplicateKeyPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Fail with `InvalidArgument` and leave the registry untouched
    #[default]
    Reject,
    /// Register the implementation and a single forwarded key
    Collapse,
}

impl DuplicateKeyPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(DuplicateKeyPolicy::Reject),
            "collapse" => Some(DuplicateKeyPolicy::Collapse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsOptions {
    /// Dump the registry snapshot as JSON after each rewrite, at debug level
    pub log_snapshots: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for DiagnosticsOptions {
    fn default() -> Self {
        Self {
            log_snapshots: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
