//! Filesystem collector options.

use serde::{Deserialize, Serialize};

use crate::status::Thresholds;
use crate::units::ByteUnit;

fn default_mountpoint() -> String {
    "/".to_string()
}

/// Filesystem collector options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesystemOptions {
    /// Mount point used when a format has no target
    #[serde(default = "default_mountpoint")]
    pub mountpoint: String,
    #[serde(default)]
    pub unit: ByteUnit,
    /// Thresholds applied to the used percentage, e.g. `{"warning": 50, "critical": 80}`
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Default for FilesystemOptions {
    fn default() -> Self {
        Self {
            mountpoint: default_mountpoint(),
            unit: ByteUnit::default(),
            thresholds: Thresholds::default(),
        }
    }
}
