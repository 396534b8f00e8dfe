//! CPU collector options.

use serde::{Deserialize, Serialize};

use crate::status::Thresholds;

fn default_sample_millis() -> u64 {
    250
}

fn default_thresholds() -> Thresholds {
    Thresholds::new(70.0, 90.0)
}

fn default_per_core_tooltip() -> bool {
    true
}

/// CPU collector options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CpuOptions {
    /// Delay between the two usage samples, raised to sysinfo's minimum
    #[serde(default = "default_sample_millis")]
    pub sample_millis: u64,
    /// List every core in the tooltip
    #[serde(default = "default_per_core_tooltip")]
    pub per_core_tooltip: bool,
    #[serde(default = "default_thresholds")]
    pub thresholds: Thresholds,
}

impl Default for CpuOptions {
    fn default() -> Self {
        Self {
            sample_millis: default_sample_millis(),
            per_core_tooltip: default_per_core_tooltip(),
            thresholds: default_thresholds(),
        }
    }
}
