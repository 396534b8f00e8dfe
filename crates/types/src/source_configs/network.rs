//! Network collector options.

use serde::{Deserialize, Serialize};

/// How throughput is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    /// bit/s, Kbit/s, ...
    #[default]
    Bits,
    /// B/s, KiB/s, ...
    Bytes,
}

fn default_sample_millis() -> u64 {
    1000
}

/// Network collector options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkOptions {
    /// Interface used when a format has no target
    #[serde(default)]
    pub interface: Option<String>,
    /// Sampling window for the throughput measurement
    #[serde(default = "default_sample_millis")]
    pub sample_millis: u64,
    #[serde(default)]
    pub rate_unit: RateUnit,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            interface: None,
            sample_millis: default_sample_millis(),
            rate_unit: RateUnit::default(),
        }
    }
}
