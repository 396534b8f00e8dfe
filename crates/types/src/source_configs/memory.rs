//! Memory collector options.

use serde::{Deserialize, Serialize};

use crate::status::Thresholds;
use crate::units::ByteUnit;

/// Memory collector options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MemoryOptions {
    /// Unit for the formatted byte fields
    #[serde(default)]
    pub unit: ByteUnit,
    /// Thresholds applied to the used percentage, e.g. `{"warning": 50, "critical": 80}`
    #[serde(default)]
    pub thresholds: Thresholds,
}
