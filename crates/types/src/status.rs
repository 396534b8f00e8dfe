//! Status classes emitted in the `class` field of the wire payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS class a module reports to the bar.
///
/// `Ok`, `Warning` and `Critical` come from collectors. `Stale` marks a
/// display that kept the last good value after a failed fetch, `Error` a
/// failure with no good value to fall back to, and `Loading` the startup
/// placeholder or an in-flight fetch when the loading indicator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    #[default]
    Ok,
    Warning,
    Critical,
    Stale,
    Loading,
    Error,
}

impl StatusClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Ok => "ok",
            StatusClass::Warning => "warning",
            StatusClass::Critical => "critical",
            StatusClass::Stale => "stale",
            StatusClass::Loading => "loading",
            StatusClass::Error => "error",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_warning() -> f64 {
    50.0
}

fn default_critical() -> f64 {
    80.0
}

/// Percentage thresholds used by collectors to pick a status class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Usage at or above this percentage is a warning
    #[serde(default = "default_warning")]
    pub warning: f64,
    /// Usage at or above this percentage is critical
    #[serde(default = "default_critical")]
    pub critical: f64,
}

impl Thresholds {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    /// Classify a usage percentage.
    pub fn classify(&self, percent: f64) -> StatusClass {
        if percent >= self.critical {
            StatusClass::Critical
        } else if percent >= self.warning {
            StatusClass::Warning
        } else {
            StatusClass::Ok
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(default_warning(), default_critical())
    }
}
