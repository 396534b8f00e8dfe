//! Module configuration, read once at startup

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_interval_seconds() -> u64 {
    5
}

fn default_placeholder() -> String {
    "Working…".to_string()
}

fn default_commands() -> bool {
    true
}

/// One alternate representation of a module's data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatTemplate {
    /// Bar text template, e.g. `"{used} / {total}"`
    pub text: String,
    /// Tooltip template; the collector's tooltip is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    /// What the collector should read for this format (interface, mount point)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl FormatTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tooltip: None,
            target: None,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Configuration of one module process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Collector id, e.g. `"memory"`
    pub module: String,
    /// Seconds between periodic fetches
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Formats cycled through on click; collector defaults when empty
    #[serde(default)]
    pub formats: Vec<FormatTemplate>,
    /// Text shown until the first fetch completes
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Show the previous text with class `loading` while fetching
    #[serde(default)]
    pub loading_indicator: bool,
    /// Read click commands from stdin
    #[serde(default = "default_commands")]
    pub commands: bool,
    /// Collector specific options
    #[serde(default)]
    pub options: Value,
}

impl ModuleConfig {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            interval_seconds: default_interval_seconds(),
            formats: Vec::new(),
            placeholder: default_placeholder(),
            loading_indicator: false,
            commands: default_commands(),
            options: Value::Null,
        }
    }

    pub fn format_count(&self) -> usize {
        self.formats.len()
    }
}
