//! Module state, fetch requests and fetch results

use crate::status::StatusClass;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::collections::HashMap;

/// Named values produced by a collector and consumed by format templates
pub type Fields = HashMap<String, Value>;

/// What a collector returns from one successful collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    /// Raw values available to templates
    pub fields: Fields,
    /// Collector-generated tooltip, used when a format has no tooltip template
    pub tooltip: String,
    /// Status the collector derived from the data
    pub status: StatusClass,
    /// Optional percentage for bar widgets that draw a level
    pub percentage: Option<f64>,
}

impl Sample {
    pub fn new(status: StatusClass) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Insert a field, builder style
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }
}

/// Handed to a collector for one fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Format that was active when the fetch started
    pub format_index: usize,
    /// Target of that format (interface, mount point, ...)
    pub target: Option<String>,
}

/// Immutable outcome of one fetch cycle
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub success: bool,
    pub payload: Option<Sample>,
    pub error: Option<String>,
    /// Format the fetch was performed for
    pub format_index: usize,
    pub finished_at: DateTime<Local>,
}

impl FetchResult {
    pub fn succeeded(sample: Sample, format_index: usize) -> Self {
        Self {
            success: true,
            payload: Some(sample),
            error: None,
            format_index,
            finished_at: Local::now(),
        }
    }

    pub fn failed(error: impl Into<String>, format_index: usize) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
            format_index,
            finished_at: Local::now(),
        }
    }
}

/// Lifecycle of a module process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePhase {
    /// State seeded with the placeholder, no threads running yet
    Starting,
    /// Runtime started, first fetch requested but not picked up
    AwaitingFirstFetch,
    /// A collection is running
    Fetching,
    /// The last fetch (successful or not) has been committed
    Ready,
}

/// Display state owned by the state store
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleState {
    pub display_text: String,
    pub tooltip: String,
    pub status_class: StatusClass,
    /// Always less than the configured format count
    pub format_index: usize,
    pub percentage: Option<f64>,
    /// Time of the last successful commit
    pub last_updated: Option<DateTime<Local>>,
    /// Error of the most recent fetch, cleared by a successful one
    pub last_error: Option<String>,
    /// Last good sample, kept so a format change can re-render without fetching
    pub sample: Option<Sample>,
}

impl ModuleState {
    /// State shown before the first fetch completes
    pub fn placeholder(text: &str) -> Self {
        Self {
            display_text: text.to_string(),
            tooltip: text.to_string(),
            status_class: StatusClass::Loading,
            format_index: 0,
            percentage: None,
            last_updated: None,
            last_error: None,
            sample: None,
        }
    }

    pub fn has_sample(&self) -> bool {
        self.sample.is_some()
    }
}
