//! Collector trait and related types

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use waystat_types::{FetchRequest, FieldMetadata, FormatTemplate, Sample};

use crate::error::ConfigError;

/// Metadata about a collector
#[derive(Debug, Clone)]
pub struct CollectorMetadata {
    /// Unique identifier used as `module` in the configuration
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what this collector provides
    pub description: String,
    /// Recommended fetch interval
    pub default_interval: Duration,
}

/// Trait for all metric collectors
///
/// A collector performs the (possibly slow) work of gathering one metric.
/// It is owned by the fetch worker and only ever called from that thread, so
/// `collect` may block on subprocesses or sampling delays.
pub trait Collector: Send {
    /// Get metadata about this collector
    fn metadata(&self) -> &CollectorMetadata;

    /// Fields a sample may contain, for `--list` and documentation
    fn fields(&self) -> Vec<FieldMetadata>;

    /// Formats used when the configuration does not define any
    fn default_formats(&self) -> Vec<FormatTemplate>;

    /// Apply collector specific options from the module configuration
    fn configure(&mut self, _options: &Value) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Gather one sample for the given request
    fn collect(&mut self, request: &FetchRequest) -> Result<Sample>;

    /// Check if this collector can work on the current system
    fn is_available(&self) -> bool {
        true
    }
}

/// Type-erased collector for dynamic dispatch
pub type BoxedCollector = Box<dyn Collector>;

/// Deserialize collector options, treating a missing `options` object as defaults
pub fn parse_options<T>(module: &str, options: &Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| ConfigError::Options {
        module: module.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Opts {
        #[serde(default)]
        size: u32,
    }

    #[test]
    fn test_parse_options_null_is_default() {
        let opts: Opts = parse_options("demo", &Value::Null).unwrap();
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn test_parse_options_reports_module() {
        let err = parse_options::<Opts>("demo", &json!({"sise": 3})).unwrap_err();
        assert!(err.to_string().starts_with("invalid options for demo"));
    }
}
