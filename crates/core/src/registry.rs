//! Registry of available collectors

use crate::collector::BoxedCollector;
use crate::error::ConfigError;
use std::collections::BTreeMap;

/// Function that creates a collector
pub type CollectorFactory = fn() -> BoxedCollector;

/// Registry for collectors
///
/// Each module process builds its own registry at startup; there is no
/// process-wide instance.
pub struct Registry {
    collectors: BTreeMap<String, CollectorFactory>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            collectors: BTreeMap::new(),
        }
    }

    /// Register a collector, replacing any previous one with the same id
    pub fn register_collector(&mut self, id: &str, factory: CollectorFactory) {
        if self.collectors.insert(id.to_string(), factory).is_some() {
            log::debug!("Replaced collector registration for {}", id);
        }
    }

    /// Create a collector by ID
    pub fn create_collector(&self, id: &str) -> Result<BoxedCollector, ConfigError> {
        let factory = self
            .collectors
            .get(id)
            .ok_or_else(|| ConfigError::UnknownCollector {
                name: id.to_string(),
                available: self.list_collectors().join(", "),
            })?;
        Ok(factory())
    }

    /// List all registered collector IDs, sorted
    pub fn list_collectors(&self) -> Vec<String> {
        self.collectors.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.collectors.contains_key(id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Collector, CollectorMetadata};
    use crate::constants::DEFAULT_INTERVAL;
    use anyhow::Result;
    use waystat_types::{FetchRequest, FieldMetadata, FormatTemplate, Sample, StatusClass};

    struct Nothing(CollectorMetadata);

    impl Collector for Nothing {
        fn metadata(&self) -> &CollectorMetadata {
            &self.0
        }
        fn fields(&self) -> Vec<FieldMetadata> {
            Vec::new()
        }
        fn default_formats(&self) -> Vec<FormatTemplate> {
            vec![FormatTemplate::new("nothing")]
        }
        fn collect(&mut self, _request: &FetchRequest) -> Result<Sample> {
            Ok(Sample::new(StatusClass::Ok))
        }
    }

    fn nothing() -> BoxedCollector {
        Box::new(Nothing(CollectorMetadata {
            id: "nothing".to_string(),
            name: "Nothing".to_string(),
            description: "Returns an empty sample".to_string(),
            default_interval: DEFAULT_INTERVAL,
        }))
    }

    #[test]
    fn test_create_registered_collector() {
        let mut registry = Registry::new();
        registry.register_collector("nothing", nothing);
        let collector = registry.create_collector("nothing").unwrap();
        assert_eq!(collector.metadata().id, "nothing");
        assert!(registry.contains("nothing"));
    }

    #[test]
    fn test_unknown_collector_lists_available() {
        let mut registry = Registry::new();
        registry.register_collector("nothing", nothing);
        let err = registry.create_collector("weather").err().unwrap();
        let message = err.to_string();
        assert!(message.contains("\"weather\""));
        assert!(message.contains("available: nothing"));
    }
}
