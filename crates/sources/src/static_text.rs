//! Static text collector
//!
//! Returns the configured fields on every fetch. Useful for labels and for
//! trying out formats without touching the system.

use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchRequest, FieldMetadata,
    FieldType, FormatTemplate, Sample,
};
use waystat_types::source_configs::StaticTextOptions;

/// Static text collector
pub struct StaticTextCollector {
    metadata: CollectorMetadata,
    options: StaticTextOptions,
}

impl StaticTextCollector {
    pub fn new() -> Self {
        Self {
            metadata: CollectorMetadata {
                id: "static".to_string(),
                name: "Static Text".to_string(),
                description: "Fixed fields taken from the configuration".to_string(),
                default_interval: Duration::from_secs(60),
            },
            options: StaticTextOptions::default(),
        }
    }
}

impl Default for StaticTextCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for StaticTextCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        let mut fields: Vec<_> = self
            .options
            .fields
            .keys()
            .map(|key| FieldMetadata::new(key, "Configured value", FieldType::Text))
            .collect();
        fields.sort_by(|a, b| a.id.cmp(&b.id));
        fields.push(FieldMetadata::new(
            "target",
            "Target of the active format",
            FieldType::Text,
        ));
        fields
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![FormatTemplate::new("{text}")]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        self.options = parse_options(&self.metadata.id, options)?;
        Ok(())
    }

    fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
        let mut sample = Sample::new(self.options.class).with_tooltip(self.options.tooltip.clone());
        sample.fields = self.options.fields.clone();
        if let Some(target) = &request.target {
            sample.insert("target", target.as_str());
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use waystat_core::StatusClass;

    #[test]
    fn test_returns_configured_fields() {
        let mut collector = StaticTextCollector::new();
        collector
            .configure(&json!({
                "fields": {"text": "hello", "count": 3},
                "tooltip": "fixed",
                "class": "warning"
            }))
            .unwrap();

        let request = FetchRequest {
            format_index: 0,
            target: Some("left".to_string()),
        };
        let sample = collector.collect(&request).unwrap();
        assert_eq!(sample.fields["text"], "hello");
        assert_eq!(sample.fields["count"], 3);
        assert_eq!(sample.fields["target"], "left");
        assert_eq!(sample.tooltip, "fixed");
        assert_eq!(sample.status, StatusClass::Warning);
    }

    #[test]
    fn test_rejects_unknown_options() {
        let mut collector = StaticTextCollector::new();
        assert!(collector.configure(&json!({"colour": "red"})).is_err());
    }
}
