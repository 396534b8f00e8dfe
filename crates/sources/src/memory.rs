//! Memory (RAM) collector

use anyhow::{bail, Result};
use serde_json::Value;
use std::time::Duration;
use sysinfo::System;
use waystat_core::units::{format_bytes, percent};
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchRequest, FieldMetadata,
    FieldType, FormatTemplate, Sample,
};
use waystat_types::source_configs::MemoryOptions;

/// Raw memory figures in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub total_swap: u64,
    pub used_swap: u64,
}

/// Memory collector
///
/// Reports RAM and swap usage. The status class follows RAM usage.
pub struct MemoryCollector {
    metadata: CollectorMetadata,
    options: MemoryOptions,
    system: System,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self {
            metadata: CollectorMetadata {
                id: "memory".to_string(),
                name: "Memory (RAM)".to_string(),
                description: "System memory (RAM) and swap usage".to_string(),
                default_interval: Duration::from_secs(5),
            },
            options: MemoryOptions::default(),
            system: System::new(),
        }
    }

    fn read(&mut self) -> MemoryReading {
        self.system.refresh_memory();
        MemoryReading {
            total: self.system.total_memory(),
            used: self.system.used_memory(),
            available: self.system.available_memory(),
            total_swap: self.system.total_swap(),
            used_swap: self.system.used_swap(),
        }
    }

    /// Build the sample for one reading
    pub fn sample(&self, reading: MemoryReading) -> Result<Sample> {
        if reading.total == 0 {
            bail!("memory information unavailable");
        }
        let unit = self.options.unit;
        let free = reading.total.saturating_sub(reading.used);
        let free_swap = reading.total_swap.saturating_sub(reading.used_swap);
        let pct_used = percent(reading.used, reading.total);
        let pct_swap = percent(reading.used_swap, reading.total_swap);

        let tooltip = format!(
            "Memory\n  Total     : {}\n  Used      : {} ({:.0}%)\n  Available : {}\nSwap\n  Total     : {}\n  Used      : {} ({:.0}%)",
            format_bytes(reading.total, unit),
            format_bytes(reading.used, unit),
            pct_used,
            format_bytes(reading.available, unit),
            format_bytes(reading.total_swap, unit),
            format_bytes(reading.used_swap, unit),
            pct_swap,
        );

        Ok(Sample::new(self.options.thresholds.classify(pct_used))
            .with_field("total", format_bytes(reading.total, unit))
            .with_field("used", format_bytes(reading.used, unit))
            .with_field("free", format_bytes(free, unit))
            .with_field("available", format_bytes(reading.available, unit))
            .with_field("pct_used", pct_used)
            .with_field("swap_total", format_bytes(reading.total_swap, unit))
            .with_field("swap_used", format_bytes(reading.used_swap, unit))
            .with_field("swap_free", format_bytes(free_swap, unit))
            .with_field("pct_swap", pct_swap)
            .with_tooltip(tooltip)
            .with_percentage(pct_used))
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for MemoryCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new("total", "Total RAM", FieldType::Bytes),
            FieldMetadata::new("used", "Used RAM", FieldType::Bytes),
            FieldMetadata::new("free", "Total minus used", FieldType::Bytes),
            FieldMetadata::new("available", "RAM available to new processes", FieldType::Bytes),
            FieldMetadata::new("pct_used", "Used RAM in percent", FieldType::Percentage),
            FieldMetadata::new("swap_total", "Total swap", FieldType::Bytes),
            FieldMetadata::new("swap_used", "Used swap", FieldType::Bytes),
            FieldMetadata::new("swap_free", "Free swap", FieldType::Bytes),
            FieldMetadata::new("pct_swap", "Used swap in percent", FieldType::Percentage),
        ]
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![
            FormatTemplate::new("{used} / {total}"),
            FormatTemplate::new("{pct_used:.0}% used"),
            FormatTemplate::new("{available} available"),
        ]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        self.options = parse_options(&self.metadata.id, options)?;
        Ok(())
    }

    fn collect(&mut self, _request: &FetchRequest) -> Result<Sample> {
        let reading = self.read();
        self.sample(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use waystat_core::StatusClass;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn reading(used_gib: u64) -> MemoryReading {
        MemoryReading {
            total: 16 * GIB,
            used: used_gib * GIB,
            available: (16 - used_gib) * GIB,
            total_swap: 4 * GIB,
            used_swap: GIB,
        }
    }

    #[test]
    fn test_sample_fields_and_status() {
        let collector = MemoryCollector::new();
        let sample = collector.sample(reading(4)).unwrap();
        assert_eq!(sample.fields["used"], "4 GiB");
        assert_eq!(sample.fields["total"], "16 GiB");
        assert_eq!(sample.fields["pct_used"], 25.0);
        assert_eq!(sample.fields["pct_swap"], 25.0);
        assert_eq!(sample.status, StatusClass::Ok);
        assert_eq!(sample.percentage, Some(25.0));
        assert!(sample.tooltip.contains("Used      : 4 GiB (25%)"));
    }

    #[test]
    fn test_thresholds_and_unit_from_options() {
        let mut collector = MemoryCollector::new();
        collector
            .configure(&json!({"unit": "Mi", "thresholds": {"warning": 20, "critical": 90}}))
            .unwrap();
        let sample = collector.sample(reading(4)).unwrap();
        assert_eq!(sample.status, StatusClass::Warning);
        assert_eq!(sample.fields["used"], "4096 MiB");

        let sample = collector.sample(reading(15)).unwrap();
        assert_eq!(sample.status, StatusClass::Critical);
    }

    #[test]
    fn test_zero_total_is_an_error() {
        let collector = MemoryCollector::new();
        assert!(collector.sample(MemoryReading::default()).is_err());
    }

    #[test]
    fn test_collect_reads_this_machine() {
        let mut collector = MemoryCollector::new();
        let request = FetchRequest {
            format_index: 0,
            target: None,
        };
        // Containers may hide memory figures; either outcome is valid
        if let Ok(sample) = collector.collect(&request) {
            assert!(sample.fields.contains_key("used"));
        }
    }
}
