//! Filesystem usage collector

use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use sysinfo::Disks;
use waystat_core::units::{format_bytes, percent};
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchError, FetchRequest,
    FieldMetadata, FieldType, FormatTemplate, Sample,
};
use waystat_types::source_configs::FilesystemOptions;

/// Space figures of one mount point
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiskReading {
    pub mountpoint: String,
    pub device: String,
    pub file_system: String,
    pub total: u64,
    pub available: u64,
}

/// Filesystem collector
///
/// Reports used and free space of a mount point. Each format may name its
/// own mount point as `target`.
pub struct FilesystemCollector {
    metadata: CollectorMetadata,
    options: FilesystemOptions,
    disks: Disks,
}

impl FilesystemCollector {
    pub fn new() -> Self {
        Self {
            metadata: CollectorMetadata {
                id: "filesystem".to_string(),
                name: "Filesystem".to_string(),
                description: "Used and free space of a mount point".to_string(),
                default_interval: Duration::from_secs(30),
            },
            options: FilesystemOptions::default(),
            disks: Disks::new_with_refreshed_list(),
        }
    }

    fn find(&self, mountpoint: &str) -> Option<DiskReading> {
        self.disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new(mountpoint))
            .map(|disk| DiskReading {
                mountpoint: mountpoint.to_string(),
                device: disk.name().to_string_lossy().to_string(),
                file_system: disk.file_system().to_string_lossy().to_string(),
                total: disk.total_space(),
                available: disk.available_space(),
            })
    }

    fn read(&mut self, mountpoint: &str) -> Result<DiskReading, FetchError> {
        self.disks.refresh();
        if let Some(reading) = self.find(mountpoint) {
            return Ok(reading);
        }
        // Mounted after startup
        self.disks.refresh_list();
        self.find(mountpoint).ok_or_else(|| FetchError::NotFound {
            kind: "mount point",
            name: mountpoint.to_string(),
        })
    }

    /// Build the sample for one reading
    pub fn sample(&self, reading: &DiskReading) -> Sample {
        let unit = self.options.unit;
        let used = reading.total.saturating_sub(reading.available);
        let pct_used = percent(used, reading.total);

        let tooltip = format!(
            "{} ({}, {})\n  Total : {}\n  Used  : {} ({:.0}%)\n  Free  : {}",
            reading.mountpoint,
            reading.device,
            reading.file_system,
            format_bytes(reading.total, unit),
            format_bytes(used, unit),
            pct_used,
            format_bytes(reading.available, unit),
        );

        Sample::new(self.options.thresholds.classify(pct_used))
            .with_field("mountpoint", reading.mountpoint.as_str())
            .with_field("device", reading.device.as_str())
            .with_field("file_system", reading.file_system.as_str())
            .with_field("total", format_bytes(reading.total, unit))
            .with_field("used", format_bytes(used, unit))
            .with_field("free", format_bytes(reading.available, unit))
            .with_field("pct_used", pct_used)
            .with_field("pct_free", 100.0 - pct_used)
            .with_tooltip(tooltip)
            .with_percentage(pct_used)
    }
}

impl Default for FilesystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for FilesystemCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new("mountpoint", "Mount point", FieldType::Text),
            FieldMetadata::new("device", "Device name", FieldType::Text),
            FieldMetadata::new("file_system", "Filesystem type", FieldType::Text),
            FieldMetadata::new("total", "Total space", FieldType::Bytes),
            FieldMetadata::new("used", "Used space", FieldType::Bytes),
            FieldMetadata::new("free", "Space available to users", FieldType::Bytes),
            FieldMetadata::new("pct_used", "Used space in percent", FieldType::Percentage),
            FieldMetadata::new("pct_free", "Free space in percent", FieldType::Percentage),
        ]
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![
            FormatTemplate::new("{mountpoint} {free} free"),
            FormatTemplate::new("{mountpoint} {pct_used:.0}%"),
        ]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        self.options = parse_options(&self.metadata.id, options)?;
        Ok(())
    }

    fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
        let mountpoint = request
            .target
            .clone()
            .unwrap_or_else(|| self.options.mountpoint.clone());
        let reading = self.read(&mountpoint)?;
        Ok(self.sample(&reading))
    }
}
