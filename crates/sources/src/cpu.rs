//! CPU collector implementation

use anyhow::{bail, Result};
use serde_json::Value;
use std::thread;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL};
use waystat_core::units::format_frequency;
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchRequest, FieldMetadata,
    FieldType, FormatTemplate, Sample,
};
use waystat_types::source_configs::CpuOptions;

/// Usage figures of one sampling window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuReading {
    pub usage: f32,
    pub per_core: Vec<f32>,
    /// MHz of the first core
    pub frequency: u64,
    pub brand: String,
}

/// CPU collector
///
/// Usage is measured over a short window: sysinfo needs two refreshes at
/// least `MINIMUM_CPU_UPDATE_INTERVAL` apart to compute it.
pub struct CpuCollector {
    metadata: CollectorMetadata,
    options: CpuOptions,
    system: System,
}

impl CpuCollector {
    pub fn new() -> Self {
        let system =
            System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::everything()));
        Self {
            metadata: CollectorMetadata {
                id: "cpu".to_string(),
                name: "CPU".to_string(),
                description: "Global and per-core CPU usage and frequency".to_string(),
                default_interval: Duration::from_secs(2),
            },
            options: CpuOptions::default(),
            system,
        }
    }

    fn window(&self) -> Duration {
        Duration::from_millis(self.options.sample_millis).max(MINIMUM_CPU_UPDATE_INTERVAL)
    }

    fn read(&mut self) -> CpuReading {
        self.system.refresh_cpu_all();
        thread::sleep(self.window());
        self.system.refresh_cpu_all();

        let cpus = self.system.cpus();
        CpuReading {
            usage: self.system.global_cpu_usage(),
            per_core: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
            frequency: cpus.first().map(|cpu| cpu.frequency()).unwrap_or(0),
            brand: cpus
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_default(),
        }
    }

    /// Build the sample for one reading
    pub fn sample(&self, reading: &CpuReading) -> Result<Sample> {
        if reading.per_core.is_empty() {
            bail!("no CPUs reported");
        }
        let usage = f64::from(reading.usage);
        let per_core: Vec<f64> = reading.per_core.iter().map(|u| f64::from(*u)).collect();

        let mut tooltip = format!(
            "{}\n  Usage     : {:.1}%\n  Frequency : {}",
            if reading.brand.is_empty() { "CPU" } else { reading.brand.as_str() },
            usage,
            format_frequency(reading.frequency),
        );
        if self.options.per_core_tooltip {
            for (index, core) in per_core.iter().enumerate() {
                tooltip.push_str(&format!("\n  Core {:<5} : {:.1}%", index, core));
            }
        }

        Ok(Sample::new(self.options.thresholds.classify(usage))
            .with_field("usage", usage)
            .with_field("cores", per_core.len())
            .with_field("per_core", per_core)
            .with_field("frequency", format_frequency(reading.frequency))
            .with_field("frequency_mhz", reading.frequency)
            .with_field("brand", reading.brand.as_str())
            .with_tooltip(tooltip)
            .with_percentage(usage))
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for CpuCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new("usage", "Global CPU usage", FieldType::Percentage),
            FieldMetadata::new("cores", "Number of logical cores", FieldType::Numerical),
            FieldMetadata::new("per_core", "Usage of every core", FieldType::Percentage),
            FieldMetadata::new("frequency", "Frequency of the first core", FieldType::Text),
            FieldMetadata::new("frequency_mhz", "Frequency in MHz", FieldType::Numerical),
            FieldMetadata::new("brand", "Processor model", FieldType::Text),
        ]
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![
            FormatTemplate::new("{usage:.0}%"),
            FormatTemplate::new("{usage:.0}% @ {frequency}"),
        ]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        self.options = parse_options(&self.metadata.id, options)?;
        Ok(())
    }

    fn collect(&mut self, _request: &FetchRequest) -> Result<Sample> {
        let reading = self.read();
        self.sample(&reading)
    }
}
