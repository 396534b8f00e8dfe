//! Network throughput collector

use anyhow::Result;
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::Networks;
use waystat_core::units::{format_bytes, format_rate};
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchError, FetchRequest,
    FieldMetadata, FieldType, FormatTemplate, Sample, StatusClass,
};
use waystat_types::source_configs::NetworkOptions;
use waystat_types::ByteUnit;

/// Byte counters of one interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub received: u64,
    pub transmitted: u64,
}

/// Network collector
///
/// Reads the counters of one interface twice, `sample_millis` apart, and
/// reports the throughput in between. Each format may name its own
/// interface as `target`.
pub struct NetworkCollector {
    metadata: CollectorMetadata,
    options: NetworkOptions,
    networks: Networks,
}

impl NetworkCollector {
    pub fn new() -> Self {
        Self {
            metadata: CollectorMetadata {
                id: "network".to_string(),
                name: "Network".to_string(),
                description: "Receive and transmit throughput of one interface".to_string(),
                default_interval: Duration::from_secs(5),
            },
            options: NetworkOptions::default(),
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// Interface to read: the format's target, then the configured one, then
    /// the busiest non-loopback interface
    fn resolve_interface(&mut self, target: Option<&str>) -> Result<String, FetchError> {
        if let Some(name) = target.or(self.options.interface.as_deref()) {
            if !self.networks.list().contains_key(name) {
                self.networks.refresh_list();
            }
            return if self.networks.list().contains_key(name) {
                Ok(name.to_string())
            } else {
                Err(FetchError::NotFound {
                    kind: "interface",
                    name: name.to_string(),
                })
            };
        }

        self.networks
            .list()
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .max_by_key(|(_, data)| data.total_received() + data.total_transmitted())
            .map(|(name, _)| name.clone())
            .ok_or(FetchError::NotFound {
                kind: "interface",
                name: "(any)".to_string(),
            })
    }

    fn counters(&self, interface: &str) -> Result<Counters, FetchError> {
        self.networks
            .list()
            .get(interface)
            .map(|data| Counters {
                received: data.total_received(),
                transmitted: data.total_transmitted(),
            })
            .ok_or_else(|| FetchError::NotFound {
                kind: "interface",
                name: interface.to_string(),
            })
    }

    /// Build the sample from two counter readings `elapsed` apart
    pub fn sample(
        &self,
        interface: &str,
        mac_address: &str,
        before: Counters,
        after: Counters,
        elapsed: Duration,
    ) -> Sample {
        let seconds = elapsed.as_secs_f64();
        let (rx, tx) = if seconds > 0.0 {
            (
                after.received.saturating_sub(before.received) as f64 / seconds,
                after.transmitted.saturating_sub(before.transmitted) as f64 / seconds,
            )
        } else {
            (0.0, 0.0)
        };

        let unit = self.options.rate_unit;
        let received = format_rate(rx, unit);
        let transmitted = format_rate(tx, unit);
        let tooltip = format!(
            "{}\n  MAC      : {}\n  Down     : {}\n  Up       : {}\n  Received : {}\n  Sent     : {}",
            interface,
            mac_address,
            received,
            transmitted,
            format_bytes(after.received, ByteUnit::Auto),
            format_bytes(after.transmitted, ByteUnit::Auto),
        );

        Sample::new(StatusClass::Ok)
            .with_field("interface", interface)
            .with_field("mac_address", mac_address)
            .with_field("received", received)
            .with_field("transmitted", transmitted)
            .with_field("received_bytes_per_sec", rx)
            .with_field("transmitted_bytes_per_sec", tx)
            .with_field("received_total", format_bytes(after.received, ByteUnit::Auto))
            .with_field("transmitted_total", format_bytes(after.transmitted, ByteUnit::Auto))
            .with_tooltip(tooltip)
    }
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for NetworkCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new("interface", "Interface name", FieldType::Text),
            FieldMetadata::new("mac_address", "Hardware address", FieldType::Text),
            FieldMetadata::new("received", "Download rate", FieldType::Rate),
            FieldMetadata::new("transmitted", "Upload rate", FieldType::Rate),
            FieldMetadata::new(
                "received_bytes_per_sec",
                "Download rate in B/s",
                FieldType::Numerical,
            ),
            FieldMetadata::new(
                "transmitted_bytes_per_sec",
                "Upload rate in B/s",
                FieldType::Numerical,
            ),
            FieldMetadata::new("received_total", "Received since boot", FieldType::Bytes),
            FieldMetadata::new("transmitted_total", "Sent since boot", FieldType::Bytes),
        ]
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![
            FormatTemplate::new("{interface} ↓{received} ↑{transmitted}"),
            FormatTemplate::new("{interface} {received_total} / {transmitted_total}"),
        ]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        self.options = parse_options(&self.metadata.id, options)?;
        Ok(())
    }

    fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
        let interface = self.resolve_interface(request.target.as_deref())?;

        self.networks.refresh();
        let before = self.counters(&interface)?;
        let started = Instant::now();
        thread::sleep(Duration::from_millis(self.options.sample_millis));
        self.networks.refresh();
        let after = self.counters(&interface)?;

        let mac_address = self
            .networks
            .list()
            .get(&interface)
            .map(|data| data.mac_address().to_string())
            .unwrap_or_default();
        Ok(self.sample(&interface, &mac_address, before, after, started.elapsed()))
    }
}
