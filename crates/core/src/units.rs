//! Human readable byte, rate and frequency formatting

use crate::template::pad_float;
use waystat_types::source_configs::RateUnit;
use waystat_types::ByteUnit;

const BINARY_PREFIXES: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const RATE_PREFIXES: [&str; 6] = ["", "K", "M", "G", "T", "P"];

/// Format a byte amount, e.g. `7.42 GiB`
pub fn format_bytes(bytes: u64, unit: ByteUnit) -> String {
    let value = bytes as f64;
    match unit.scale() {
        Some((divisor, label)) => format!("{} {}B", pad_float(value / divisor), label),
        None => {
            let (scaled, prefix) = scale_down(value, 1024.0, &BINARY_PREFIXES);
            format!("{} {}B", pad_float(scaled), prefix)
        }
    }
}

/// Format a throughput given in bytes per second
pub fn format_rate(bytes_per_sec: f64, unit: RateUnit) -> String {
    match unit {
        RateUnit::Bits => {
            let (scaled, prefix) = scale_down(bytes_per_sec * 8.0, 1000.0, &RATE_PREFIXES);
            format!("{} {}bit/s", pad_float(scaled), prefix)
        }
        RateUnit::Bytes => {
            let (scaled, prefix) = scale_down(bytes_per_sec, 1024.0, &BINARY_PREFIXES);
            format!("{} {}B/s", pad_float(scaled), prefix)
        }
    }
}

/// Format a processor frequency given in MHz
pub fn format_frequency(mhz: u64) -> String {
    if mhz >= 1000 {
        format!("{} GHz", pad_float(mhz as f64 / 1000.0))
    } else {
        format!("{} MHz", mhz)
    }
}

/// Percentage of `part` in `total`, 0 when `total` is 0
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn scale_down(mut value: f64, base: f64, prefixes: &[&'static str]) -> (f64, &'static str) {
    let mut index = 0;
    while value.abs() >= base && index + 1 < prefixes.len() {
        value /= base;
        index += 1;
    }
    (value, prefixes[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_auto() {
        assert_eq!(format_bytes(512, ByteUnit::Auto), "512 B");
        assert_eq!(format_bytes(1536, ByteUnit::Auto), "1.50 KiB");
        assert_eq!(format_bytes(8 * 1024 * 1024 * 1024, ByteUnit::Auto), "8 GiB");
    }

    #[test]
    fn test_format_bytes_fixed_unit() {
        assert_eq!(format_bytes(2_500_000_000, ByteUnit::G), "2.50 GB");
        assert_eq!(format_bytes(1024 * 1024, ByteUnit::Ki), "1024 KiB");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(125_000.0, RateUnit::Bits), "1 Mbit/s");
        assert_eq!(format_rate(0.0, RateUnit::Bits), "0 bit/s");
        assert_eq!(format_rate(2048.0, RateUnit::Bytes), "2 KiB/s");
    }

    #[test]
    fn test_format_frequency_and_percent() {
        assert_eq!(format_frequency(3400), "3.40 GHz");
        assert_eq!(format_frequency(800), "800 MHz");
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(1, 0), 0.0);
    }
}
