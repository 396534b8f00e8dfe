//! waystat-sources: Built-in metric collectors for waystat.

mod command;
mod cpu;
mod filesystem;
mod memory;
mod network;
mod static_text;

pub use command::{parse_output, CommandCollector};
pub use cpu::{CpuCollector, CpuReading};
pub use filesystem::{DiskReading, FilesystemCollector};
pub use memory::{MemoryCollector, MemoryReading};
pub use network::{Counters, NetworkCollector};
pub use static_text::StaticTextCollector;

use waystat_core::Registry;

/// Register all built-in collectors
pub fn register_all(registry: &mut Registry) {
    registry.register_collector("command", || Box::new(CommandCollector::new()));
    registry.register_collector("cpu", || Box::new(CpuCollector::new()));
    registry.register_collector("filesystem", || Box::new(FilesystemCollector::new()));
    registry.register_collector("memory", || Box::new(MemoryCollector::new()));
    registry.register_collector("network", || Box::new(NetworkCollector::new()));
    registry.register_collector("static", || Box::new(StaticTextCollector::new()));
}

/// A registry holding every built-in collector
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_all(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_match_metadata() {
        let registry = builtin_registry();
        let ids = registry.list_collectors();
        assert_eq!(
            ids,
            vec!["command", "cpu", "filesystem", "memory", "network", "static"]
        );
        for id in &ids {
            let collector = registry.create_collector(id).unwrap();
            assert_eq!(&collector.metadata().id, id);
            assert!(!collector.default_formats().is_empty());
        }
    }
}
