//! waystat-types: Shared data types for waystat bar modules.
//!
//! This crate contains pure data types (module state, wire payload,
//! configuration, collector options) shared across all waystat crates.
//! Nothing in here locks, spawns or performs I/O.

pub mod emission;
pub mod field;
pub mod module_config;
pub mod source_configs;
pub mod state;
pub mod status;
pub mod units;

// Re-export commonly used types at the crate root for convenience
pub use emission::Emission;
pub use field::{FieldMetadata, FieldType};
pub use module_config::{FormatTemplate, ModuleConfig};
pub use state::{FetchRequest, FetchResult, Fields, ModulePhase, ModuleState, Sample};
pub use status::{StatusClass, Thresholds};
pub use units::ByteUnit;
