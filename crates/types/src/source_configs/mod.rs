//! Option types for the built-in collectors.
//!
//! Each collector deserializes its own type from the `options` object of the
//! module configuration. Every field has a default so `options` may be omitted.

pub mod command;
pub mod cpu;
pub mod filesystem;
pub mod memory;
pub mod network;
pub mod static_text;

// Re-export all option types for convenience
pub use command::CommandOptions;
pub use cpu::CpuOptions;
pub use filesystem::FilesystemOptions;
pub use memory::MemoryOptions;
pub use network::{NetworkOptions, RateUnit};
pub use static_text::StaticTextOptions;
