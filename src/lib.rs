//! waystat: Waybar custom modules with background fetching.
//!
//! The binary resolves a module configuration, then hands it to
//! [`app::run`], which wires signals and stdin commands into the runtime
//! from `waystat-core` and the collectors from `waystat-sources`.

pub mod app;
pub mod config;
