//! Configuration management

mod logging;
mod settings;

pub use logging::{default_log_path, init_logging, level_filter};
pub use settings::{load_from_path, module_config_path, resolve, Overrides};
