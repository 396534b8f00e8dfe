//! Logger setup
//!
//! stdout carries the bar protocol, so log output goes to stderr or a file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Filter for a `-d/--debug` level
pub fn level_filter(debug: u8) -> &'static str {
    match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Default log file, `<cache dir>/waystat-<module>.log`
pub fn default_log_path(module: &str) -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "waystat")?;
    Some(dirs.cache_dir().join(format!("waystat-{}.log", module)))
}

/// Initialize the global logger. `RUST_LOG` overrides the debug level.
pub fn init_logging(debug: u8, log_file: Option<&Path>) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(level_filter(debug));
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        builder.target(env_logger::Target::Stderr);
    }

    builder.try_init().context("logger already initialized")?;
    Ok(())
}
