//! Module configuration: file loading and command line overrides

use std::path::{Path, PathBuf};
use waystat_core::ConfigError;
use waystat_types::{FormatTemplate, ModuleConfig};

/// Values given on the command line; each one overrides the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub module: Option<String>,
    pub interval_seconds: Option<u64>,
    /// Replace the configured formats with these text templates
    pub formats: Vec<String>,
    pub no_commands: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut ModuleConfig) {
        if let Some(module) = &self.module {
            config.module = module.clone();
        }
        if let Some(interval) = self.interval_seconds {
            config.interval_seconds = interval;
        }
        if !self.formats.is_empty() {
            config.formats = self.formats.iter().map(FormatTemplate::new).collect();
        }
        if self.no_commands {
            config.commands = false;
        }
    }
}

/// Load a module configuration from a JSON file
pub fn load_from_path(path: &Path) -> Result<ModuleConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Per-module config file in the user's config directory,
/// e.g. `~/.config/waystat/memory.json`
pub fn module_config_path(module: &str) -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "waystat")?;
    Some(dirs.config_dir().join(format!("{}.json", module)))
}

/// Work out the configuration to run with.
///
/// An explicit file wins. Without one, `--module` selects the module and its
/// file in the config directory is used when present; otherwise defaults.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<ModuleConfig, ConfigError> {
    let mut config = match (path, &overrides.module) {
        (Some(path), _) => load_from_path(path)?,
        (None, Some(module)) => match module_config_path(module).filter(|p| p.exists()) {
            Some(path) => {
                log::debug!("Using {}", path.display());
                load_from_path(&path)?
            }
            None => ModuleConfig::new(module.clone()),
        },
        (None, None) => return Err(ConfigError::MissingModule),
    };
    overrides.apply(&mut config);

    if config.interval_seconds == 0 {
        return Err(ConfigError::InvalidInterval);
    }
    Ok(config)
}
