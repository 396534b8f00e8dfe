use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use waystat::app;
use waystat::config::{self, Overrides};
use waystat_core::ConfigError;

/// waystat - Waybar custom modules with background fetching and format cycling
#[derive(Parser, Debug, Clone)]
#[command(name = "waystat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Module configuration file (JSON)
    #[arg(value_name = "CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Collector to run (e.g. memory, cpu, network); overrides the file
    #[arg(short = 'm', long = "module", value_name = "MODULE")]
    module: Option<String>,

    /// Seconds between periodic fetches
    #[arg(short = 'i', long = "interval", value_name = "SECS")]
    interval: Option<u64>,

    /// Format template; repeat to define several formats to cycle through
    #[arg(short = 'f', long = "format", value_name = "TEMPLATE")]
    formats: Vec<String>,

    /// Collect once for every format, print the result and exit
    #[arg(short = 't', long = "test")]
    test: bool,

    /// List available collectors and their fields
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Write logs to a file instead of stderr. Without PATH, logs go to the cache directory
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    /// Ignore click commands on stdin
    #[arg(long = "no-commands")]
    no_commands: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            module: self.module.clone(),
            interval_seconds: self.interval,
            formats: self.formats.clone(),
            no_commands: self.no_commands,
        }
    }

    /// Name used for the default log file before the config is read
    fn module_hint(&self) -> String {
        self.module
            .clone()
            .or_else(|| {
                self.config_file
                    .as_ref()
                    .and_then(|path| path.file_stem())
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "waystat".to_string())
    }

    fn log_path(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(Some(path)) => Some(path.clone()),
            Some(None) => config::default_log_path(&self.module_hint()),
            None => None,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = config::init_logging(cli.debug, cli.log_path().as_deref()) {
        eprintln!("waystat: {:#}", e);
    }
    log::info!("Starting waystat v{}", env!("CARGO_PKG_VERSION"));

    let registry = waystat_sources::builtin_registry();

    let result = if cli.list {
        app::list(&registry, &mut std::io::stdout())
    } else {
        config::resolve(cli.config_file.as_deref(), &cli.overrides())
            .map_err(anyhow::Error::from)
            .and_then(|module_config| {
                if cli.test {
                    app::run_test(&module_config, &registry)
                } else {
                    app::run(&module_config, &registry)
                }
            })
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.log_file.is_some() {
                log::error!("{:#}", e);
            }
            eprintln!("waystat: {:#}", e);
            if e.chain().any(|cause| cause.is::<ConfigError>()) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
