//! Entry points behind the command line: run a module, test it once, list collectors

use anyhow::{Context, Result};
use crossbeam::channel;
use std::io::{self, BufReader, Write};
use waystat_core::{
    commands, BoxedCollector, ConfigError, CycleOutcome, FetchRequest, FetchWorker, ModuleRuntime,
    Registry, RuntimeConfig,
};
use waystat_types::{Emission, ModuleConfig, ModuleState};

#[cfg(unix)]
use waystat_core::signals::SignalListener;

/// Create and configure the collector a module config names
pub fn prepare_collector(config: &ModuleConfig, registry: &Registry) -> Result<BoxedCollector> {
    let mut collector = registry.create_collector(&config.module)?;
    collector.configure(&config.options)?;
    if !collector.is_available() {
        return Err(ConfigError::Unavailable(config.module.clone()).into());
    }
    Ok(collector)
}

/// Run a module until it is told to quit or stdout goes away
pub fn run(config: &ModuleConfig, registry: &Registry) -> Result<()> {
    let collector = prepare_collector(config, registry)?;
    let runtime_config = RuntimeConfig::from_module_config(config, collector.as_ref())?;

    let (events_tx, events_rx) = channel::unbounded();

    #[cfg(unix)]
    let signals = SignalListener::spawn(events_tx.clone()).context("installing signal handlers")?;

    if config.commands {
        commands::spawn_command_reader(BufReader::new(io::stdin()), events_tx.clone())
            .context("starting command reader")?;
    }
    drop(events_tx);

    let running = ModuleRuntime::new(runtime_config)
        .start(collector, io::stdout(), events_rx)
        .context("starting module threads")?;
    let result = running.join();

    #[cfg(unix)]
    signals.close();

    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            log::info!("Bar closed stdout, exiting");
            Ok(())
        }
        other => other.context("writing to stdout"),
    }
}

/// Collect once for every format and print the results.
///
/// Fails when any collection fails, so it can be used to check a config.
pub fn run_test(config: &ModuleConfig, registry: &Registry) -> Result<()> {
    let collector = prepare_collector(config, registry)?;
    let runtime_config = RuntimeConfig::from_module_config(config, collector.as_ref())?;
    let targets: Vec<Option<String>> = runtime_config
        .formats()
        .iter()
        .map(|format| format.target.clone())
        .collect();

    let runtime = ModuleRuntime::new(runtime_config);
    let store = runtime.store().clone();
    let mut worker = FetchWorker::new(
        runtime.coordinator().clone(),
        store.clone(),
        collector,
        false,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;

    for (index, target) in targets.iter().enumerate() {
        let fetch = index == 0 || matches!(store.cycle_format(), CycleOutcome::Refetch { .. });
        if fetch {
            let request = FetchRequest {
                format_index: index,
                target: target.clone(),
            };
            store.commit(worker.fetch_once(&request));
        }

        let state = store.snapshot();
        if state.last_error.is_some() {
            failures += 1;
        }
        print_state(&mut out, index, &state)?;
    }

    if failures > 0 {
        anyhow::bail!("{} of {} format(s) failed", failures, targets.len());
    }
    Ok(())
}

fn print_state(out: &mut impl Write, index: usize, state: &ModuleState) -> io::Result<()> {
    let emission = Emission::from_state(state);
    writeln!(out, "Format {}:", index)?;
    writeln!(out, "  text:    {}", emission.text)?;
    writeln!(out, "  class:   {}", emission.class)?;
    if let Some(percentage) = emission.percentage {
        writeln!(out, "  percent: {}", percentage)?;
    }
    writeln!(out, "  tooltip:")?;
    for line in emission.tooltip.lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}

/// Print every registered collector with the fields it provides
pub fn list(registry: &Registry, out: &mut impl Write) -> Result<()> {
    for id in registry.list_collectors() {
        let collector = registry.create_collector(&id)?;
        let metadata = collector.metadata();
        writeln!(out, "{} - {}", metadata.id, metadata.name)?;
        writeln!(out, "    {}", metadata.description)?;
        if !collector.is_available() {
            writeln!(out, "    (not available on this system)")?;
        }
        for field in collector.fields() {
            writeln!(
                out,
                "    {{{}}}  {} ({})",
                field.id,
                field.description,
                field.field_type.as_str()
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
