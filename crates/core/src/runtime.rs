//! Module runtime: validated configuration and the three worker threads

use crossbeam::channel::{self, Receiver};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use waystat_types::{FormatTemplate, ModuleConfig};

use crate::collector::{BoxedCollector, Collector};
use crate::coordinator::{new_module, Coordinator};
use crate::error::ConfigError;
use crate::event_bridge::{BridgeEvent, EventBridge};
use crate::fetch_worker::FetchWorker;
use crate::render_loop::RenderLoop;
use crate::state_store::StateStore;
use crate::template::{compile_formats, CompiledFormat};

/// Validated runtime settings of one module
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    module: String,
    interval: Duration,
    formats: Vec<CompiledFormat>,
    placeholder: String,
    loading_indicator: bool,
}

impl RuntimeConfig {
    /// Validate the interval and compile every format
    pub fn new(
        module: &str,
        interval: Duration,
        formats: &[FormatTemplate],
        placeholder: &str,
    ) -> Result<Self, ConfigError> {
        if interval < Duration::from_secs(1) {
            return Err(ConfigError::InvalidInterval);
        }
        if formats.is_empty() {
            return Err(ConfigError::NoFormats(module.to_string()));
        }
        Ok(Self {
            module: module.to_string(),
            interval,
            formats: compile_formats(formats)?,
            placeholder: placeholder.to_string(),
            loading_indicator: false,
        })
    }

    /// Build from a parsed module configuration, falling back to the
    /// collector's default formats when none are configured
    pub fn from_module_config(
        config: &ModuleConfig,
        collector: &dyn Collector,
    ) -> Result<Self, ConfigError> {
        let defaults;
        let formats = if config.formats.is_empty() {
            defaults = collector.default_formats();
            &defaults
        } else {
            &config.formats
        };
        Ok(Self::new(
            &config.module,
            Duration::from_secs(config.interval_seconds),
            formats,
            &config.placeholder,
        )?
        .with_loading_indicator(config.loading_indicator))
    }

    pub fn with_loading_indicator(mut self, enabled: bool) -> Self {
        self.loading_indicator = enabled;
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn formats(&self) -> &[CompiledFormat] {
        &self.formats
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn loading_indicator(&self) -> bool {
        self.loading_indicator
    }
}

/// A module that has not been started yet
pub struct ModuleRuntime {
    config: RuntimeConfig,
    coordinator: Coordinator,
    store: StateStore,
}

impl ModuleRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        let (coordinator, store) = new_module(&config);
        Self {
            config,
            coordinator,
            store,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Spawn the fetch worker, render loop and event bridge.
    ///
    /// The placeholder is written before any thread starts, then the initial
    /// fetch is requested. `events` carries signals and click commands; the module runs until a
    /// `Shutdown` event arrives, every sender is dropped, or stdout fails.
    pub fn start<W>(
        self,
        collector: BoxedCollector,
        writer: W,
        events: Receiver<BridgeEvent>,
    ) -> io::Result<RunningModule>
    where
        W: Write + Send + 'static,
    {
        let module = self.config.module().to_string();
        log::info!(
            "Starting module {} (interval {:?}, {} format(s))",
            module,
            self.config.interval(),
            self.config.formats().len()
        );

        // Dropped when the render loop exits, which ends the bridge too
        let (render_done_tx, render_done_rx) = channel::bounded::<()>(0);

        let mut render_loop = RenderLoop::new(self.coordinator.clone(), writer);
        render_loop.emit(&self.store.snapshot())?;

        let render = {
            thread::Builder::new()
                .name(format!("{}-render", module))
                .spawn(move || {
                    let result = render_loop.run();
                    drop(render_done_tx);
                    result
                })?
        };

        let worker = {
            let worker = FetchWorker::new(
                self.coordinator.clone(),
                self.store.clone(),
                collector,
                self.config.loading_indicator(),
            );
            thread::Builder::new()
                .name(format!("{}-fetch", module))
                .spawn(move || worker.run())?
        };

        self.coordinator.mark_started();
        self.coordinator.request_fetch();

        let bridge = {
            let bridge = EventBridge::new(
                self.coordinator.clone(),
                self.store.clone(),
                self.config.interval(),
            );
            thread::Builder::new()
                .name(format!("{}-events", module))
                .spawn(move || bridge.run(events, render_done_rx))?
        };

        Ok(RunningModule {
            coordinator: self.coordinator,
            store: self.store,
            bridge,
            render,
            worker,
        })
    }
}

/// Handles of a started module
pub struct RunningModule {
    coordinator: Coordinator,
    store: StateStore,
    bridge: JoinHandle<()>,
    render: JoinHandle<io::Result<()>>,
    worker: JoinHandle<()>,
}

impl RunningModule {
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Stop the module and wait for it
    pub fn shutdown(self) -> io::Result<()> {
        self.coordinator.close();
        self.join()
    }

    /// Wait until the module stops.
    ///
    /// Returns the render loop's write error, if any. A collection that is
    /// still running is not waited for; the process may exit underneath it.
    pub fn join(self) -> io::Result<()> {
        if self.bridge.join().is_err() {
            log::error!("Event bridge thread panicked");
        }
        self.coordinator.close();

        let result = match self.render.join() {
            Ok(result) => result,
            Err(_) => {
                log::error!("Render thread panicked");
                Ok(())
            }
        };

        if self.worker.is_finished() {
            if self.worker.join().is_err() {
                log::error!("Fetch worker thread panicked");
            }
        } else {
            log::debug!("Collection still running at shutdown, not waiting for it");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorMetadata;
    use crate::constants::DEFAULT_INTERVAL;
    use anyhow::{bail, Result};
    use crossbeam::channel::{unbounded, Sender};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use waystat_types::{FetchRequest, FieldMetadata, Sample, StatusClass};

    /// Collects into a shared buffer so tests can read emitted lines
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    enum Step {
        Value(&'static str),
        Fail(&'static str),
    }

    /// Plays back scripted results, sleeping `delay` in each collection
    struct Scripted {
        metadata: CollectorMetadata,
        steps: VecDeque<Step>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
        running: Arc<AtomicUsize>,
        max_running: Arc<AtomicUsize>,
        targets: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>, delay: Duration) -> Self {
            Self {
                metadata: CollectorMetadata {
                    id: "scripted".to_string(),
                    name: "Scripted".to_string(),
                    description: "Test collector".to_string(),
                    default_interval: DEFAULT_INTERVAL,
                },
                steps: steps.into(),
                delay,
                calls: Arc::default(),
                running: Arc::default(),
                max_running: Arc::default(),
                targets: Arc::default(),
            }
        }
    }

    impl Collector for Scripted {
        fn metadata(&self) -> &CollectorMetadata {
            &self.metadata
        }

        fn fields(&self) -> Vec<FieldMetadata> {
            Vec::new()
        }

        fn default_formats(&self) -> Vec<FormatTemplate> {
            vec![FormatTemplate::new("{value}")]
        }

        fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
            self.targets.lock().unwrap().push(request.target.clone());
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(running, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.running.fetch_sub(1, Ordering::SeqCst);

            match self.steps.pop_front() {
                Some(Step::Value(value)) => {
                    Ok(Sample::new(StatusClass::Ok).with_field("value", value))
                }
                Some(Step::Fail(reason)) => bail!("{}", reason),
                None => Ok(Sample::new(StatusClass::Ok).with_field("value", "again")),
            }
        }
    }

    fn config() -> RuntimeConfig {
        RuntimeConfig::new(
            "scripted",
            Duration::from_secs(60),
            &[FormatTemplate::new("{value}")],
            "Working…",
        )
        .unwrap()
    }

    fn start(collector: Scripted) -> (RunningModule, SharedBuffer, Sender<BridgeEvent>) {
        start_with(config(), collector)
    }

    fn start_with(
        config: RuntimeConfig,
        collector: Scripted,
    ) -> (RunningModule, SharedBuffer, Sender<BridgeEvent>) {
        let buffer = SharedBuffer::default();
        let (tx, rx) = unbounded();
        let running = ModuleRuntime::new(config)
            .start(Box::new(collector), buffer.clone(), rx)
            .unwrap();
        (running, buffer, tx)
    }

    fn text_and_class(line: &Value) -> (&str, &str) {
        (
            line["text"].as_str().unwrap_or_default(),
            line["class"].as_str().unwrap_or_default(),
        )
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let formats = [FormatTemplate::new("{value}")];
        assert!(matches!(
            RuntimeConfig::new("m", Duration::from_millis(500), &formats, "…"),
            Err(ConfigError::InvalidInterval)
        ));
        assert!(matches!(
            RuntimeConfig::new("m", Duration::from_secs(1), &[], "…"),
            Err(ConfigError::NoFormats(_))
        ));
    }

    #[test]
    fn test_config_falls_back_to_collector_formats() {
        let collector = Scripted::new(Vec::new(), Duration::ZERO);
        let mut module_config = ModuleConfig::new("scripted");
        module_config.loading_indicator = true;
        let config = RuntimeConfig::from_module_config(&module_config, &collector).unwrap();
        assert_eq!(config.formats().len(), 1);
        assert_eq!(config.formats()[0].text.source(), "{value}");
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert!(config.loading_indicator());
    }

    #[test]
    fn test_placeholder_then_single_value() {
        let (running, buffer, tx) = start(Scripted::new(
            vec![Step::Value("42%")],
            Duration::from_millis(20),
        ));
        wait_until(|| buffer.lines().len() >= 2);
        tx.send(BridgeEvent::Shutdown).unwrap();
        running.join().unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["text"], "Working…");
        assert_eq!(lines[0]["class"], "loading");
        assert_eq!(lines[1]["text"], "42%");
        assert_eq!(lines[1]["class"], "ok");
    }

    #[test]
    fn test_failure_then_recovery() {
        let (running, buffer, tx) = start(Scripted::new(
            vec![Step::Value("1"), Step::Fail("sensor gone"), Step::Value("3")],
            Duration::ZERO,
        ));
        wait_until(|| buffer.lines().len() >= 2);
        tx.send(BridgeEvent::Refresh).unwrap();
        wait_until(|| buffer.lines().len() >= 3);
        tx.send(BridgeEvent::Refresh).unwrap();
        wait_until(|| buffer.lines().len() >= 4);
        running.shutdown().unwrap();

        let lines = buffer.lines();
        assert_eq!(lines[2]["text"], "1");
        assert_eq!(lines[2]["class"], "stale");
        assert!(lines[2]["tooltip"].as_str().unwrap().contains("sensor gone"));
        assert_eq!(lines[3]["text"], "3");
        assert_eq!(lines[3]["class"], "ok");
    }

    #[test]
    fn test_refreshes_during_fetch_are_coalesced() {
        let collector = Scripted::new(Vec::new(), Duration::from_millis(150));
        let calls = Arc::clone(&collector.calls);
        let max_running = Arc::clone(&collector.max_running);
        let (running, _buffer, tx) = start(collector);

        wait_until(|| calls.load(Ordering::SeqCst) == 1);
        tx.send(BridgeEvent::Refresh).unwrap();
        tx.send(BridgeEvent::Refresh).unwrap();
        tx.send(BridgeEvent::Refresh).unwrap();

        wait_until(|| calls.load(Ordering::SeqCst) == 2);
        wait_until(|| !running.coordinator().flags().fetch_in_progress);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(max_running.load(Ordering::SeqCst), 1);

        running.shutdown().unwrap();
    }

    #[test]
    fn test_format_switch_during_fetch_refetches_new_target() {
        let collector = Scripted::new(
            vec![Step::Value("from wlan0"), Step::Value("from eth0")],
            Duration::from_millis(150),
        );
        let calls = Arc::clone(&collector.calls);
        let targets = Arc::clone(&collector.targets);
        let formats = [
            FormatTemplate::new("{value}").with_target("wlan0"),
            FormatTemplate::new("{value}").with_target("eth0"),
        ];
        let config = RuntimeConfig::new("scripted", Duration::from_secs(60), &formats, "Working…")
            .unwrap();
        let (running, buffer, tx) = start_with(config, collector);

        wait_until(|| calls.load(Ordering::SeqCst) == 1);
        tx.send(BridgeEvent::CycleFormat).unwrap();

        wait_until(|| buffer.lines().len() >= 2);
        wait_until(|| !running.coordinator().flags().fetch_in_progress);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *targets.lock().unwrap(),
            vec![Some("wlan0".to_string()), Some("eth0".to_string())]
        );
        assert_eq!(running.store().format_index(), 1);
        running.shutdown().unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(text_and_class(&lines[0]), ("Working…", "loading"));
        assert_eq!(text_and_class(&lines[1]), ("from eth0", "ok"));
    }

    #[test]
    fn test_loading_indicator_shows_retained_text_while_fetching() {
        let config = config().with_loading_indicator(true);
        let (running, buffer, tx) = start_with(
            config,
            Scripted::new(vec![Step::Value("1"), Step::Value("2")], Duration::from_millis(150)),
        );

        wait_until(|| buffer.lines().iter().any(|line| text_and_class(line) == ("1", "ok")));
        tx.send(BridgeEvent::Refresh).unwrap();
        wait_until(|| buffer.lines().iter().any(|line| text_and_class(line) == ("2", "ok")));
        running.shutdown().unwrap();

        let lines = buffer.lines();
        let first_value = lines
            .iter()
            .position(|line| text_and_class(line) == ("1", "ok"))
            .unwrap();
        let after: Vec<_> = lines[first_value + 1..].iter().map(text_and_class).collect();
        assert_eq!(after, vec![("1", "loading"), ("2", "ok")]);
        assert!(lines[..first_value]
            .iter()
            .all(|line| text_and_class(line) == ("Working…", "loading")));
    }

    #[test]
    fn test_dropped_event_sender_stops_module() {
        let (running, buffer, tx) = start(Scripted::new(vec![Step::Value("x")], Duration::ZERO));
        wait_until(|| buffer.lines().len() >= 2);
        drop(tx);
        running.join().unwrap();
    }

    #[test]
    fn test_write_error_stops_module() {
        /// Accepts the placeholder, then the bar goes away
        struct Broken {
            flushed: usize,
        }
        impl Write for Broken {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                self.flushed += 1;
                if self.flushed > 1 {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bar went away"));
                }
                Ok(())
            }
        }

        // Keep the sender alive so only the write error can stop the module
        let (_tx, rx) = unbounded::<BridgeEvent>();
        let running = ModuleRuntime::new(config())
            .start(
                Box::new(Scripted::new(Vec::new(), Duration::ZERO)),
                Broken { flushed: 0 },
                rx,
            )
            .unwrap();
        let err = running.join().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
