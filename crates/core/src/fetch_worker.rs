//! Background thread that runs the collector

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use waystat_types::{FetchRequest, FetchResult};

use crate::collector::BoxedCollector;
use crate::coordinator::Coordinator;
use crate::error::FetchError;
use crate::state_store::{CommitOutcome, StateStore};

/// Owns the collector and performs one collection per fetch signal
pub struct FetchWorker {
    coordinator: Coordinator,
    store: StateStore,
    collector: BoxedCollector,
    loading_indicator: bool,
}

impl FetchWorker {
    pub fn new(
        coordinator: Coordinator,
        store: StateStore,
        collector: BoxedCollector,
        loading_indicator: bool,
    ) -> Self {
        Self {
            coordinator,
            store,
            collector,
            loading_indicator,
        }
    }

    /// Serve fetch signals until the module closes
    pub fn run(mut self) {
        let id = self.collector.metadata().id.clone();
        while let Some(request) = self.coordinator.wait_for_fetch_signal() {
            if self.loading_indicator {
                self.coordinator.request_redraw();
            }

            let result = self.fetch_once(&request);
            let outcome = self.store.commit(result);
            log::trace!("{} commit: {:?}", id, outcome);

            if outcome != CommitOutcome::Superseded || self.loading_indicator {
                self.coordinator.request_redraw();
            }
            self.coordinator.complete_fetch();
        }
        log::debug!("Fetch worker for {} exiting", id);
    }

    /// Run the collector once. Errors and panics become a failed result.
    pub fn fetch_once(&mut self, request: &FetchRequest) -> FetchResult {
        let id = self.collector.metadata().id.clone();
        let started = Instant::now();
        let collector = &mut self.collector;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| collector.collect(request)));
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(sample)) => {
                log::debug!("{} fetched in {:?}", id, elapsed);
                FetchResult::succeeded(sample, request.format_index)
            }
            Ok(Err(e)) => {
                log::warn!("{} fetch failed after {:?}: {:#}", id, elapsed, e);
                FetchResult::failed(format!("{:#}", e), request.format_index)
            }
            Err(payload) => {
                let error = FetchError::Panicked(panic_message(payload.as_ref()));
                log::error!("{}: {}", id, error);
                FetchResult::failed(error.to_string(), request.format_index)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Collector, CollectorMetadata};
    use crate::constants::DEFAULT_INTERVAL;
    use crate::coordinator::new_module;
    use crate::runtime::RuntimeConfig;
    use anyhow::{anyhow, Result};
    use std::time::Duration;
    use waystat_types::{FieldMetadata, FormatTemplate, Sample, StatusClass};

    enum Behaviour {
        Succeed,
        Fail,
        Panic,
    }

    struct Probe {
        metadata: CollectorMetadata,
        behaviour: Behaviour,
    }

    impl Collector for Probe {
        fn metadata(&self) -> &CollectorMetadata {
            &self.metadata
        }

        fn fields(&self) -> Vec<FieldMetadata> {
            Vec::new()
        }

        fn default_formats(&self) -> Vec<FormatTemplate> {
            vec![FormatTemplate::new("{target}")]
        }

        fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
            match self.behaviour {
                Behaviour::Succeed => Ok(Sample::new(StatusClass::Ok)
                    .with_field("target", request.target.clone().unwrap_or_default())),
                Behaviour::Fail => {
                    Err(anyhow!("permission denied").context("reading /sys/class/hwmon"))
                }
                Behaviour::Panic => panic!("sensor index out of range"),
            }
        }
    }

    fn worker(behaviour: Behaviour) -> (FetchWorker, Coordinator) {
        let formats = [FormatTemplate::new("{target}").with_target("eth0")];
        let config = RuntimeConfig::new("probe", Duration::from_secs(60), &formats, "…").unwrap();
        let (coordinator, store) = new_module(&config);
        let collector = Box::new(Probe {
            metadata: CollectorMetadata {
                id: "probe".to_string(),
                name: "Probe".to_string(),
                description: "Test collector".to_string(),
                default_interval: DEFAULT_INTERVAL,
            },
            behaviour,
        });
        (
            FetchWorker::new(coordinator.clone(), store, collector, false),
            coordinator,
        )
    }

    fn request() -> FetchRequest {
        FetchRequest {
            format_index: 0,
            target: Some("eth0".to_string()),
        }
    }

    #[test]
    fn test_success_passes_target_through() {
        let (mut worker, _) = worker(Behaviour::Succeed);
        let result = worker.fetch_once(&request());
        assert!(result.success);
        assert_eq!(result.payload.unwrap().fields["target"], "eth0");
    }

    #[test]
    fn test_error_keeps_context_chain() {
        let (mut worker, _) = worker(Behaviour::Fail);
        let result = worker.fetch_once(&request());
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("reading /sys/class/hwmon: permission denied")
        );
    }

    #[test]
    fn test_panic_becomes_failed_result() {
        let (mut worker, _) = worker(Behaviour::Panic);
        let result = worker.fetch_once(&request());
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("collector panicked: sensor index out of range")
        );
    }

    #[test]
    fn test_run_commits_and_exits_on_close() {
        let (worker, coordinator) = worker(Behaviour::Succeed);
        let store = worker.store.clone();
        coordinator.request_fetch();
        let handle = std::thread::spawn(move || worker.run());

        // Nothing consumes redraws here, so the flag stays set once raised
        let deadline = Instant::now() + Duration::from_secs(5);
        while !coordinator.flags().needs_redraw {
            assert!(Instant::now() < deadline, "no redraw requested");
            std::thread::sleep(Duration::from_millis(5));
        }
        coordinator.close();
        handle.join().unwrap();

        assert_eq!(store.snapshot().display_text, "eth0");
    }
}
