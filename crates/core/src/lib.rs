//! waystat-core: Collector trait, registry and the refresh/redraw runtime.
//!
//! A module process owns one collector. The fetch worker runs it in the
//! background, the render loop writes a JSON line to the bar whenever the
//! display changes, and the event bridge turns timer ticks, signals and
//! click commands into requests on the shared coordinator.

mod collector;
pub mod commands;
pub mod constants;
mod coordinator;
mod error;
mod event_bridge;
mod fetch_worker;
mod registry;
mod render_loop;
mod runtime;
#[cfg(unix)]
pub mod signals;
mod state_store;
pub mod template;
pub mod units;

pub use collector::{parse_options, BoxedCollector, Collector, CollectorMetadata};
pub use coordinator::{new_module, Coordinator, PendingFlags};
pub use error::{ConfigError, FetchError, TemplateError};
pub use event_bridge::{BridgeEvent, EventBridge, UnknownCommand};
pub use fetch_worker::FetchWorker;
pub use registry::{CollectorFactory, Registry};
pub use render_loop::RenderLoop;
pub use runtime::{ModuleRuntime, RunningModule, RuntimeConfig};
pub use state_store::{CommitOutcome, CycleOutcome, StateStore};
pub use template::{CompiledFormat, Template};

// Re-export types used in trait signatures for convenience
pub use waystat_types::{
    FetchRequest, FetchResult, FieldMetadata, FieldType, FormatTemplate, ModuleConfig,
    ModuleState, Sample, StatusClass,
};
