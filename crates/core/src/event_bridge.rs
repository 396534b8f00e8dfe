//! Turns signals, click commands and the interval timer into coordinator
//! requests

use crossbeam::channel::{tick, Receiver};
use crossbeam::select;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::coordinator::Coordinator;
use crate::state_store::{CycleOutcome, StateStore};

/// External event delivered to a running module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Fetch now (SIGHUP, `refresh` command)
    Refresh,
    /// Show the next format (SIGUSR1, `cycle` command)
    CycleFormat,
    /// Stop the module (SIGTERM, SIGINT, `quit` command)
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command {0:?} (expected refresh, cycle or quit)")]
pub struct UnknownCommand(pub String);

impl FromStr for BridgeEvent {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refresh" | "update" => Ok(BridgeEvent::Refresh),
            "cycle" | "next" => Ok(BridgeEvent::CycleFormat),
            "quit" | "exit" => Ok(BridgeEvent::Shutdown),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Event dispatch for one module
pub struct EventBridge {
    coordinator: Coordinator,
    store: StateStore,
    interval: Duration,
}

impl EventBridge {
    pub fn new(coordinator: Coordinator, store: StateStore, interval: Duration) -> Self {
        Self {
            coordinator,
            store,
            interval,
        }
    }

    /// Apply one event. Breaks once the module should stop.
    pub fn handle(&self, event: BridgeEvent) -> ControlFlow<()> {
        log::debug!("Event: {:?}", event);
        match event {
            BridgeEvent::Refresh => self.coordinator.request_fetch(),
            BridgeEvent::CycleFormat => match self.store.cycle_format() {
                CycleOutcome::Unchanged => log::debug!("Only one format, nothing to cycle"),
                CycleOutcome::Redraw { from, to } => {
                    log::debug!("Format {} -> {}", from, to);
                    self.coordinator.request_redraw();
                }
                CycleOutcome::Refetch { from, to } => {
                    log::debug!("Format {} -> {} changes target, fetching", from, to);
                    self.coordinator.request_fetch();
                }
            },
            BridgeEvent::Shutdown => {
                log::info!("Shutting down");
                self.coordinator.close();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Dispatch events and interval ticks until shutdown.
    ///
    /// Also stops when every event sender is gone or `render_done` disconnects.
    pub fn run(&self, events: Receiver<BridgeEvent>, render_done: Receiver<()>) {
        let ticker = tick(self.interval);
        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => {
                        if self.handle(event).is_break() {
                            break;
                        }
                    }
                    Err(_) => {
                        log::debug!("Event channel closed");
                        self.coordinator.close();
                        break;
                    }
                },
                recv(render_done) -> _ => {
                    log::debug!("Render loop finished, stopping event bridge");
                    break;
                }
                recv(ticker) -> _ => self.coordinator.request_fetch(),
            }
        }
    }
}
