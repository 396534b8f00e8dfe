//! Refresh/redraw coordination
//!
//! One mutex guards the pending flags, the module phase and the display
//! state. Two condition variables wake the fetch worker and the render loop.
//! Nothing blocks while holding the lock except the condition waits
//! themselves, and collection always happens with the lock released.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use waystat_types::{FetchRequest, ModulePhase, ModuleState, StatusClass};

use crate::runtime::RuntimeConfig;
use crate::state_store::StateStore;
use crate::template::CompiledFormat;

/// Pending work, owned by the coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlags {
    pub needs_fetch: bool,
    pub needs_redraw: bool,
    /// At most one collection runs while this is set
    pub fetch_in_progress: bool,
    /// A fetch was requested while one was running; coalesced into one follow-up
    pub fetch_owed: bool,
}

pub(crate) struct Inner {
    pub(crate) flags: PendingFlags,
    pub(crate) phase: ModulePhase,
    pub(crate) closed: bool,
    pub(crate) state: ModuleState,
    /// Target the retained sample was collected for
    pub(crate) sample_target: Option<String>,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    fetch_ready: Condvar,
    redraw_ready: Condvar,
    pub(crate) formats: Vec<CompiledFormat>,
    pub(crate) loading_indicator: bool,
}

impl Shared {
    /// Lock the shared state, recovering from poisoning.
    ///
    /// Collectors never run under this lock and every critical section is a
    /// plain field update.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create the coordinator and state store of one module
pub fn new_module(config: &RuntimeConfig) -> (Coordinator, StateStore) {
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            flags: PendingFlags::default(),
            phase: ModulePhase::Starting,
            closed: false,
            state: ModuleState::placeholder(config.placeholder()),
            sample_target: None,
        }),
        fetch_ready: Condvar::new(),
        redraw_ready: Condvar::new(),
        formats: config.formats().to_vec(),
        loading_indicator: config.loading_indicator(),
    });
    (
        Coordinator {
            shared: Arc::clone(&shared),
        },
        StateStore::from_shared(shared),
    )
}

/// Sequences the fetch worker and the render loop
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// Ask for a fetch. While one is running the request is coalesced into a
    /// single follow-up, however many requests arrive.
    pub fn request_fetch(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        if inner.flags.fetch_in_progress {
            if !inner.flags.fetch_owed {
                log::debug!("Fetch in progress, deferring one follow-up fetch");
            }
            inner.flags.fetch_owed = true;
        } else {
            inner.flags.needs_fetch = true;
            self.shared.fetch_ready.notify_one();
        }
    }

    /// Ask for the current state to be emitted
    pub fn request_redraw(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        inner.flags.needs_redraw = true;
        self.shared.redraw_ready.notify_one();
    }

    /// Block until a fetch should start.
    ///
    /// Clears `needs_fetch`, sets `fetch_in_progress` and returns the request
    /// for the active format. Returns `None` once the module is closed.
    pub fn wait_for_fetch_signal(&self) -> Option<FetchRequest> {
        let guard = self.shared.lock();
        let mut inner = self
            .shared
            .fetch_ready
            .wait_while(guard, |inner| {
                !inner.closed && !(inner.flags.needs_fetch && !inner.flags.fetch_in_progress)
            })
            .unwrap_or_else(PoisonError::into_inner);

        if inner.closed {
            return None;
        }

        inner.flags.needs_fetch = false;
        inner.flags.fetch_in_progress = true;
        inner.phase = ModulePhase::Fetching;

        let format_index = inner.state.format_index;
        Some(FetchRequest {
            format_index,
            target: self.shared.formats[format_index].target.clone(),
        })
    }

    /// Block until a redraw is pending, then clear it and return the state
    /// captured in the same critical section.
    ///
    /// A redraw requested before `close` is still delivered; `None` means the
    /// module is closed and nothing is left to emit.
    pub fn wait_for_redraw_signal(&self) -> Option<ModuleState> {
        let guard = self.shared.lock();
        let mut inner = self
            .shared
            .redraw_ready
            .wait_while(guard, |inner| !inner.closed && !inner.flags.needs_redraw)
            .unwrap_or_else(PoisonError::into_inner);

        if !inner.flags.needs_redraw {
            return None;
        }
        inner.flags.needs_redraw = false;

        let mut snapshot = inner.state.clone();
        if self.shared.loading_indicator
            && inner.phase == ModulePhase::Fetching
            && snapshot.has_sample()
        {
            snapshot.status_class = StatusClass::Loading;
        }
        Some(snapshot)
    }

    /// Mark the running fetch as finished and release a coalesced follow-up
    pub fn complete_fetch(&self) {
        let mut inner = self.shared.lock();
        inner.flags.fetch_in_progress = false;
        if inner.flags.fetch_owed {
            inner.flags.fetch_owed = false;
            if !inner.closed {
                inner.flags.needs_fetch = true;
                self.shared.fetch_ready.notify_one();
            }
        }
    }

    /// Stop the module: wake every waiter and refuse new requests
    pub fn close(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        self.shared.fetch_ready.notify_all();
        self.shared.redraw_ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub fn phase(&self) -> ModulePhase {
        self.shared.lock().phase
    }

    pub fn flags(&self) -> PendingFlags {
        self.shared.lock().flags
    }

    /// Leave `Starting` once the worker threads exist
    pub(crate) fn mark_started(&self) {
        let mut inner = self.shared.lock();
        if inner.phase == ModulePhase::Starting {
            inner.phase = ModulePhase::AwaitingFirstFetch;
        }
    }
}
