//! Display state of a module
//!
//! The store shares its lock with the coordinator, so a commit or a format
//! change is never observed half done by the render loop.

use chrono::{DateTime, Local};
use std::sync::Arc;
use waystat_types::{FetchResult, ModulePhase, ModuleState, StatusClass};

use crate::constants::{LAST_UPDATED_PREFIX, TIMESTAMP_FORMAT};
use crate::coordinator::{Inner, Shared};
use crate::template::CompiledFormat;

/// What a commit did to the display state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// New sample rendered
    Applied,
    /// Fetch failed; previous text kept and marked stale (or error)
    Degraded,
    /// Result was for a target that is no longer displayed, nothing changed
    Superseded,
}

/// What a format cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Only one format configured
    Unchanged,
    /// New format renders from the retained sample
    Redraw { from: usize, to: usize },
    /// New format reads a different target and needs a fetch
    Refetch { from: usize, to: usize },
}

/// Synchronized access to a module's `ModuleState`
#[derive(Clone)]
pub struct StateStore {
    shared: Arc<Shared>,
}

impl StateStore {
    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ModuleState {
        self.shared.lock().state.clone()
    }

    pub fn format_index(&self) -> usize {
        self.shared.lock().state.format_index
    }

    pub fn format_count(&self) -> usize {
        self.shared.formats.len()
    }

    /// Apply the outcome of a fetch cycle.
    ///
    /// A successful result replaces the display wholesale. A failed one keeps
    /// the previous text and marks it stale; with nothing to fall back to the
    /// error itself is shown.
    pub fn commit(&self, result: FetchResult) -> CommitOutcome {
        let formats = &self.shared.formats;
        let mut inner = self.shared.lock();
        inner.phase = ModulePhase::Ready;

        let fetched_target = formats
            .get(result.format_index)
            .and_then(|format| format.target.clone());
        if fetched_target != formats[inner.state.format_index].target {
            return CommitOutcome::Superseded;
        }

        match (result.success, result.payload) {
            (true, Some(sample)) => {
                inner.sample_target = fetched_target;
                inner.state.sample = Some(sample);
                inner.state.last_error = None;
                inner.state.last_updated = Some(result.finished_at);
                rerender(&mut inner, formats);
                CommitOutcome::Applied
            }
            (_, _) => {
                let error = result
                    .error
                    .unwrap_or_else(|| "collector returned no data".to_string());
                inner.state.last_error = Some(error);
                rerender(&mut inner, formats);
                CommitOutcome::Degraded
            }
        }
    }

    /// Advance to the next format, wrapping around.
    pub fn cycle_format(&self) -> CycleOutcome {
        let formats = &self.shared.formats;
        if formats.len() <= 1 {
            return CycleOutcome::Unchanged;
        }

        let mut inner = self.shared.lock();
        let from = inner.state.format_index;
        let to = (from + 1) % formats.len();
        inner.state.format_index = to;

        if formats[from].requires_fetch_for(&formats[to]) {
            CycleOutcome::Refetch { from, to }
        } else {
            rerender(&mut inner, formats);
            CycleOutcome::Redraw { from, to }
        }
    }
}

/// Recompute the display fields from the retained sample and last error
fn rerender(inner: &mut Inner, formats: &[CompiledFormat]) {
    let format = &formats[inner.state.format_index];
    let sample = inner
        .state
        .sample
        .as_ref()
        .filter(|_| inner.sample_target == format.target)
        .cloned();
    let state = &mut inner.state;

    match (sample, state.last_error.clone()) {
        (Some(sample), error) => {
            state.display_text = format.text.render(&sample.fields);
            let base = match &format.tooltip {
                Some(template) => template.render(&sample.fields),
                None => sample.tooltip.clone(),
            };
            state.tooltip = compose_tooltip(&base, state.last_updated, error.as_deref());
            state.percentage = sample.percentage;
            state.status_class = if error.is_some() {
                StatusClass::Stale
            } else {
                sample.status
            };
        }
        (None, Some(error)) => {
            state.display_text = error.lines().next().unwrap_or_default().to_string();
            state.tooltip = error;
            state.percentage = None;
            state.status_class = StatusClass::Error;
        }
        // Nothing collected for this format yet; keep what is shown
        (None, None) => {}
    }
}

fn compose_tooltip(base: &str, updated: Option<DateTime<Local>>, error: Option<&str>) -> String {
    let mut footer = Vec::new();
    if let Some(updated) = updated {
        footer.push(format!(
            "{} {}",
            LAST_UPDATED_PREFIX,
            updated.format(TIMESTAMP_FORMAT)
        ));
    }
    if let Some(error) = error {
        footer.push(format!("Update failed: {}", error));
    }

    match (base.is_empty(), footer.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => footer.join("\n"),
        (false, false) => format!("{}\n\n{}", base, footer.join("\n")),
    }
}
