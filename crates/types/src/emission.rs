//! Wire payload written to the bar, one JSON object per line

use crate::state::ModuleState;
use crate::status::StatusClass;
use serde::{Deserialize, Serialize};

/// One line of the Waybar custom-module protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    pub text: String,
    pub tooltip: String,
    pub class: StatusClass,
    /// Waybar only accepts integral percentages
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub percentage: Option<u32>,
}

impl Emission {
    /// Build the payload from a state snapshot
    pub fn from_state(state: &ModuleState) -> Self {
        Self {
            text: state.display_text.clone(),
            tooltip: state.tooltip.clone(),
            class: state.status_class,
            percentage: state
                .percentage
                .filter(|p| p.is_finite())
                .map(|p| p.clamp(0.0, 100.0).round() as u32),
        }
    }

    /// Serialize to a single line without the trailing newline.
    ///
    /// serde_json escapes embedded newlines, so the result never spans lines.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
