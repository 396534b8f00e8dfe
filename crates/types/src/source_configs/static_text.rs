//! Static text collector options.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::status::StatusClass;

/// Fixed fields returned on every fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StaticTextOptions {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default)]
    pub class: StatusClass,
}
