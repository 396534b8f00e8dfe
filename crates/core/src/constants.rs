//! Shared constants for the runtime and collectors

use std::time::Duration;

/// Fallback fetch interval when a collector does not suggest one
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Rendered in place of a template field the sample does not contain
pub const MISSING_FIELD: &str = "N/A";

/// Prefix of the tooltip line naming the last successful update
pub const LAST_UPDATED_PREFIX: &str = "Last updated";

/// Timestamp format used in tooltips
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
