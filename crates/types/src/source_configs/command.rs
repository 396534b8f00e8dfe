//! Command collector options.

use serde::{Deserialize, Serialize};

fn default_shell() -> String {
    "sh".to_string()
}

/// Command collector options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandOptions {
    /// Shell command line; `{target}` is replaced by the active format's target
    pub command: String,
    /// Shell used to run the command with `-c`
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Kill the command after this many seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            command: String::new(),
            shell: default_shell(),
            timeout_seconds: None,
        }
    }
}
