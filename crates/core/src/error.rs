//! Error taxonomy
//!
//! `ConfigError` is fatal: it is raised before any thread starts and the
//! process exits. `FetchError` describes a failed collection; the runtime
//! records it on the display and keeps running.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or unusable configuration, fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no module given (pass a config file or --module)")]
    MissingModule,

    #[error("collector {0:?} is not available on this system")]
    Unavailable(String),

    #[error("interval_seconds must be at least 1")]
    InvalidInterval,

    #[error("module {0:?} has no formats")]
    NoFormats(String),

    #[error("unknown module {name:?} (available: {available})")]
    UnknownCollector { name: String, available: String },

    #[error("format {index}: {source}")]
    InvalidTemplate {
        index: usize,
        #[source]
        source: TemplateError,
    },

    #[error("invalid options for {module}: {reason}")]
    Options { module: String, reason: String },
}

/// Template syntax problems, reported with the byte offset they occur at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed '{{' at offset {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at offset {0}")]
    UnmatchedClose(usize),

    #[error("invalid field {spec:?} at offset {offset}")]
    InvalidField { spec: String, offset: usize },
}

/// A collection attempt that did not produce a sample
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("collector panicked: {0}")]
    Panicked(String),
}
