//! Shell command collector
//!
//! Runs a command line with `sh -c` on every fetch. Output that is a JSON
//! object becomes the sample's fields, so scripts written for Waybar's own
//! `return-type: json` work unchanged. Anything else is exposed as `output`.

use anyhow::Result;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use serde_json::{Map, Value};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use waystat_core::{
    parse_options, Collector, CollectorMetadata, ConfigError, FetchError, FetchRequest,
    FieldMetadata, FieldType, FormatTemplate, Sample, StatusClass,
};
use waystat_types::source_configs::CommandOptions;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Command collector
pub struct CommandCollector {
    metadata: CollectorMetadata,
    options: CommandOptions,
}

impl CommandCollector {
    pub fn new() -> Self {
        Self {
            metadata: CollectorMetadata {
                id: "command".to_string(),
                name: "Command".to_string(),
                description: "Output of a shell command".to_string(),
                default_interval: Duration::from_secs(60),
            },
            options: CommandOptions::default(),
        }
    }

    /// Command line with `{target}` replaced
    fn command_line(&self, target: Option<&str>) -> String {
        self.options
            .command
            .replace("{target}", target.unwrap_or_default())
    }

    fn run(&self, command: &str) -> Result<String, FetchError> {
        let deadline = self
            .options
            .timeout_seconds
            .map(|seconds| Instant::now() + Duration::from_secs(seconds));

        let mut child = Command::new(&self.options.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FetchError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty command cannot block
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child, command, deadline)?;
        // A background job of the command can hold the pipes open after the
        // shell exits, so reading is bounded by the same deadline.
        let stdout = self.read_output(&stdout, command, deadline)?;
        let stderr = self.read_output(&stderr, command, deadline)?;

        if status.success() {
            Ok(stdout)
        } else {
            Err(FetchError::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            })
        }
    }

    fn timed_out(&self, command: &str) -> FetchError {
        FetchError::Timeout {
            command: command.to_string(),
            seconds: self.options.timeout_seconds.unwrap_or_default(),
        }
    }

    fn wait(
        &self,
        child: &mut Child,
        command: &str,
        deadline: Option<Instant>,
    ) -> Result<ExitStatus, FetchError> {
        let spawn_error = |source| FetchError::Spawn {
            command: command.to_string(),
            source,
        };
        let Some(deadline) = deadline else {
            return child.wait().map_err(spawn_error);
        };

        loop {
            if let Some(status) = child.try_wait().map_err(spawn_error)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill `{}`: {}", command, e);
                }
                let _ = child.wait();
                return Err(self.timed_out(command));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn read_output(
        &self,
        output: &Receiver<String>,
        command: &str,
        deadline: Option<Instant>,
    ) -> Result<String, FetchError> {
        let Some(deadline) = deadline else {
            return Ok(output.recv().unwrap_or_default());
        };
        match output.recv_deadline(deadline) {
            Ok(text) => Ok(text),
            Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("`{}` exited but its output is still open", command);
                Err(self.timed_out(command))
            }
        }
    }
}

/// Read a pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = channel::bounded(1);
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                if let Err(e) = pipe.read_to_end(&mut buffer) {
                    log::debug!("Failed to read command output: {}", e);
                }
                let _ = tx.send(String::from_utf8_lossy(&buffer).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Turn command output into a sample
pub fn parse_output(output: &str) -> Sample {
    let output = output.trim_end();
    match serde_json::from_str::<Value>(output) {
        Ok(Value::Object(object)) => sample_from_object(object),
        _ => {
            let first_line = output.lines().next().unwrap_or_default();
            let mut sample = Sample::new(StatusClass::Ok)
                .with_field("output", output)
                .with_field("line", first_line);
            if output.contains('\n') {
                sample.tooltip = output.to_string();
            }
            sample
        }
    }
}

fn sample_from_object(object: Map<String, Value>) -> Sample {
    let status = object
        .get("class")
        .and_then(|class| serde_json::from_value::<StatusClass>(class.clone()).ok())
        .unwrap_or_default();
    let mut sample = Sample::new(status);

    if let Some(tooltip) = object.get("tooltip").and_then(Value::as_str) {
        sample.tooltip = tooltip.to_string();
    }
    sample.percentage = object.get("percentage").and_then(Value::as_f64);

    let output = match object.get("text") {
        Some(Value::String(text)) => text.clone(),
        _ => Value::Object(object.clone()).to_string(),
    };
    sample.fields = object.into_iter().collect();
    sample.insert("output", output);
    sample
}

impl Default for CommandCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for CommandCollector {
    fn metadata(&self) -> &CollectorMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new(
                "output",
                "Trimmed stdout, or `text` of a JSON object",
                FieldType::Text,
            ),
            FieldMetadata::new("line", "First line of plain output", FieldType::Text),
            FieldMetadata::new("<key>", "Every key of a JSON object output", FieldType::Text),
        ]
    }

    fn default_formats(&self) -> Vec<FormatTemplate> {
        vec![FormatTemplate::new("{output}")]
    }

    fn configure(&mut self, options: &Value) -> Result<(), ConfigError> {
        let options: CommandOptions = parse_options(&self.metadata.id, options)?;
        if options.command.trim().is_empty() {
            return Err(ConfigError::Options {
                module: self.metadata.id.clone(),
                reason: "`command` must not be empty".to_string(),
            });
        }
        self.options = options;
        Ok(())
    }

    fn collect(&mut self, request: &FetchRequest) -> Result<Sample> {
        let command = self.command_line(request.target.as_deref());
        log::debug!("Running `{}`", command);
        let output = self.run(&command)?;
        Ok(parse_output(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collector(options: Value) -> CommandCollector {
        let mut collector = CommandCollector::new();
        collector.configure(&options).unwrap();
        collector
    }

    fn request(target: Option<&str>) -> FetchRequest {
        FetchRequest {
            format_index: 0,
            target: target.map(str::to_string),
        }
    }

    #[test]
    fn test_plain_output() {
        let mut collector = collector(json!({"command": "printf 'up 3 days\\nload 0.1\\n'"}));
        let sample = collector.collect(&request(None)).unwrap();
        assert_eq!(sample.fields["output"], "up 3 days\nload 0.1");
        assert_eq!(sample.fields["line"], "up 3 days");
        assert_eq!(sample.tooltip, "up 3 days\nload 0.1");
    }

    #[test]
    fn test_json_output_becomes_fields() {
        let sample = parse_output(
            r#"{"text": "12°C", "tooltip": "Cloudy", "class": "warning", "percentage": 40, "wind": 3}"#,
        );
        assert_eq!(sample.fields["output"], "12°C");
        assert_eq!(sample.fields["wind"], 3);
        assert_eq!(sample.tooltip, "Cloudy");
        assert_eq!(sample.status, StatusClass::Warning);
        assert_eq!(sample.percentage, Some(40.0));
    }

    #[test]
    fn test_unknown_class_falls_back_to_ok() {
        let sample = parse_output(r#"{"text": "x", "class": "custom-thing"}"#);
        assert_eq!(sample.status, StatusClass::Ok);
    }

    #[test]
    fn test_target_substitution() {
        let mut collector = collector(json!({"command": "echo {target}"}));
        let sample = collector.collect(&request(Some("wlan0"))).unwrap();
        assert_eq!(sample.fields["output"], "wlan0");
    }

    #[test]
    fn test_non_zero_exit_is_an_error() {
        let mut collector = collector(json!({"command": "echo boom >&2; exit 3"}));
        let err = collector.collect(&request(None)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exited with"), "{}", message);
        assert!(message.ends_with("boom"), "{}", message);
    }

    #[test]
    fn test_timeout_kills_command() {
        let mut collector = collector(json!({"command": "sleep 5", "timeout_seconds": 1}));
        let started = Instant::now();
        let err = collector.collect(&request(None)).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(err.to_string(), "`sleep 5` timed out after 1s");
    }

    #[test]
    fn test_timeout_covers_background_jobs_holding_output() {
        let mut collector = collector(json!({
            "command": "sleep 6 & echo hi",
            "timeout_seconds": 1
        }));
        let started = Instant::now();
        let err = collector.collect(&request(None)).unwrap_err();
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "finished in {:?}",
            started.elapsed()
        );
        assert_eq!(err.to_string(), "`sleep 6 & echo hi` timed out after 1s");
    }

    #[test]
    fn test_detached_background_job_does_not_delay_output() {
        let mut collector = collector(json!({
            "command": "sleep 6 >/dev/null 2>&1 & echo hi",
            "timeout_seconds": 1
        }));
        let started = Instant::now();
        let sample = collector.collect(&request(None)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(sample.fields["output"], "hi");
    }

    #[test]
    fn test_missing_command_is_config_error() {
        let mut collector = CommandCollector::new();
        assert!(collector.configure(&Value::Null).is_err());
    }
}
