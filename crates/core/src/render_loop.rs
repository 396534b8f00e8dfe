//! Writes one JSON line per redraw

use std::io::{self, Write};
use waystat_types::{Emission, ModuleState};

use crate::coordinator::Coordinator;

/// Drains redraw signals into `writer`
pub struct RenderLoop<W> {
    coordinator: Coordinator,
    writer: W,
}

impl<W: Write> RenderLoop<W> {
    pub fn new(coordinator: Coordinator, writer: W) -> Self {
        Self {
            coordinator,
            writer,
        }
    }

    /// Emit until the module closes. A write error closes the module.
    pub fn run(mut self) -> io::Result<()> {
        while let Some(state) = self.coordinator.wait_for_redraw_signal() {
            if let Err(e) = self.emit(&state) {
                log::error!("Failed to write to stdout: {}", e);
                self.coordinator.close();
                return Err(e);
            }
        }
        log::debug!("Render loop exiting");
        Ok(())
    }

    /// Write a single state as one line and flush it
    pub fn emit(&mut self, state: &ModuleState) -> io::Result<()> {
        let line = Emission::from_state(state).to_line()?;
        log::trace!("emit {}", line);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::new_module;
    use crate::runtime::RuntimeConfig;
    use std::time::Duration;
    use waystat_types::FormatTemplate;

    #[test]
    fn test_emits_one_line_per_redraw() {
        let formats = [FormatTemplate::new("{value}")];
        let config = RuntimeConfig::new("m", Duration::from_secs(60), &formats, "Working…")
            .unwrap();
        let (coordinator, _store) = new_module(&config);

        coordinator.request_redraw();
        coordinator.request_redraw();
        coordinator.close();

        let mut out = Vec::new();
        RenderLoop::new(coordinator, &mut out).run().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "{\"text\":\"Working…\",\"tooltip\":\"Working…\",\"class\":\"loading\"}\n"
        );
    }
}
