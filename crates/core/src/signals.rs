//! POSIX signal delivery
//!
//! Handlers only record the signal; a dedicated thread turns each one into a
//! `BridgeEvent`. SIGHUP refreshes, SIGUSR1 cycles formats and SIGTERM or
//! SIGINT shut the module down.

use crossbeam::channel::Sender;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::thread::{self, JoinHandle};

use crate::event_bridge::BridgeEvent;

/// Signals handled by a module process
pub const HANDLED_SIGNALS: [i32; 4] = [SIGHUP, SIGUSR1, SIGTERM, SIGINT];

/// Map a signal number to the event it triggers
pub fn event_for_signal(signal: i32) -> Option<BridgeEvent> {
    match signal {
        SIGHUP => Some(BridgeEvent::Refresh),
        SIGUSR1 => Some(BridgeEvent::CycleFormat),
        SIGTERM | SIGINT => Some(BridgeEvent::Shutdown),
        _ => None,
    }
}

/// Running signal listener
pub struct SignalListener {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalListener {
    /// Install the handlers and start forwarding to `events`
    pub fn spawn(events: Sender<BridgeEvent>) -> io::Result<Self> {
        let mut signals = Signals::new(HANDLED_SIGNALS)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    let Some(event) = event_for_signal(signal) else {
                        continue;
                    };
                    log::debug!("Received signal {} -> {:?}", signal, event);
                    if events.send(event).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self { handle, thread })
    }

    /// Unregister the handlers and wait for the listener thread
    pub fn close(self) {
        self.handle.close();
        if self.thread.join().is_err() {
            log::error!("Signal thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::time::Duration;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(event_for_signal(SIGHUP), Some(BridgeEvent::Refresh));
        assert_eq!(event_for_signal(SIGUSR1), Some(BridgeEvent::CycleFormat));
        assert_eq!(event_for_signal(SIGTERM), Some(BridgeEvent::Shutdown));
        assert_eq!(event_for_signal(SIGINT), Some(BridgeEvent::Shutdown));
        assert_eq!(event_for_signal(0), None);
    }

    #[test]
    fn test_sighup_becomes_refresh() {
        let (tx, rx) = unbounded();
        let listener = SignalListener::spawn(tx).unwrap();
        signal_hook::low_level::raise(SIGHUP).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(BridgeEvent::Refresh)
        );
        listener.close();
    }
}
