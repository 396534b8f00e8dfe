//! Line commands on stdin
//!
//! Waybar's `on-click` can write to the module's stdin, so `refresh`,
//! `cycle` and `quit` lines act like the matching signals. End of input only
//! stops the reader; the module keeps running.

use crossbeam::channel::Sender;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crate::event_bridge::BridgeEvent;

/// Spawn a thread forwarding commands read from `input` to `events`
pub fn spawn_command_reader<R>(input: R, events: Sender<BridgeEvent>) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("commands".to_string())
        .spawn(move || read_commands(input, &events))
}

/// Forward commands until end of input or until nobody is listening
pub fn read_commands<R: BufRead>(input: R, events: &Sender<BridgeEvent>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read command: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<BridgeEvent>() {
            Ok(event) => {
                if events.send(event).is_err() {
                    return;
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }
    log::debug!("Command input closed");
}
