//! A small, stateful stand-in for a BC127 running Melody firmware.
//!
//! [`SimulatedModule`] answers the line protocol closely enough for demos and
//! smoke tests: parameters can be set and read back, `RESET` prints the boot
//! banner, and a bare carriage return gets the `ERROR` line a real module
//! sends for an empty command.

use std::collections::HashMap;

use crate::mock_channel::MockChannel;
use crate::mock_clock::MockClock;

const EOL: &str = "\n\r";

/// Boot banner printed after `RESET`.
const BANNER: &[&str] = &["BlueCreation Copyright 2013", "Melody Audio V5.0 RC9", "Ready"];

/// Commands the simulated module accepts without parameters.
const BARE_COMMANDS: &[&str] = &[
    "RESTORE",
    "WRITE",
    "ADVERTISING ON",
    "ADVERTISING OFF",
    "PLAY",
    "PAUSE",
    "FORWARD",
    "BACKWARD",
    "VOLUME UP",
    "VOLUME DOWN",
    "STOP",
    "STATUS",
];

/// Stateful simulated module.
#[derive(Debug, Clone)]
pub struct SimulatedModule {
    params: HashMap<String, String>,
}

impl SimulatedModule {
    /// Create a module with factory-default parameters.
    pub fn new() -> Self {
        let mut module = SimulatedModule {
            params: HashMap::new(),
        };
        module.restore_defaults();
        module
    }

    /// Wrap a new simulated module in a [`MockChannel`] driven by `clock`.
    pub fn into_channel(self, clock: MockClock) -> MockChannel {
        let mut module = self;
        let mut channel = MockChannel::new(clock);
        channel.set_responder(move |request| Some(module.reply(request)));
        channel
    }

    /// Current value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Produce the bytes the module sends in answer to one written line.
    pub fn reply(&mut self, request: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(request);
        let line = text.trim_end_matches('\r');

        let lines: Vec<String> = if line.is_empty() {
            vec!["ERROR".into()]
        } else if line == "RESET" {
            BANNER.iter().map(|s| s.to_string()).collect()
        } else if line == "RESTORE" {
            self.restore_defaults();
            vec!["OK".into()]
        } else if let Some(name) = line.strip_prefix("GET ") {
            match self.params.get(name) {
                Some(value) => vec![format!("{name}={value}"), "OK".into()],
                None => vec!["ERROR".into()],
            }
        } else if let Some(assignment) = line.strip_prefix("SET ") {
            match assignment.split_once('=') {
                Some((name, value)) if self.params.contains_key(name) => {
                    self.params.insert(name.to_string(), value.to_string());
                    vec!["OK".into()]
                }
                _ => vec!["ERROR".into()],
            }
        } else if BARE_COMMANDS.contains(&line) {
            vec!["OK".into()]
        } else {
            vec!["ERROR".into()]
        };

        lines
            .into_iter()
            .flat_map(|l| format!("{l}{EOL}").into_bytes())
            .collect()
    }

    fn restore_defaults(&mut self) {
        self.params = [
            ("BAUD", "9600"),
            ("BLE_ROLE", "1"),
            ("CLASSIC_ROLE", "0"),
            ("LOCAL_ADDR", "20FABB000001"),
            ("NAME", "BlueCreation-000001"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    }
}

impl Default for SimulatedModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_is_an_error() {
        let mut module = SimulatedModule::new();
        assert_eq!(module.reply(b"\r"), b"ERROR\n\r");
    }

    #[test]
    fn get_known_parameter() {
        let mut module = SimulatedModule::new();
        assert_eq!(
            module.reply(b"GET LOCAL_ADDR\r"),
            b"LOCAL_ADDR=20FABB000001\n\rOK\n\r"
        );
    }

    #[test]
    fn get_unknown_parameter() {
        let mut module = SimulatedModule::new();
        assert_eq!(module.reply(b"GET NOPE\r"), b"ERROR\n\r");
    }

    #[test]
    fn set_then_get() {
        let mut module = SimulatedModule::new();
        assert_eq!(module.reply(b"SET BLE_ROLE=2\r"), b"OK\n\r");
        assert_eq!(module.param("BLE_ROLE"), Some("2"));
        assert_eq!(module.reply(b"GET BLE_ROLE\r"), b"BLE_ROLE=2\n\rOK\n\r");
    }

    #[test]
    fn restore_resets_parameters() {
        let mut module = SimulatedModule::new();
        module.reply(b"SET BAUD=115200\r");
        assert_eq!(module.reply(b"RESTORE\r"), b"OK\n\r");
        assert_eq!(module.param("BAUD"), Some("9600"));
    }

    #[test]
    fn reset_prints_banner() {
        let mut module = SimulatedModule::new();
        let reply = String::from_utf8(module.reply(b"RESET\r")).unwrap();
        assert!(reply.ends_with("Ready\n\r"));
        assert_eq!(reply.matches(EOL).count(), 3);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut module = SimulatedModule::new();
        assert_eq!(module.reply(b"FROB\r"), b"ERROR\n\r");
    }
}
