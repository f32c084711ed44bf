//! Interactive command interpreter
//!
//! A synchronous read-eval loop over operator input lines, active only while
//! the session is configuring. The command surface is deliberately small:
//!
//! - `/start` - freeze the configuration and hand control back for arming
//! - `/set <label> <value>` - validate and apply one field, persisting it
//! - `/help <label>` - static help for one field
//!
//! Anything else, including unknown `/set` and `/help` labels, is silently
//! ignored. `/set` and `/start` both redraw the settings banner so the
//! operator always sees the effective configuration.

use crate::config::{
    ChannelConfig, Field, Handshake, Parity, SettingsStore, StopBits, BAUD_RATES,
    DATA_BITS_OPTIONS, MIN_LOG_INTERVAL_MS,
};
use crate::console;
use crate::error::Result;
use crate::transport;
use std::io::BufRead;

/// A parsed operator input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin streaming
    Start,
    /// Mutate one configuration field
    Set { label: String, value: String },
    /// Show help for one field
    Help { label: String },
    /// Anything unrecognized; produces no output
    Ignored,
}

/// Scan an input line for a command token.
///
/// `/start` wins over the other commands when several tokens are present.
pub fn parse_command(line: &str) -> Command {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.iter().any(|t| t.eq_ignore_ascii_case("/start")) {
        return Command::Start;
    }

    if let Some(pos) = tokens.iter().position(|t| t.eq_ignore_ascii_case("/help")) {
        if let Some(label) = tokens.get(pos + 1) {
            return Command::Help {
                label: label.to_string(),
            };
        }
        return Command::Ignored;
    }

    if let Some(pos) = tokens.iter().position(|t| t.eq_ignore_ascii_case("/set")) {
        if let (Some(label), Some(value)) = (tokens.get(pos + 1), tokens.get(pos + 2)) {
            return Command::Set {
                label: label.to_string(),
                value: value.to_string(),
            };
        }
        return Command::Ignored;
    }

    Command::Ignored
}

/// How the interpreter loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterOutcome {
    /// `/start` was issued; the session should be armed
    Start,
    /// Operator input ended without `/start`
    EndOfInput,
}

impl InterpreterOutcome {
    /// Whether the interpreter ended with `/start`
    pub fn is_start(&self) -> bool {
        matches!(self, InterpreterOutcome::Start)
    }
}

/// The read-eval loop plus the settings mutator behind `/set`
pub struct CommandInterpreter<'a> {
    config: &'a mut ChannelConfig,
    store: &'a SettingsStore,
}

impl<'a> CommandInterpreter<'a> {
    /// Create an interpreter over the live configuration and its store
    pub fn new(config: &'a mut ChannelConfig, store: &'a SettingsStore) -> Self {
        Self { config, store }
    }

    /// Run the loop until `/start` or end of input
    pub fn run(&mut self, input: &mut impl BufRead) -> Result<InterpreterOutcome> {
        loop {
            console::prompt();
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(InterpreterOutcome::EndOfInput);
            }

            match parse_command(&line) {
                Command::Start => {
                    console::show_settings(self.config);
                    return Ok(InterpreterOutcome::Start);
                }
                Command::Set { label, value } => self.apply_set(&label, &value),
                Command::Help { label } => show_help(&label),
                Command::Ignored => {}
            }
        }
    }

    /// Validate and apply one `/set`, persisting the field on success.
    ///
    /// A rejected value leaves the field (and the store) untouched; either
    /// way the banner is redrawn with the effective configuration.
    fn apply_set(&mut self, label: &str, value: &str) {
        let Some(field) = Field::from_label(label) else {
            return; // Unknown label; silent like any unrecognized input
        };

        match self.config.set(field, value) {
            Ok(()) => {
                if let Err(e) = self.store.save(self.config) {
                    console::error_line(&e.to_string());
                } else {
                    tracing::info!(
                        "Setting {} updated to {}",
                        field.label(),
                        self.config.display_value(field)
                    );
                }
            }
            Err(e) => console::error_line(&e.to_string()),
        }

        console::show_settings(self.config);
    }
}

/// Print the help text for a known label; unknown labels print nothing
fn show_help(label: &str) {
    let Some(field) = Field::from_label(label) else {
        return;
    };

    match field {
        Field::PortName => {
            console::plain_line("Name of the serial device, e.g. COM3 or /dev/ttyUSB0.");
            console::show_ports(&transport::available_port_names());
        }
        Field::BaudRate => {
            console::plain_line("Transmission speed in bits per second. Default: 9600.");
            let rates = BAUD_RATES
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("  ");
            console::plain_line(&format!("Available options: {}", rates));
        }
        Field::DataBits => {
            console::plain_line("Number of data bits per character. Default: 8.");
            let bits = DATA_BITS_OPTIONS
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join("  ");
            console::plain_line(&format!("Available options: {}", bits));
        }
        Field::Parity => {
            console::plain_line("Parity bit added to each character. Default: None.");
            console::plain_line(&format!("Available options: {}", join_options(&Parity::ALL)));
        }
        Field::StopBits => {
            console::plain_line("Stop bits terminating each character. Default: One.");
            console::plain_line(&format!(
                "Available options: {}",
                join_options(&StopBits::ALL)
            ));
        }
        Field::Handshake => {
            console::plain_line("Flow control for the channel. Default: None.");
            console::plain_line(&format!(
                "Available options: {}",
                join_options(&Handshake::ALL)
            ));
        }
        Field::Timeout => {
            console::plain_line(
                "Blocking-read timeout in milliseconds. The reader treats a timeout as \
                 an idle channel, not an error. Default: 500.",
            );
        }
        Field::LogInterval => {
            console::plain_line(&format!(
                "Interval in milliseconds between data log flushes (minimum {}). \
                 Default: 1000. Takes effect on the next session start.",
                MIN_LOG_INTERVAL_MS
            ));
        }
    }
}

fn join_options<T: std::fmt::Display>(options: &[T]) -> String {
    options
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join("  ")
}
