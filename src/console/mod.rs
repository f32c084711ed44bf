//! Operator console output
//!
//! Styled console helpers for the interactive flow: the startup logo, the
//! current-settings banner with `(default)` tags, record echoes and the
//! `ERROR:`-prefixed failure lines. Operator-facing output goes through this
//! module; diagnostics go through `tracing` instead.

pub mod interpreter;

pub use interpreter::{CommandInterpreter, InterpreterOutcome};

use crate::config::{ChannelConfig, Field};
use crossterm::style::Stylize;
use std::io::Write;

/// Fields in banner display order
const BANNER_FIELDS: [(Field, &str); 8] = [
    (Field::PortName, "PortName"),
    (Field::BaudRate, "BaudRate"),
    (Field::DataBits, "DataBits"),
    (Field::Parity, "Parity"),
    (Field::StopBits, "StopBits"),
    (Field::Handshake, "Handshake"),
    (Field::Timeout, "Timeout"),
    (Field::LogInterval, "LogInterval"),
];

/// Set the terminal window title
pub fn set_title() {
    let title = format!("SerialLog v{}", env!("CARGO_PKG_VERSION"));
    let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::SetTitle(title));
}

/// Print the startup logo and version line
pub fn print_logo() {
    println!(r" __           _       _   __             ");
    println!(r"/ _\ ___ _ __(_) __ _| | / /  ___   __ _ ");
    println!(r"\ \ / _ \ '__| |/ _` | |/ /  / _ \ / _` |");
    println!(r"_\ \  __/ |  | | (_| | / /__| (_) | (_| |");
    println!(r"\__/\___|_|  |_|\__,_|_\____/\___/ \__, |");
    println!(r" v{:<34}|___/ ", env!("CARGO_PKG_VERSION"));
    println!();
}

/// One padded `label ... : value tag` banner row
fn write_info(label: &str, value: &str, tag: &str) {
    println!("  {:.<20} : {:<20} {}", label, value, tag);
}

/// Print the full current-settings banner with command hints
pub fn show_settings(config: &ChannelConfig) {
    println!("{}", "Current Settings".cyan());
    for (field, label) in BANNER_FIELDS {
        let tag = if config.is_default(field) { "(default)" } else { "" };
        write_info(label, &config.display_value(field), tag);
    }
    println!();
    println!(
        "  {}{}",
        "To update a value, type ".dark_yellow(),
        "/set <label> <value>".yellow()
    );
    println!("  {}{}", "To get help, type ".dark_red(), "/help <label>".red());
    println!("  {}{}", "To start logging, type ".dark_green(), "/start".green());
    println!(
        "  {}",
        "Data logging is automatic once the channel is open.".dark_grey()
    );
    println!();
}

/// List the serial ports currently present on the system
pub fn show_ports(ports: &[String]) {
    println!("Available serial ports:-");
    if ports.is_empty() {
        println!("  {}", "(none detected)".dark_grey());
    }
    for port in ports {
        println!("  {}", port);
    }
    println!();
}

/// Print an operator-surfaced error with the `ERROR:` prefix
pub fn error_line(message: &str) {
    println!("{}", format!("ERROR: {}", message).white().on_dark_red());
}

/// Print a success/status line
pub fn status_line(message: &str) {
    println!("{}", message.black().on_green());
}

/// Echo one flushed record to the console
pub fn echo_record(timestamp: &str, payload: &str) {
    println!("{} {}", format!("[{}]", timestamp).green(), payload);
}

/// Print a plain informational line
pub fn plain_line(message: &str) {
    println!("{}", message);
}

/// Show the command prompt
pub fn prompt() {
    print!("{} ", ">".yellow());
    let _ = std::io::stdout().flush();
}

/// Block until the operator acknowledges with Enter
pub fn pause_for_ack() {
    println!("{}", "Press Enter to exit...".yellow());
    let mut ack = String::new();
    let _ = std::io::stdin().read_line(&mut ack);
}
