//! Configuration module for SerialLog
//!
//! This module holds the channel configuration that the command interpreter
//! mutates before streaming starts:
//!
//! - [`ChannelConfig`] - The serial channel parameters plus the logging interval
//! - [`Parity`] / [`StopBits`] / [`Handshake`] - Framing option enums
//! - [`Field`] - The `/set` label → field mapping used by the settings mutator
//!
//! Every field has a validated default. Mutation is field-by-field and an
//! invalid value leaves the previous value untouched and the caller gets a
//! [`SerialLogError::Config`] describing what was rejected.

pub mod store;

pub use store::SettingsStore;

use crate::error::{Result, SerialLogError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Baud rates accepted by the `baudrate` field
pub const BAUD_RATES: [u32; 15] = [
    100, 300, 600, 1200, 2400, 4800, 9600, 14400, 19200, 38400, 56000, 57600, 115200, 128000,
    256000,
];

/// Data bit counts accepted by the `databits` field
pub const DATA_BITS_OPTIONS: [u8; 4] = [5, 6, 7, 8];

/// Minimum flush interval in milliseconds
pub const MIN_LOG_INTERVAL_MS: u64 = 200;

/// Default port name
pub const DEFAULT_PORT_NAME: &str = "COM1";

/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default data bits
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Default blocking-read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 500;

/// Default flush interval in milliseconds
pub const DEFAULT_LOG_INTERVAL_MS: u64 = 1000;

// ==================== Framing Enums ====================

/// Parity bit setting for the serial channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
    /// Parity bit always 1
    Mark,
    /// Parity bit always 0
    Space,
}

impl Parity {
    /// All variants, for option listings
    pub const ALL: [Parity; 5] = [
        Parity::None,
        Parity::Odd,
        Parity::Even,
        Parity::Mark,
        Parity::Space,
    ];
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parity::None => write!(f, "None"),
            Parity::Odd => write!(f, "Odd"),
            Parity::Even => write!(f, "Even"),
            Parity::Mark => write!(f, "Mark"),
            Parity::Space => write!(f, "Space"),
        }
    }
}

impl FromStr for Parity {
    type Err = SerialLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Parity::None),
            "odd" => Ok(Parity::Odd),
            "even" => Ok(Parity::Even),
            "mark" => Ok(Parity::Mark),
            "space" => Ok(Parity::Space),
            _ => Err(SerialLogError::config(
                "parity",
                format!("'{}' is not one of None, Odd, Even, Mark, Space", s),
            )),
        }
    }
}

/// Stop bit setting for the serial channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StopBits {
    /// No stop bits (not usable for an open channel)
    None,
    /// One stop bit
    #[default]
    One,
    /// One and a half stop bits
    OnePointFive,
    /// Two stop bits
    Two,
}

impl StopBits {
    /// All variants, for option listings
    pub const ALL: [StopBits; 4] = [
        StopBits::None,
        StopBits::One,
        StopBits::OnePointFive,
        StopBits::Two,
    ];
}

impl std::fmt::Display for StopBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopBits::None => write!(f, "None"),
            StopBits::One => write!(f, "One"),
            StopBits::OnePointFive => write!(f, "OnePointFive"),
            StopBits::Two => write!(f, "Two"),
        }
    }
}

impl FromStr for StopBits {
    type Err = SerialLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(StopBits::None),
            "one" => Ok(StopBits::One),
            "onepointfive" => Ok(StopBits::OnePointFive),
            "two" => Ok(StopBits::Two),
            _ => Err(SerialLogError::config(
                "stopbits",
                format!("'{}' is not one of None, One, OnePointFive, Two", s),
            )),
        }
    }
}

/// Flow control setting for the serial channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Handshake {
    /// No flow control
    #[default]
    None,
    /// Software flow control (XON/XOFF)
    XOnXOff,
    /// Hardware flow control (RTS/CTS)
    RequestToSend,
    /// Hardware and software flow control combined
    RequestToSendXOnXOff,
}

impl Handshake {
    /// All variants, for option listings
    pub const ALL: [Handshake; 4] = [
        Handshake::None,
        Handshake::XOnXOff,
        Handshake::RequestToSend,
        Handshake::RequestToSendXOnXOff,
    ];
}

impl std::fmt::Display for Handshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handshake::None => write!(f, "None"),
            Handshake::XOnXOff => write!(f, "XOnXOff"),
            Handshake::RequestToSend => write!(f, "RequestToSend"),
            Handshake::RequestToSendXOnXOff => write!(f, "RequestToSendXOnXOff"),
        }
    }
}

impl FromStr for Handshake {
    type Err = SerialLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Handshake::None),
            "xonxoff" => Ok(Handshake::XOnXOff),
            "requesttosend" => Ok(Handshake::RequestToSend),
            "requesttosendxonxoff" => Ok(Handshake::RequestToSendXOnXOff),
            _ => Err(SerialLogError::config(
                "handshake",
                format!(
                    "'{}' is not one of None, XOnXOff, RequestToSend, RequestToSendXOnXOff",
                    s
                ),
            )),
        }
    }
}

// ==================== Field Labels ====================

/// The configuration fields addressable through `/set` and `/help`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    PortName,
    BaudRate,
    DataBits,
    Parity,
    StopBits,
    Handshake,
    Timeout,
    LogInterval,
}

impl Field {
    /// Resolve a command label (case-insensitive) to a field
    pub fn from_label(label: &str) -> Option<Field> {
        match label.to_ascii_lowercase().as_str() {
            "portname" => Some(Field::PortName),
            "baudrate" => Some(Field::BaudRate),
            "databits" => Some(Field::DataBits),
            "parity" => Some(Field::Parity),
            "stopbits" => Some(Field::StopBits),
            "handshake" => Some(Field::Handshake),
            "timeout" => Some(Field::Timeout),
            "loginterval" => Some(Field::LogInterval),
            _ => None,
        }
    }

    /// The canonical command label for this field
    pub fn label(&self) -> &'static str {
        match self {
            Field::PortName => "portname",
            Field::BaudRate => "baudrate",
            Field::DataBits => "databits",
            Field::Parity => "parity",
            Field::StopBits => "stopbits",
            Field::Handshake => "handshake",
            Field::Timeout => "timeout",
            Field::LogInterval => "loginterval",
        }
    }
}

// ==================== Channel Config ====================

/// Serial channel parameters plus the flush interval
///
/// Constructed once at startup from the settings store, mutated
/// field-by-field by the command interpreter, and frozen into the transport
/// when the session is armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Serial device name (e.g. "COM3", "/dev/ttyUSB0")
    pub port_name: String,

    /// Baud rate; must be one of [`BAUD_RATES`]
    pub baud_rate: u32,

    /// Parity bit setting
    pub parity: Parity,

    /// Data bits per character; must be one of [`DATA_BITS_OPTIONS`]
    pub data_bits: u8,

    /// Stop bit setting
    pub stop_bits: StopBits,

    /// Flow control setting
    pub handshake: Handshake,

    /// Blocking-read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Flush interval in milliseconds; at least [`MIN_LOG_INTERVAL_MS`]
    pub log_interval_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: DEFAULT_DATA_BITS,
            stop_bits: StopBits::One,
            handshake: Handshake::None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            log_interval_ms: DEFAULT_LOG_INTERVAL_MS,
        }
    }
}

impl ChannelConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and apply a textual value to one field.
    ///
    /// On success the field is updated. On failure the previous value is
    /// retained and the error describes the rejected input.
    pub fn set(&mut self, field: Field, value: &str) -> Result<()> {
        match field {
            Field::PortName => {
                if value.is_empty() {
                    return Err(SerialLogError::config("portname", "port name is empty"));
                }
                self.port_name = value.to_string();
            }
            Field::BaudRate => {
                let rate: u32 = value.parse().map_err(|_| {
                    SerialLogError::config("baudrate", format!("'{}' is not an integer", value))
                })?;
                if !BAUD_RATES.contains(&rate) {
                    return Err(SerialLogError::config(
                        "baudrate",
                        format!("{} is not an available baud rate", rate),
                    ));
                }
                self.baud_rate = rate;
            }
            Field::DataBits => {
                let bits: u8 = value.parse().map_err(|_| {
                    SerialLogError::config("databits", format!("'{}' is not an integer", value))
                })?;
                if !DATA_BITS_OPTIONS.contains(&bits) {
                    return Err(SerialLogError::config(
                        "databits",
                        format!("{} is not one of 5, 6, 7, 8", bits),
                    ));
                }
                self.data_bits = bits;
            }
            Field::Parity => self.parity = value.parse()?,
            Field::StopBits => self.stop_bits = value.parse()?,
            Field::Handshake => self.handshake = value.parse()?,
            Field::Timeout => {
                let ms: u64 = value.parse().map_err(|_| {
                    SerialLogError::config("timeout", format!("'{}' is not an integer", value))
                })?;
                if ms == 0 {
                    return Err(SerialLogError::config("timeout", "timeout must be nonzero"));
                }
                self.read_timeout_ms = ms;
            }
            Field::LogInterval => {
                let ms: u64 = value.parse().map_err(|_| {
                    SerialLogError::config("loginterval", format!("'{}' is not an integer", value))
                })?;
                if ms < MIN_LOG_INTERVAL_MS {
                    return Err(SerialLogError::config(
                        "loginterval",
                        format!("interval must be at least {} ms", MIN_LOG_INTERVAL_MS),
                    ));
                }
                self.log_interval_ms = ms;
            }
        }
        Ok(())
    }

    /// Display value of one field, as shown in the settings banner
    pub fn display_value(&self, field: Field) -> String {
        match field {
            Field::PortName => self.port_name.clone(),
            Field::BaudRate => self.baud_rate.to_string(),
            Field::DataBits => self.data_bits.to_string(),
            Field::Parity => self.parity.to_string(),
            Field::StopBits => self.stop_bits.to_string(),
            Field::Handshake => self.handshake.to_string(),
            Field::Timeout => self.read_timeout_ms.to_string(),
            Field::LogInterval => self.log_interval_ms.to_string(),
        }
    }

    /// Whether a field still holds its default value (banner `(default)` tag)
    pub fn is_default(&self, field: Field) -> bool {
        let defaults = ChannelConfig::default();
        match field {
            Field::PortName => self.port_name.eq_ignore_ascii_case(&defaults.port_name),
            Field::BaudRate => self.baud_rate == defaults.baud_rate,
            Field::DataBits => self.data_bits == defaults.data_bits,
            Field::Parity => self.parity == defaults.parity,
            Field::StopBits => self.stop_bits == defaults.stop_bits,
            Field::Handshake => self.handshake == defaults.handshake,
            Field::Timeout => self.read_timeout_ms == defaults.read_timeout_ms,
            Field::LogInterval => self.log_interval_ms == defaults.log_interval_ms,
        }
    }
}
