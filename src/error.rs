//! Error handling for the SerialLog application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application. The variants follow the error taxonomy of
//! the capture flow: configuration input errors recover locally, transport
//! timeouts are expected steady state, and only "other" transport failures
//! terminate the reader loop.

use thiserror::Error;

/// Main error type for SerialLog operations
#[derive(Error, Debug)]
pub enum SerialLogError {
    /// Invalid operator input for a configuration field
    #[error("Invalid value for {field}: {message}")]
    Config { field: String, message: String },

    /// The serial channel could not be opened
    #[error("Failed to open {port}: {message}")]
    TransportOpen { port: String, message: String },

    /// No data arrived within the configured read timeout.
    ///
    /// This is an expected steady-state condition of the reader loop, not a
    /// failure; callers suppress it and continue.
    #[error("Read timed out")]
    TransportTimeout,

    /// Any other transport failure; terminates the reader loop
    #[error("Transport error: {0}")]
    Transport(String),

    /// Appending a record to the data log file failed
    #[error("Failed to write data log: {0}")]
    LogWrite(String),

    /// Errors related to the settings store (load/save/parse)
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerialLogError {
    /// Create a config error for a named field
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        SerialLogError::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a transport-open error for a named port
    pub fn open(port: impl Into<String>, message: impl Into<String>) -> Self {
        SerialLogError::TransportOpen {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the expected read-timeout condition
    pub fn is_timeout(&self) -> bool {
        matches!(self, SerialLogError::TransportTimeout)
    }
}

/// Result type alias for SerialLog operations
pub type Result<T> = std::result::Result<T, SerialLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SerialLogError::config("baudrate", "not a number");
        assert_eq!(err.to_string(), "Invalid value for baudrate: not a number");
    }

    #[test]
    fn test_timeout_is_timeout() {
        assert!(SerialLogError::TransportTimeout.is_timeout());
        assert!(!SerialLogError::Transport("device gone".to_string()).is_timeout());
    }

    #[test]
    fn test_open_error_names_port() {
        let err = SerialLogError::open("COM7", "device busy");
        assert!(err.to_string().contains("COM7"));
        assert!(err.to_string().contains("device busy"));
    }
}
