//! Transport layer for the serial channel
//!
//! This module defines the [`Transport`] trait behind which the session
//! engine runs, so the reader loop is testable without hardware:
//!
//! - [`SerialTransport`] - Real serial device via the `serialport` crate
//! - [`MockTransport`] - Scripted transport for tests (feature `mock-transport`)
//!
//! The trait models the raw byte-transport primitive of the capture flow:
//! open/close lifecycle, and a blocking line read bounded by the configured
//! read timeout. A timeout surfaces as [`SerialLogError::TransportTimeout`]
//! so callers can treat it as an expected no-op; any other read failure is
//! fatal to the reader loop.
//!
//! [`SerialLogError::TransportTimeout`]: crate::error::SerialLogError::TransportTimeout

pub mod serial;

#[cfg(any(test, feature = "mock-transport"))]
pub mod mock;

pub use serial::SerialTransport;

#[cfg(any(test, feature = "mock-transport"))]
pub use mock::{MockScript, MockTransport};

use crate::config::ChannelConfig;
use crate::error::Result;

/// Raw line-oriented transport over one serial channel
///
/// Implementations must be `Send` so the session controller can hand the
/// open transport to the reader thread.
pub trait Transport: Send {
    /// Open the channel with the given configuration.
    ///
    /// The configuration is frozen into the device at this point; later
    /// mutation of a [`ChannelConfig`] has no effect on an open channel.
    fn open(&mut self, config: &ChannelConfig) -> Result<()>;

    /// Close the channel. Closing a closed channel is a no-op.
    fn close(&mut self);

    /// Whether the channel is currently open
    fn is_open(&self) -> bool;

    /// Blocking read of one decoded line, bounded by the configured read
    /// timeout.
    ///
    /// Returns [`SerialLogError::TransportTimeout`] when no complete line
    /// arrived within the timeout window; partial data is retained for the
    /// next call.
    ///
    /// [`SerialLogError::TransportTimeout`]: crate::error::SerialLogError::TransportTimeout
    fn read_line(&mut self) -> Result<String>;

    /// Write raw bytes to the channel
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Name of the configured device, for diagnostics
    fn port_name(&self) -> &str;
}

/// Enumerate the serial ports currently present on the system
pub fn available_port_names() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
