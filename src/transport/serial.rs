//! Serial device transport backed by the `serialport` crate
//!
//! Owns the open/close lifecycle of one `serialport` handle and adapts the
//! crate's byte-oriented reads to the line-oriented [`Transport`] contract.
//! A carry buffer preserves partially received lines across read timeouts,
//! so a slow sender never loses the head of a line.

use crate::config::{ChannelConfig, Handshake, Parity, StopBits};
use crate::error::{Result, SerialLogError};
use crate::transport::Transport;
use serialport::{DataBits, FlowControl, Parity as SpParity, SerialPort, StopBits as SpStopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Chunk size for reads from the device
const READ_CHUNK: usize = 256;

/// Real serial channel transport
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
    /// Bytes received after the last complete line
    carry: Vec<u8>,
}

impl SerialTransport {
    /// Create a transport with no open channel
    pub fn new() -> Self {
        Self {
            port: None,
            port_name: String::new(),
            carry: Vec::new(),
        }
    }

    /// Split the first complete line out of the carry buffer, if any
    fn take_line(&mut self) -> Option<String> {
        let pos = self.carry.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.carry.drain(..=pos).collect();
        line.pop(); // The '\n' itself
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, config: &ChannelConfig) -> Result<()> {
        let builder = serialport::new(&config.port_name, config.baud_rate)
            .data_bits(to_serialport_data_bits(config.data_bits))
            .parity(to_serialport_parity(config.parity, &config.port_name)?)
            .stop_bits(to_serialport_stop_bits(config.stop_bits, &config.port_name)?)
            .flow_control(to_serialport_flow_control(
                config.handshake,
                &config.port_name,
            )?)
            .timeout(Duration::from_millis(config.read_timeout_ms));

        let port = builder
            .open()
            .map_err(|e| SerialLogError::open(&config.port_name, e.to_string()))?;

        tracing::info!(
            "Opened {} at {} baud ({} data bits, {} parity, {} stop bits, {} handshake)",
            config.port_name,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits,
            config.handshake
        );

        self.port = Some(port);
        self.port_name = config.port_name.clone();
        self.carry.clear();
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!("Closed {}", self.port_name);
        }
        self.carry.clear();
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read_line(&mut self) -> Result<String> {
        // A full line may already be buffered from a previous chunk
        if let Some(line) = self.take_line() {
            return Ok(line);
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let port = self
                .port
                .as_mut()
                .ok_or_else(|| SerialLogError::Transport("channel is not open".to_string()))?;
            match port.read(&mut chunk) {
                Ok(0) => {
                    return Err(SerialLogError::Transport(
                        "channel closed by the device".to_string(),
                    ));
                }
                Ok(n) => {
                    self.carry.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    // Expected idle condition; partial data stays in the carry
                    return Err(SerialLogError::TransportTimeout);
                }
                Err(e) => return Err(SerialLogError::Transport(e.to_string())),
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| SerialLogError::Transport("channel is not open".to_string()))?;

        match port.write_all(data) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                Err(SerialLogError::TransportTimeout)
            }
            Err(e) => Err(SerialLogError::Transport(e.to_string())),
        }
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

// ==================== Conversion Functions ====================

/// Convert a data bit count to the serialport crate's type
fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert our parity setting to the serialport crate's type.
///
/// `Mark` and `Space` are valid configuration values but have no serialport
/// counterpart; opening a channel with them fails here.
fn to_serialport_parity(parity: Parity, port: &str) -> Result<SpParity> {
    match parity {
        Parity::None => Ok(SpParity::None),
        Parity::Odd => Ok(SpParity::Odd),
        Parity::Even => Ok(SpParity::Even),
        Parity::Mark | Parity::Space => Err(SerialLogError::open(
            port,
            format!("{} parity is not supported by this serial backend", parity),
        )),
    }
}

/// Convert our stop bit setting to the serialport crate's type
fn to_serialport_stop_bits(stop_bits: StopBits, port: &str) -> Result<SpStopBits> {
    match stop_bits {
        StopBits::One => Ok(SpStopBits::One),
        StopBits::Two => Ok(SpStopBits::Two),
        StopBits::None | StopBits::OnePointFive => Err(SerialLogError::open(
            port,
            format!(
                "{} stop bits are not supported by this serial backend",
                stop_bits
            ),
        )),
    }
}

/// Convert our handshake setting to the serialport crate's flow control type
fn to_serialport_flow_control(handshake: Handshake, port: &str) -> Result<FlowControl> {
    match handshake {
        Handshake::None => Ok(FlowControl::None),
        Handshake::XOnXOff => Ok(FlowControl::Software),
        Handshake::RequestToSend => Ok(FlowControl::Hardware),
        Handshake::RequestToSendXOnXOff => Err(SerialLogError::open(
            port,
            "combined hardware/software flow control is not supported by this serial backend",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Field;

    #[test]
    fn test_data_bits_conversion() {
        assert!(matches!(to_serialport_data_bits(5), DataBits::Five));
        assert!(matches!(to_serialport_data_bits(6), DataBits::Six));
        assert!(matches!(to_serialport_data_bits(7), DataBits::Seven));
        assert!(matches!(to_serialport_data_bits(8), DataBits::Eight));
    }

    #[test]
    fn test_parity_conversion() {
        assert!(matches!(
            to_serialport_parity(Parity::None, "COM1").unwrap(),
            SpParity::None
        ));
        assert!(matches!(
            to_serialport_parity(Parity::Odd, "COM1").unwrap(),
            SpParity::Odd
        ));
        assert!(matches!(
            to_serialport_parity(Parity::Even, "COM1").unwrap(),
            SpParity::Even
        ));
        assert!(to_serialport_parity(Parity::Mark, "COM1").is_err());
        assert!(to_serialport_parity(Parity::Space, "COM1").is_err());
    }

    #[test]
    fn test_stop_bits_conversion() {
        assert!(matches!(
            to_serialport_stop_bits(StopBits::One, "COM1").unwrap(),
            SpStopBits::One
        ));
        assert!(matches!(
            to_serialport_stop_bits(StopBits::Two, "COM1").unwrap(),
            SpStopBits::Two
        ));
        assert!(to_serialport_stop_bits(StopBits::None, "COM1").is_err());
        assert!(to_serialport_stop_bits(StopBits::OnePointFive, "COM1").is_err());
    }

    #[test]
    fn test_flow_control_conversion() {
        assert!(matches!(
            to_serialport_flow_control(Handshake::None, "COM1").unwrap(),
            FlowControl::None
        ));
        assert!(matches!(
            to_serialport_flow_control(Handshake::XOnXOff, "COM1").unwrap(),
            FlowControl::Software
        ));
        assert!(matches!(
            to_serialport_flow_control(Handshake::RequestToSend, "COM1").unwrap(),
            FlowControl::Hardware
        ));
        assert!(to_serialport_flow_control(Handshake::RequestToSendXOnXOff, "COM1").is_err());
    }

    #[test]
    fn test_open_nonexistent_port_fails() {
        let mut transport = SerialTransport::new();
        let mut config = ChannelConfig::default();
        config
            .set(Field::PortName, "/dev/ttyDOESNOTEXIST99")
            .unwrap();

        let err = transport.open(&config).unwrap_err();
        assert!(matches!(err, SerialLogError::TransportOpen { .. }));
        assert!(!transport.is_open());
    }

    #[test]
    fn test_read_line_on_closed_channel_is_fatal() {
        let mut transport = SerialTransport::new();
        let err = transport.read_line().unwrap_err();
        assert!(matches!(err, SerialLogError::Transport(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_take_line_strips_crlf() {
        let mut transport = SerialTransport::new();
        transport.carry = b"hello\r\nworld\n".to_vec();
        assert_eq!(transport.take_line().unwrap(), "hello");
        assert_eq!(transport.take_line().unwrap(), "world");
        assert!(transport.take_line().is_none());
    }

    #[test]
    fn test_take_line_keeps_partial() {
        let mut transport = SerialTransport::new();
        transport.carry = b"partial".to_vec();
        assert!(transport.take_line().is_none());
        assert_eq!(transport.carry, b"partial");
    }
}
