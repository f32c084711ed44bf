//! Mock transport for testing without a serial device
//!
//! Plays back a scripted sequence of read outcomes (lines, timeouts, and
//! fatal errors) through the [`Transport`] interface, honoring the
//! configured read timeout so cancellation-latency tests are meaningful.
//!
//! The script is shared: clone the [`MockScript`] handle before handing the
//! transport to the session, then push outcomes while the reader loop is
//! running.
//!
//! # Enabling
//!
//! Available in unit tests and when the `mock-transport` feature is enabled:
//!
//! ```bash
//! cargo test --features mock-transport
//! ```

use crate::config::ChannelConfig;
use crate::error::{Result, SerialLogError};
use crate::transport::Transport;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted read outcome
#[derive(Debug, Clone)]
pub enum MockRead {
    /// A decoded line arrives
    Line(String),
    /// The read times out after the configured timeout window
    Timeout,
    /// A fatal transport failure
    Fatal(String),
}

/// Shared handle to a mock transport's pending read outcomes
#[derive(Debug, Clone, Default)]
pub struct MockScript(Arc<Mutex<VecDeque<MockRead>>>);

impl MockScript {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line delivery
    pub fn push_line(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push_back(MockRead::Line(line.into()));
    }

    /// Queue a read timeout
    pub fn push_timeout(&self) {
        self.0.lock().unwrap().push_back(MockRead::Timeout);
    }

    /// Queue a fatal transport failure
    pub fn push_fatal(&self, message: impl Into<String>) {
        self.0
            .lock()
            .unwrap()
            .push_back(MockRead::Fatal(message.into()));
    }

    /// Whether all queued outcomes have been consumed
    pub fn is_drained(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    fn pop(&self) -> Option<MockRead> {
        self.0.lock().unwrap().pop_front()
    }
}

/// Scripted transport implementing the [`Transport`] contract
pub struct MockTransport {
    script: MockScript,
    open: bool,
    read_timeout: Duration,
    /// When set, `open` fails with this message
    fail_open: Option<String>,
    /// Configuration frozen in at `open`
    opened_with: Option<ChannelConfig>,
    /// Bytes written through the transport, in write order
    written: Vec<u8>,
    port_name: String,
}

impl MockTransport {
    /// Create a mock with an empty script
    pub fn new() -> Self {
        Self {
            script: MockScript::new(),
            open: false,
            read_timeout: Duration::from_millis(50),
            fail_open: None,
            opened_with: None,
            written: Vec::new(),
            port_name: String::new(),
        }
    }

    /// Shared handle to this mock's script
    pub fn script(&self) -> MockScript {
        self.script.clone()
    }

    /// Make `open` fail with the given message
    pub fn with_open_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_open = Some(message.into());
        self
    }

    /// The configuration the channel was opened with, if any
    pub fn opened_with(&self) -> Option<&ChannelConfig> {
        self.opened_with.as_ref()
    }

    /// Everything written through the transport so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, config: &ChannelConfig) -> Result<()> {
        if let Some(ref message) = self.fail_open {
            return Err(SerialLogError::open(&config.port_name, message.clone()));
        }
        self.open = true;
        self.read_timeout = Duration::from_millis(config.read_timeout_ms);
        self.port_name = config.port_name.clone();
        self.opened_with = Some(config.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_line(&mut self) -> Result<String> {
        if !self.open {
            return Err(SerialLogError::Transport("channel is not open".to_string()));
        }
        match self.script.pop() {
            Some(MockRead::Line(line)) => Ok(line),
            Some(MockRead::Fatal(message)) => Err(SerialLogError::Transport(message)),
            Some(MockRead::Timeout) | None => {
                // An idle device: block for the timeout window, then signal it
                std::thread::sleep(self.read_timeout);
                Err(SerialLogError::TransportTimeout)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(SerialLogError::Transport("channel is not open".to_string()));
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_reads() {
        let mut mock = MockTransport::new();
        let script = mock.script();
        script.push_line("A");
        script.push_timeout();
        script.push_fatal("device unplugged");

        mock.open(&ChannelConfig::default()).unwrap();
        assert!(mock.is_open());

        assert_eq!(mock.read_line().unwrap(), "A");
        assert!(mock.read_line().unwrap_err().is_timeout());

        let err = mock.read_line().unwrap_err();
        assert!(matches!(err, SerialLogError::Transport(_)));
        assert!(script.is_drained());
    }

    #[test]
    fn test_empty_script_times_out() {
        let mut mock = MockTransport::new();
        mock.open(&ChannelConfig::default()).unwrap();
        assert!(mock.read_line().unwrap_err().is_timeout());
    }

    #[test]
    fn test_open_failure() {
        let mut mock = MockTransport::new().with_open_failure("device busy");
        let err = mock.open(&ChannelConfig::default()).unwrap_err();
        assert!(matches!(err, SerialLogError::TransportOpen { .. }));
        assert!(!mock.is_open());
    }

    #[test]
    fn test_writes_captured() {
        let mut mock = MockTransport::new();
        assert!(mock.write(b"early").is_err()); // Closed channel rejects writes

        mock.open(&ChannelConfig::default()).unwrap();
        mock.write(b"ping\n").unwrap();
        assert_eq!(mock.written(), b"ping\n");
    }

    #[test]
    fn test_open_freezes_config() {
        let mut mock = MockTransport::new();
        let mut config = ChannelConfig::default();
        config.port_name = "MOCK0".to_string();
        mock.open(&config).unwrap();

        assert_eq!(mock.opened_with().unwrap().port_name, "MOCK0");
        assert_eq!(mock.port_name(), "MOCK0");
    }
}
