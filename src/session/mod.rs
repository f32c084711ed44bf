//! Session engine: channel lifecycle, reader loop, flush timer
//!
//! This module owns the concurrency of the capture flow. The
//! [`SessionController`] is the single authority over the channel state
//! machine (configuring → armed → streaming) and the only owner of the
//! transport handle; the two background units never share mutable state
//! beyond the [`LatestSample`] cell:
//!
//! - [`ReaderLoop`] - dedicated thread doing blocking timeout-bounded reads,
//!   publishing the latest decoded line into the cell
//! - [`FlushTimer`] - periodic thread sampling the cell and appending to the
//!   data log
//!
//! Once streaming begins there is no supported transition back to
//! configuring; the interactive flow runs until the process is terminated or
//! the reader loop dies on a fatal transport error. [`SessionController::shutdown`]
//! exists for orderly teardown (exercised by tests).
//!
//! # Example
//!
//! ```ignore
//! use seriallog_rs::config::SettingsStore;
//! use seriallog_rs::session::SessionController;
//! use seriallog_rs::transport::SerialTransport;
//!
//! let store = SettingsStore::at_default_location()?;
//! let mut session = SessionController::new(store, Box::new(SerialTransport::new()), "datalogs");
//! session.configure();
//! if session.run_interpreter(&mut std::io::stdin().lock())?.is_start() {
//!     session.arm()?;
//!     session.stream_until_reader_exits()?;
//! }
//! ```

pub mod buffer;
pub mod flusher;
pub mod reader;

pub use buffer::{LatestSample, Sample};
pub use flusher::{DataLogFile, FlushTimer};
pub use reader::ReaderLoop;

use crate::config::{ChannelConfig, SettingsStore};
use crate::console::{self, CommandInterpreter, InterpreterOutcome};
use crate::error::Result;
use crate::transport::Transport;
use chrono::Local;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Channel lifecycle state. The controller is the sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Interpreter is accepting `/set` and `/help`
    Configuring,
    /// `/start` was issued; parameters are frozen, interpreter has exited
    Armed,
    /// Reader loop and flush timer are active. Terminal.
    Streaming,
}

/// Orchestrates the transport, the reader loop and the flush timer
pub struct SessionController {
    store: SettingsStore,
    config: ChannelConfig,
    state: SessionState,
    /// Present while not streaming; moves into the reader thread on arm
    transport: Option<Box<dyn Transport>>,
    buffer: Arc<LatestSample>,
    reader: Option<ReaderLoop>,
    flusher: Option<FlushTimer>,
    log_dir: PathBuf,
}

impl SessionController {
    /// Create a controller over a settings store and a closed transport
    pub fn new(
        store: SettingsStore,
        transport: Box<dyn Transport>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            config: ChannelConfig::default(),
            state: SessionState::Configuring,
            transport: Some(transport),
            buffer: Arc::new(LatestSample::new()),
            reader: None,
            flusher: None,
            log_dir: log_dir.into(),
        }
    }

    /// Load and validate the stored settings and show them to the operator.
    ///
    /// A missing store is default-populated; an unreadable one falls back to
    /// defaults with a logged warning.
    pub fn configure(&mut self) -> &ChannelConfig {
        self.config = self.store.load_or_default();
        tracing::info!(
            "Configured: port={}, baud={}, parity={}, data_bits={}, stop_bits={}, \
             handshake={}, read_timeout={}ms, log_interval={}ms",
            self.config.port_name,
            self.config.baud_rate,
            self.config.parity,
            self.config.data_bits,
            self.config.stop_bits,
            self.config.handshake,
            self.config.read_timeout_ms,
            self.config.log_interval_ms
        );
        console::show_settings(&self.config);
        &self.config
    }

    /// Block on the command interpreter until `/start` or end of input.
    ///
    /// On `/start` the session transitions to [`SessionState::Armed`].
    pub fn run_interpreter(&mut self, input: &mut impl BufRead) -> Result<InterpreterOutcome> {
        assert!(
            self.state == SessionState::Configuring,
            "interpreter is only available while configuring"
        );

        let outcome = CommandInterpreter::new(&mut self.config, &self.store).run(input)?;
        if outcome.is_start() {
            self.state = SessionState::Armed;
            tracing::info!("Session armed");
        }
        Ok(outcome)
    }

    /// Open the transport with the frozen configuration and start the
    /// reader loop and the flush timer.
    ///
    /// On an open failure the error is returned and nothing is started; the
    /// data log file is never created.
    pub fn arm(&mut self) -> Result<()> {
        assert!(
            self.state != SessionState::Streaming,
            "session is already streaming"
        );

        let mut transport = self
            .transport
            .take()
            .expect("transport already taken");

        if let Err(e) = transport.open(&self.config) {
            self.transport = Some(transport);
            return Err(e);
        }

        let log = DataLogFile::new(&self.log_dir, Local::now());
        tracing::info!("Data log will be written to {:?}", log.path());

        self.reader = Some(ReaderLoop::spawn(transport, self.buffer.clone()));
        self.flusher = Some(FlushTimer::spawn(
            self.buffer.clone(),
            log,
            Duration::from_millis(self.config.log_interval_ms),
        ));
        self.state = SessionState::Streaming;

        console::status_line("SerialLog started. Reading incoming data...");
        tracing::info!("Session streaming");
        Ok(())
    }

    /// Block until the reader loop terminates, then tear down.
    ///
    /// In the healthy steady state this never returns: the reader runs
    /// until the process is terminated. It returns only when the loop dies
    /// on a fatal transport error, which is passed back to the caller after
    /// the flush timer is stopped and the transport closed.
    pub fn stream_until_reader_exits(&mut self) -> Result<()> {
        let reader = self
            .reader
            .take()
            .expect("session is not streaming");

        let (mut transport, outcome) = reader.join();
        transport.close();
        self.transport = Some(transport);

        if let Some(flusher) = self.flusher.take() {
            flusher.stop();
        }

        outcome
    }

    /// Orderly teardown: stop the flush timer, signal the reader, join it,
    /// close the transport.
    ///
    /// Returns the reader loop's outcome. The interactive flow never calls
    /// this once streaming begins; it exists for orderly teardown and tests.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(flusher) = self.flusher.take() {
            flusher.stop();
        }

        let outcome = match self.reader.take() {
            Some(reader) => {
                let (mut transport, outcome) = reader.stop();
                transport.close();
                self.transport = Some(transport);
                outcome
            }
            None => Ok(()),
        };

        tracing::info!("Session shut down");
        outcome
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The live configuration
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// The shared latest-value cell (for observation in tests)
    pub fn buffer(&self) -> Arc<LatestSample> {
        self.buffer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Field;
    use crate::error::SerialLogError;
    use crate::transport::MockTransport;
    use std::io::Cursor;
    use std::time::Duration;
    use tempfile::TempDir;

    fn controller_with_mock(dir: &TempDir) -> (SessionController, crate::transport::MockScript) {
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        let mock = MockTransport::new();
        let script = mock.script();
        let controller =
            SessionController::new(store, Box::new(mock), dir.path().join("datalogs"));
        (controller, script)
    }

    fn data_log_records(dir: &TempDir) -> Vec<String> {
        let logs = dir.path().join("datalogs");
        let mut entries: Vec<_> = std::fs::read_dir(&logs)
            .map(|rd| rd.filter_map(|e| e.ok()).collect())
            .unwrap_or_default();
        assert_eq!(entries.len(), 1, "expected exactly one data log file");
        let entry = entries.pop().unwrap();
        std::fs::read_to_string(entry.path())
            .unwrap()
            .lines()
            .filter(|l| l.starts_with('['))
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_state_machine_happy_path() {
        let dir = TempDir::new().unwrap();
        let (mut session, _script) = controller_with_mock(&dir);
        assert_eq!(session.state(), SessionState::Configuring);

        session.configure();
        assert_eq!(session.state(), SessionState::Configuring);

        let mut input = Cursor::new("/set loginterval 200\n/start\n");
        let outcome = session.run_interpreter(&mut input).unwrap();
        assert!(outcome.is_start());
        assert_eq!(session.state(), SessionState::Armed);

        session.arm().unwrap();
        assert_eq!(session.state(), SessionState::Streaming);

        session.shutdown().unwrap();
    }

    #[test]
    fn test_streaming_flushes_latest_line() {
        let dir = TempDir::new().unwrap();
        let (mut session, script) = controller_with_mock(&dir);

        session.configure();
        let mut input = Cursor::new("/set loginterval 200\n/set timeout 20\n/start\n");
        session.run_interpreter(&mut input).unwrap();

        // Two lines in quick succession, then silence
        script.push_line("A");
        script.push_line("B");

        session.arm().unwrap();

        // Two flush periods: one tick for "B", one stale re-log of "B"
        std::thread::sleep(Duration::from_millis(520));
        session.shutdown().unwrap();

        let records = data_log_records(&dir);
        assert!(records.len() >= 2, "got {:?}", records);
        assert!(records.iter().all(|r| r.ends_with("] B")));
    }

    #[test]
    fn test_arm_failure_surfaces_and_creates_no_log() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        let mock = MockTransport::new().with_open_failure("no such device");
        let mut session =
            SessionController::new(store, Box::new(mock), dir.path().join("datalogs"));

        session.configure();
        let mut input = Cursor::new("/start\n");
        session.run_interpreter(&mut input).unwrap();

        let err = session.arm().unwrap_err();
        assert!(matches!(err, SerialLogError::TransportOpen { .. }));
        assert_eq!(session.state(), SessionState::Armed); // Never reached streaming
        assert!(!dir.path().join("datalogs").exists());
    }

    #[test]
    fn test_fatal_reader_error_ends_streaming() {
        let dir = TempDir::new().unwrap();
        let (mut session, script) = controller_with_mock(&dir);

        session.configure();
        let mut input = Cursor::new("/set loginterval 200\n/start\n");
        session.run_interpreter(&mut input).unwrap();

        script.push_line("only");
        script.push_fatal("device unplugged");

        session.arm().unwrap();

        let outcome = session.stream_until_reader_exits();
        match outcome {
            Err(SerialLogError::Transport(message)) => {
                assert!(message.contains("device unplugged"))
            }
            other => panic!("expected fatal transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_interpreter_mutations_frozen_at_arm() {
        let dir = TempDir::new().unwrap();
        let (mut session, _script) = controller_with_mock(&dir);

        session.configure();
        let mut input = Cursor::new("/set baudrate 115200\n/set parity odd\n/start\n");
        session.run_interpreter(&mut input).unwrap();

        assert_eq!(session.config().baud_rate, 115200);
        assert!(!session.config().is_default(Field::BaudRate));

        session.arm().unwrap();
        session.shutdown().unwrap();
    }
}
