//! # SerialLog: interactive serial data-capture utility
//!
//! Opens a serial channel, continuously ingests incoming lines on a
//! background reader thread, and periodically persists the most recent
//! payload to a timestamped log file. A live command interpreter lets the
//! operator inspect and mutate the channel parameters (baud rate, parity,
//! data bits, stop bits, flow control, read timeout, flush interval) before
//! streaming starts, persisting changes to a settings store.
//!
//! ## Architecture
//!
//! - **Session**: the [`session::SessionController`] owns the channel state
//!   machine (configuring → armed → streaming), the transport handle, the
//!   background [`session::ReaderLoop`] and the periodic
//!   [`session::FlushTimer`]
//! - **Sampling**: reader and flusher share a single most-recent-value cell
//!   ([`session::LatestSample`]): a deliberate lossy sampling channel, not
//!   a queue
//! - **Transport**: the [`transport::Transport`] trait seam over the
//!   `serialport` crate, with a scripted mock for tests
//! - **Console**: the [`console::CommandInterpreter`] read-eval loop and
//!   styled operator output via crossterm
//!
//! ## Configuration
//!
//! Settings persist as TOML in the platform-appropriate data directory under
//! `seriallog-rs`:
//!
//! - **Linux**: `~/.local/share/seriallog-rs/settings.toml`
//! - **macOS**: `~/Library/Application Support/seriallog-rs/settings.toml`
//! - **Windows**: `%APPDATA%\seriallog-rs\settings.toml`
//!
//! Captured data lands in `datalogs/<startup-timestamp>.txt` below the
//! working directory, one `[timestamp] payload` record per flush.
//!
//! ## Example
//!
//! ```ignore
//! use seriallog_rs::{
//!     config::SettingsStore,
//!     session::SessionController,
//!     transport::SerialTransport,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = SettingsStore::at_default_location()?;
//!     let mut session =
//!         SessionController::new(store, Box::new(SerialTransport::new()), "datalogs");
//!
//!     session.configure();
//!     let outcome = session.run_interpreter(&mut std::io::stdin().lock())?;
//!     if outcome.is_start() {
//!         session.arm()?;
//!         session.stream_until_reader_exits()?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{ChannelConfig, Field, Handshake, Parity, SettingsStore, StopBits};
pub use error::{Result, SerialLogError};
pub use session::{SessionController, SessionState};
pub use transport::{SerialTransport, Transport};
