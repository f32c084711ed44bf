//! Periodic flush timer and the data log file it owns
//!
//! The flush timer runs on its own thread with a wall-clock periodic
//! cadence: each tick samples the shared [`LatestSample`] cell and appends
//! one timestamped record to the data log, echoing the same record to the
//! operator console. The cadence is driven by `recv_deadline` on a stop
//! channel, so ticks stay on schedule independent of how long a flush takes
//! and the timer can be stopped promptly.
//!
//! A failed append is surfaced to the operator but never stops the timer;
//! each tick is an independent append and the next one retries on its own.
//! Ticks before the first payload has ever arrived are no-ops, which keeps
//! log file creation lazy.

use crate::console;
use crate::error::{Result, SerialLogError};
use crate::session::buffer::LatestSample;
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Timestamp format used for record stamps and the file header
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Timestamp format used for log file names
pub const FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Append-only data log named from the session-start timestamp.
///
/// The file (and its directory) is created lazily on the first append, with
/// a header comment recording the creation time. The descriptor is not held
/// across ticks; each append opens, writes and closes.
#[derive(Debug)]
pub struct DataLogFile {
    path: PathBuf,
    created: bool,
}

impl DataLogFile {
    /// Plan a log file under `dir`, named from `started_at`
    pub fn new(dir: impl AsRef<Path>, started_at: DateTime<Local>) -> Self {
        let name = format!("{}.txt", started_at.format(FILE_NAME_TIMESTAMP_FORMAT));
        Self {
            path: dir.as_ref().join(name),
            created: false,
        }
    }

    /// Path the records are appended to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `[timestamp] payload` record, creating the file (with its
    /// header line) on first use.
    pub fn append(&mut self, timestamp: DateTime<Local>, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SerialLogError::LogWrite(format!("{:?}: {}", parent, e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SerialLogError::LogWrite(format!("{:?}: {}", self.path, e)))?;

        if !self.created {
            writeln!(
                file,
                "# Data capture started {}",
                timestamp.format(RECORD_TIMESTAMP_FORMAT)
            )
            .map_err(|e| SerialLogError::LogWrite(e.to_string()))?;
            self.created = true;
            tracing::info!("Data log created at {:?}", self.path);
        }

        writeln!(
            file,
            "[{}] {}",
            timestamp.format(RECORD_TIMESTAMP_FORMAT),
            payload
        )
        .map_err(|e| SerialLogError::LogWrite(e.to_string()))
    }
}

/// Handle to the running flush timer thread
pub struct FlushTimer {
    stop_tx: Sender<()>,
    handle: JoinHandle<DataLogFile>,
}

impl FlushTimer {
    /// Spawn the timer with a fixed period.
    ///
    /// The period is latched here; a later configuration change takes effect
    /// only on the next session start.
    pub fn spawn(buffer: Arc<LatestSample>, log: DataLogFile, period: Duration) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("flush-timer".to_string())
            .spawn(move || {
                tracing::info!("Flush timer started ({:?} period)", period);
                let mut log = log;
                let mut next_tick = Instant::now() + period;
                loop {
                    match stop_rx.recv_deadline(next_tick) {
                        Err(RecvTimeoutError::Timeout) => {
                            // Re-arm on the wall clock, not after the flush
                            next_tick += period;
                            flush_once(&buffer, &mut log);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::info!("Flush timer stopped");
                log
            })
            .expect("failed to spawn flush timer thread");

        Self { stop_tx, handle }
    }

    /// Stop the timer and recover the log file handle
    pub fn stop(self) -> DataLogFile {
        let _ = self.stop_tx.send(());
        self.handle.join().expect("flush timer thread panicked")
    }
}

/// One tick: sample the cell and append the trimmed payload
fn flush_once(buffer: &LatestSample, log: &mut DataLogFile) {
    let Some(sample) = buffer.take_latest() else {
        // Nothing has ever arrived; leave the file uncreated
        return;
    };

    let now = Local::now();
    let payload = sample.payload.trim();
    match log.append(now, payload) {
        Ok(()) => console::echo_record(&now.format(RECORD_TIMESTAMP_FORMAT).to_string(), payload),
        Err(e) => console::error_line(&e.to_string()),
    }
}
