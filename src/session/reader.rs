//! Background reader loop
//!
//! A dedicated thread performing blocking line reads on the open transport
//! and publishing each decoded line into the shared [`LatestSample`] cell.
//!
//! Cancellation is cooperative: the loop checks a continuation flag once per
//! iteration, and each blocking read is bounded by the transport's
//! configured read timeout, so the loop reacts to a stop signal within one
//! timeout window. Raising `timeout` toward "effectively infinite" makes
//! shutdown correspondingly slower; the two settings are coupled.
//!
//! A read timeout is an expected steady-state condition and leaves the loop
//! running. Any other transport error ends the loop; the error is carried
//! out through [`ReaderLoop::join`] so the controller can surface it.

use crate::error::Result;
use crate::session::buffer::LatestSample;
use crate::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Handle to the running reader thread
pub struct ReaderLoop {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<(Box<dyn Transport>, Result<()>)>,
}

impl ReaderLoop {
    /// Spawn the reader thread over an already-open transport
    pub fn spawn(transport: Box<dyn Transport>, buffer: Arc<LatestSample>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || run(transport, buffer, stop_flag))
            .expect("failed to spawn reader thread");

        Self { stop, handle }
    }

    /// Signal the loop to stop at its next iteration
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether the loop has already terminated (e.g. on a fatal error)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to terminate, recovering the transport and the
    /// loop's outcome.
    ///
    /// Returns `Ok(())` when the loop ended because of a stop signal and the
    /// fatal transport error otherwise.
    pub fn join(self) -> (Box<dyn Transport>, Result<()>) {
        self.handle
            .join()
            .expect("reader thread panicked")
    }

    /// Signal and join in one step
    pub fn stop(self) -> (Box<dyn Transport>, Result<()>) {
        self.signal_stop();
        self.join()
    }
}

/// The loop body: read, publish, repeat until signaled or broken
fn run(
    mut transport: Box<dyn Transport>,
    buffer: Arc<LatestSample>,
    stop: Arc<AtomicBool>,
) -> (Box<dyn Transport>, Result<()>) {
    tracing::info!("Reader loop started on {}", transport.port_name());

    let mut outcome = Ok(());
    while !stop.load(Ordering::SeqCst) {
        match transport.read_line() {
            Ok(line) => buffer.publish(line),
            Err(e) if e.is_timeout() => {
                // No data inside the timeout window; not an error
            }
            Err(e) => {
                tracing::error!("Reader loop terminated: {}", e);
                outcome = Err(e);
                break;
            }
        }
    }

    tracing::info!("Reader loop stopped");
    (transport, outcome)
}
