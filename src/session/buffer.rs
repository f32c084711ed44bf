//! Single-slot latest-value cell shared between the reader and the flusher
//!
//! This is a deliberate lossy sampling channel, not a queue: the reader loop
//! overwrites the slot with every decoded line, and the flush timer samples
//! whatever is current at each tick. Lines arriving faster than the flush
//! cadence are dropped in favor of the most recent one; if nothing new
//! arrives between ticks the previous value is sampled again.

use chrono::{DateTime, Local};
use std::sync::Mutex;

/// One decoded payload and its arrival time
#[derive(Debug, Clone)]
pub struct Sample {
    /// The decoded line, as received
    pub payload: String,
    /// When the reader published it
    pub received_at: DateTime<Local>,
}

#[derive(Debug, Default)]
struct Slot {
    sample: Option<Sample>,
    fresh: bool,
}

/// Guarded single most-recent-value cell.
///
/// Exactly one producer (the reader loop) writes it and exactly one consumer
/// (the flush timer) samples it; the mutex makes each access atomic with
/// respect to the other side.
#[derive(Debug, Default)]
pub struct LatestSample {
    slot: Mutex<Slot>,
}

impl LatestSample {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cell with a newly decoded line
    pub fn publish(&self, payload: String) {
        let mut slot = self.slot.lock().unwrap();
        slot.sample = Some(Sample {
            payload,
            received_at: Local::now(),
        });
        slot.fresh = true;
    }

    /// Sample the current value, clearing its freshness but not the value.
    ///
    /// Returns `None` only before the first line has ever arrived. A stale
    /// value (nothing published since the last call) is returned again;
    /// the re-log behavior of the flush timer depends on this.
    pub fn take_latest(&self) -> Option<Sample> {
        let mut slot = self.slot.lock().unwrap();
        slot.fresh = false;
        slot.sample.clone()
    }

    /// Whether a new line has been published since the last `take_latest`
    pub fn is_fresh(&self) -> bool {
        self.slot.lock().unwrap().fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_yields_nothing() {
        let cell = LatestSample::new();
        assert!(cell.take_latest().is_none());
        assert!(!cell.is_fresh());
    }

    #[test]
    fn test_latest_wins() {
        let cell = LatestSample::new();
        cell.publish("A".to_string());
        cell.publish("B".to_string());

        // Only the most recent of the two survives
        let sample = cell.take_latest().unwrap();
        assert_eq!(sample.payload, "B");
    }

    #[test]
    fn test_stale_value_resampled() {
        let cell = LatestSample::new();
        cell.publish("B".to_string());

        assert_eq!(cell.take_latest().unwrap().payload, "B");
        assert!(!cell.is_fresh());

        // No new publish; the same value is sampled again
        assert_eq!(cell.take_latest().unwrap().payload, "B");
    }

    #[test]
    fn test_publish_refreshes() {
        let cell = LatestSample::new();
        cell.publish("A".to_string());
        assert!(cell.is_fresh());

        cell.take_latest();
        assert!(!cell.is_fresh());

        cell.publish("C".to_string());
        assert!(cell.is_fresh());
        assert_eq!(cell.take_latest().unwrap().payload, "C");
    }
}
