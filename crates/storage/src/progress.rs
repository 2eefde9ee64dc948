//! Upload Progress
//!
//! Counts transferred bytes and publishes the integer percentage on a watch channel
//! each time it moves at least `STEP` points past the last published value.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tokio::sync::watch;

const MIB: f64 = 1024.0 * 1024.0;

pub struct ProgressReporter {
    label: String,
    total: u64,
    transferred: AtomicU64,
    last_reported: AtomicU8,
    tx: watch::Sender<u8>,
}

impl ProgressReporter {
    pub const STEP: u8 = 5;

    pub fn new(label: impl Into<String>, total: u64) -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            label: label.into(),
            total,
            transferred: AtomicU64::new(0),
            last_reported: AtomicU8::new(0),
            tx,
        }
    }

    /// Receivers see only threshold crossings, never every chunk
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    pub fn percent(&self) -> u8 {
        percent_of(self.transferred(), self.total)
    }

    /// Record `bytes` more. Returns the new percentage when a threshold was crossed.
    pub fn advance(&self, bytes: u64) -> Option<u8> {
        let transferred = self.transferred.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let percent = percent_of(transferred, self.total);
        let last = self.last_reported.load(Ordering::Relaxed);

        let crossed = percent >= last.saturating_add(Self::STEP) || (percent == 100 && last < 100);
        if !crossed {
            return None;
        }

        self.last_reported.store(percent, Ordering::Relaxed);
        self.tx.send_replace(percent);
        tracing::info!(
            file = %self.label,
            percent,
            "Upload progress: {}% ({:.2} MB / {:.2} MB)",
            percent,
            transferred as f64 / MIB,
            self.total as f64 / MIB
        );
        Some(percent)
    }

    /// Mark the transfer finished regardless of how many bytes were counted
    pub fn complete(&self) {
        let remaining = self.total.saturating_sub(self.transferred());
        if self.advance(remaining).is_none() && self.last_reported.load(Ordering::Relaxed) < 100 {
            self.last_reported.store(100, Ordering::Relaxed);
            self.tx.send_replace(100);
        }
    }
}

fn percent_of(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (transferred as u128 * 100 / total as u128).min(100);
    percent as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_only_on_five_percent_steps() {
        let progress = ProgressReporter::new("proj.zip", 1000);
        assert_eq!(progress.advance(10), None); // 1%
        assert_eq!(progress.advance(30), None); // 4%
        assert_eq!(progress.advance(10), Some(5));
        assert_eq!(progress.advance(49), None); // 9%
        assert_eq!(progress.advance(201), Some(30));
        assert_eq!(progress.advance(700), Some(100));
        assert_eq!(progress.advance(0), None);
    }

    #[test]
    fn test_subscriber_sees_latest_threshold() {
        let progress = ProgressReporter::new("proj.zip", 200);
        let rx = progress.subscribe();
        progress.advance(100);
        assert_eq!(*rx.borrow(), 50);
        progress.complete();
        assert_eq!(*rx.borrow(), 100);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let progress = ProgressReporter::new("proj.zip", 10);
        assert_eq!(progress.advance(25), Some(100));
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_empty_file_completes() {
        let progress = ProgressReporter::new("empty.zip", 0);
        let rx = progress.subscribe();
        progress.complete();
        assert_eq!(*rx.borrow(), 100);
    }
}
