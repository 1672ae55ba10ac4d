use crate::core::ChannelId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for one channel
pub struct ChannelMetrics {
    channel: ChannelId,
    frames_processed: AtomicU64,
    frames_rejected: AtomicU64,
    write_errors: AtomicU64,
    retries: AtomicU64,
    samples_written: AtomicU64,
    total_elapsed_ms: AtomicU64,
    elapsed_samples: AtomicU64,
}

impl ChannelMetrics {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            frames_processed: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
            total_elapsed_ms: AtomicU64::new(0),
            elapsed_samples: AtomicU64::new(0),
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Relaxed)
    }

    /// Count a frame whose elapsed time was recovered
    pub fn record_frame(&self, elapsed_ms: i64) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        if elapsed_ms > 0 {
            self.total_elapsed_ms.fetch_add(elapsed_ms as u64, Ordering::Relaxed);
            self.elapsed_samples.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_samples_written(&self, samples: usize) {
        self.samples_written.fetch_add(samples as u64, Ordering::Relaxed);
    }

    /// Mean buffer duration over frames with positive elapsed time
    pub fn avg_elapsed_ms(&self) -> u64 {
        let samples = self.elapsed_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_elapsed_ms.load(Ordering::Relaxed) / samples
    }
}
