use super::ChannelMetrics;
use crate::core::ChannelId;
use crate::timing::measured_rate_hz;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub channel: ChannelId,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub write_errors: u64,
    /// Appends retried after a failure
    pub retries: u64,
    pub samples_written: u64,
    pub avg_elapsed_ms: u64,
    /// Capture rate implied by the average buffer duration
    pub measured_rate_hz: Option<f64>,
}

/// Per-channel metrics, ordered by channel
#[derive(Clone)]
pub struct MetricsCollector {
    frame_len: usize,
    metrics: BTreeMap<ChannelId, Arc<ChannelMetrics>>,
}

impl MetricsCollector {
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            metrics: BTreeMap::new(),
        }
    }

    /// Metrics for `channel`, registering them on first use
    pub fn channel(&mut self, channel: ChannelId) -> Arc<ChannelMetrics> {
        self.metrics
            .entry(channel)
            .or_insert_with(|| Arc::new(ChannelMetrics::new(channel)))
            .clone()
    }

    pub fn get(&self, channel: ChannelId) -> Option<Arc<ChannelMetrics>> {
        self.metrics.get(&channel).cloned()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn snapshot(&self) -> Vec<MetricsSnapshot> {
        self.metrics
            .values()
            .map(|m| {
                let avg_elapsed_ms = m.avg_elapsed_ms();
                MetricsSnapshot {
                    channel: m.channel(),
                    frames_processed: m.frames_processed(),
                    frames_rejected: m.frames_rejected(),
                    write_errors: m.write_errors(),
                    retries: m.retries(),
                    samples_written: m.samples_written(),
                    avg_elapsed_ms,
                    measured_rate_hz: measured_rate_hz(self.frame_len, avg_elapsed_ms as i64),
                }
            })
            .collect()
    }
}
