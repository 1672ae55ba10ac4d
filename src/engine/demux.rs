use super::channel::{route, ChannelProcessor, Step};
use crate::config::DemuxConfig;
use crate::core::{ChannelId, ChannelState, Frame, FrameError};
use crate::io::ChannelSink;
use crate::observability::MetricsCollector;
use std::collections::HashMap;

/// What happened to a single frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// First frame of a channel; only its timestamp is kept
    Seeded(ChannelId),
    Written {
        channel: ChannelId,
        elapsed_ms: i64,
        target_len: usize,
    },
    /// Elapsed time was negative, nothing written
    Rejected { channel: ChannelId, elapsed_ms: i64 },
    /// Output could not be appended; the run continues
    WriteFailed { channel: ChannelId, target_len: usize },
}

/// Counters for a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_seeded: u64,
    pub frames_written: u64,
    pub frames_rejected: u64,
    /// Frames whose label names no known channel
    pub frames_skipped: u64,
    pub write_failures: u64,
    pub samples_written: u64,
    /// Why the input ended early, if it did
    pub stream_error: Option<FrameError>,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.frames_read += other.frames_read;
        self.frames_seeded += other.frames_seeded;
        self.frames_written += other.frames_written;
        self.frames_rejected += other.frames_rejected;
        self.frames_skipped += other.frames_skipped;
        self.write_failures += other.write_failures;
        self.samples_written += other.samples_written;
        if self.stream_error.is_none() {
            self.stream_error = other.stream_error.clone();
        }
    }

    pub(crate) fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Seeded(_) => self.frames_seeded += 1,
            FrameOutcome::Written { target_len, .. } => {
                self.frames_written += 1;
                self.samples_written += *target_len as u64;
            }
            FrameOutcome::Rejected { .. } => self.frames_rejected += 1,
            FrameOutcome::WriteFailed { .. } => self.write_failures += 1,
        }
    }
}

/// Splits a log into per-channel, rate-corrected output streams
pub struct Demultiplexer<S> {
    config: DemuxConfig,
    sink: S,
    channels: HashMap<ChannelId, ChannelProcessor>,
    metrics: MetricsCollector,
    summary: RunSummary,
}

impl<S: ChannelSink> Demultiplexer<S> {
    pub fn new(config: DemuxConfig, sink: S) -> Self {
        let metrics = MetricsCollector::new(config.frame_len);
        Self {
            config,
            sink,
            channels: HashMap::new(),
            metrics,
            summary: RunSummary::default(),
        }
    }

    pub fn channel_state(&self, channel: ChannelId) -> Option<&ChannelState> {
        self.channels.get(&channel).map(|p| p.state())
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Push one frame through its channel.
    ///
    /// Errors only for frames that cannot be routed; those leave every
    /// channel's state untouched.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameOutcome, FrameError> {
        self.summary.frames_read += 1;

        let channel = match route(&self.config, frame) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(label = frame.label.0, "skipping frame: {}", e);
                self.summary.frames_skipped += 1;
                return Err(e);
            }
        };

        let outcome = match self.channels.get_mut(&channel) {
            None => {
                let metrics = self.metrics.channel(channel);
                let processor = ChannelProcessor::seed(channel, frame, &self.config, metrics)?;
                tracing::debug!(%channel, t = processor.state().last_timestamp, "channel seeded");
                self.channels.insert(channel, processor);
                FrameOutcome::Seeded(channel)
            }
            Some(processor) => match processor.advance(frame) {
                Step::Rejected { elapsed_ms, .. } => FrameOutcome::Rejected { channel, elapsed_ms },
                Step::Emit {
                    elapsed_ms,
                    target_len,
                    values,
                } => match self.sink.append(channel, &values) {
                    Ok(()) => {
                        self.metrics.channel(channel).record_samples_written(target_len);
                        FrameOutcome::Written {
                            channel,
                            elapsed_ms,
                            target_len,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%channel, "write failed: {:#}", e);
                        self.metrics.channel(channel).record_write_error();
                        FrameOutcome::WriteFailed {
                            channel,
                            target_len,
                        }
                    }
                },
            },
        };

        self.summary.record(&outcome);
        Ok(outcome)
    }

    /// Process frames in order until the input ends.
    ///
    /// A truncated or unreadable tail stops the run and is noted in the
    /// summary rather than returned as an error.
    pub fn run<I>(&mut self, frames: I) -> RunSummary
    where
        I: IntoIterator<Item = Result<Frame, FrameError>>,
    {
        for frame in frames {
            match frame {
                Ok(frame) => {
                    // unroutable frames are already logged and counted
                    let _ = self.process_frame(&frame);
                }
                Err(e) => {
                    tracing::warn!("input ended early: {}", e);
                    self.summary.stream_error = Some(e);
                    break;
                }
            }
        }

        tracing::info!(
            frames = self.summary.frames_read,
            written = self.summary.frames_written,
            channels = self.channels.len(),
            "run complete"
        );
        self.summary.clone()
    }
}
