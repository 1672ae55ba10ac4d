use super::channel::{route, ChannelProcessor, Step};
use super::demux::{FrameOutcome, RunSummary};
use crate::config::DemuxConfig;
use crate::core::{ChannelId, Frame, FrameError};
use crate::io::output_file_name;
use crate::observability::{ChannelMetrics, MetricsCollector};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Async destination for a single channel's output
#[async_trait]
pub trait ChannelWriter: Send {
    async fn append(&mut self, values: &[f32]) -> Result<()>;
}

/// Builds the writer for a channel the first time it is seen
pub type WriterFactory = Arc<dyn Fn(ChannelId) -> Box<dyn ChannelWriter> + Send + Sync>;

/// Appends packed little-endian `f32` values to a file
pub struct AsyncFileWriter {
    path: PathBuf,
}

impl AsyncFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChannelWriter for AsyncFileWriter {
    async fn append(&mut self, values: &[f32]) -> Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .context(format!("Failed to open {:?} for append", self.path))?;
        file.write_all(&bytes)
            .await
            .context(format!("Failed to append to {:?}", self.path))?;
        file.flush().await?;
        Ok(())
    }
}

/// Demultiplexer that runs every channel on its own task.
///
/// Frames for one channel travel through a single ordered queue, so each
/// channel still sees its frames in log order.
pub struct AsyncDemultiplexer {
    config: Arc<DemuxConfig>,
    factory: WriterFactory,
    senders: HashMap<ChannelId, mpsc::Sender<Frame>>,
    handles: Vec<JoinHandle<RunSummary>>,
    channel_capacity: usize,
    metrics: MetricsCollector,
    summary: RunSummary,
}

impl AsyncDemultiplexer {
    pub fn new(config: DemuxConfig, factory: WriterFactory) -> Self {
        let metrics = MetricsCollector::new(config.frame_len);
        Self {
            config: Arc::new(config),
            factory,
            senders: HashMap::new(),
            handles: Vec::new(),
            channel_capacity: 64,
            metrics,
            summary: RunSummary::default(),
        }
    }

    /// Write `{dir}/{prefix}{unit}_{type}.bin` files
    pub fn with_file_output(config: DemuxConfig, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .context(format!("Failed to create output directory {:?}", dir))?;
        let prefix = config.output_prefix.clone();
        let factory: WriterFactory = Arc::new(move |channel| {
            Box::new(AsyncFileWriter::new(dir.join(output_file_name(&prefix, channel))))
                as Box<dyn ChannelWriter>
        });
        Ok(Self::new(config, factory))
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Hand a frame to its channel task, spawning the task on first sight.
    ///
    /// Unroutable frames are logged and counted, not returned as errors.
    pub async fn dispatch(&mut self, frame: Frame) -> Result<()> {
        self.summary.frames_read += 1;

        let channel = match route(&self.config, &frame) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(label = frame.label.0, "skipping frame: {}", e);
                self.summary.frames_skipped += 1;
                return Ok(());
            }
        };

        if !self.senders.contains_key(&channel) {
            let (tx, rx) = mpsc::channel(self.channel_capacity);
            let worker = ChannelTask {
                channel,
                config: self.config.clone(),
                writer: (self.factory)(channel),
                metrics: self.metrics.channel(channel),
            };
            self.handles.push(tokio::spawn(worker.run(rx)));
            self.senders.insert(channel, tx);
        }

        let tx = &self.senders[&channel];
        tx.send(frame)
            .await
            .map_err(|_| anyhow!("task for {} stopped early", channel))
    }

    /// Dispatch frames until the input ends or fails
    pub async fn run<I>(&mut self, frames: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Frame, FrameError>>,
    {
        for frame in frames {
            match frame {
                Ok(frame) => self.dispatch(frame).await?,
                Err(e) => {
                    tracing::warn!("input ended early: {}", e);
                    self.summary.stream_error = Some(e);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Close every channel queue and wait for the tasks to drain
    pub async fn finish(mut self) -> Result<RunSummary> {
        self.senders.clear();

        let mut summary = self.summary;
        for handle in self.handles {
            let channel_summary = handle.await.context("channel task panicked")?;
            summary.merge(&channel_summary);
        }

        tracing::info!(
            frames = summary.frames_read,
            written = summary.frames_written,
            "run complete"
        );
        Ok(summary)
    }
}

struct ChannelTask {
    channel: ChannelId,
    config: Arc<DemuxConfig>,
    writer: Box<dyn ChannelWriter>,
    metrics: Arc<ChannelMetrics>,
}

impl ChannelTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Frame>) -> RunSummary {
        let mut summary = RunSummary::default();

        let Some(first) = rx.recv().await else {
            return summary;
        };
        let mut processor =
            match ChannelProcessor::seed(self.channel, &first, &self.config, self.metrics.clone()) {
                Ok(processor) => processor,
                Err(e) => {
                    tracing::warn!(channel = %self.channel, "cannot track channel: {}", e);
                    return summary;
                }
            };
        summary.record(&FrameOutcome::Seeded(self.channel));

        while let Some(frame) = rx.recv().await {
            let channel = self.channel;
            let outcome = match processor.advance(&frame) {
                Step::Rejected { elapsed_ms, .. } => FrameOutcome::Rejected { channel, elapsed_ms },
                Step::Emit {
                    elapsed_ms,
                    target_len,
                    values,
                } => match self.append(&values).await {
                    Ok(()) => {
                        self.metrics.record_samples_written(target_len);
                        FrameOutcome::Written {
                            channel,
                            elapsed_ms,
                            target_len,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%channel, "write failed: {:#}", e);
                        self.metrics.record_write_error();
                        FrameOutcome::WriteFailed {
                            channel,
                            target_len,
                        }
                    }
                },
            };
            summary.record(&outcome);
        }

        summary
    }

    async fn append(&mut self, values: &[f32]) -> Result<()> {
        let mut backoff = self.config.retry.start();
        loop {
            let err = match self.writer.append(values).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            let delay = backoff
                .next(err)
                .with_context(|| format!("append to {} failed", self.channel))?;
            self.metrics.record_retry();
            tokio::time::sleep(delay).await;
        }
    }
}
