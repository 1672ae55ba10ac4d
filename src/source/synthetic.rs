//! Fake sensor logger for exercising the demultiplexer.
//!
//! Every channel fills its buffer on its own simulated clock, running at the
//! nominal rate plus a random per-frame drift. Frames come out in the order
//! the buffers fill, stamped with the wrapped clock just like the hardware.

use crate::config::DemuxConfig;
use crate::core::{ChannelId, ChannelType, Frame, Label, Xyz};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub seed: u64,
    /// Channels to simulate; `None` means every unit and sensor type
    pub channels: Option<Vec<ChannelId>>,
    /// Maximum fractional deviation from the nominal rate, e.g. `0.02`
    pub rate_jitter: f64,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            channels: None,
            rate_jitter: 0.02,
        }
    }
}

struct SimClock {
    channel: ChannelId,
    nominal_hz: f64,
    /// Time the current buffer fills, in ms since start
    next_ms: f64,
}

pub struct SyntheticLogger {
    frame_len: usize,
    time_size: u64,
    rate_jitter: f64,
    rng: StdRng,
    clocks: Vec<SimClock>,
}

impl SyntheticLogger {
    pub fn new(config: &DemuxConfig, options: LoggerOptions) -> Self {
        let mut rng = StdRng::seed_from_u64(options.seed);

        let channels = options.channels.unwrap_or_else(|| {
            (0..config.rates.units() as u8)
                .flat_map(|unit| ChannelType::ALL.map(|ty| ChannelId::new(unit, ty)))
                .collect()
        });

        let clocks = channels
            .into_iter()
            .filter_map(|channel| {
                let nominal = config.rates.nominal_rate(channel.unit, channel.channel_type)?;
                let nominal_hz = nominal as f64;
                let span_ms = config.frame_len as f64 * 1000.0 / nominal_hz;
                Some(SimClock {
                    channel,
                    nominal_hz,
                    next_ms: rng.random_range(0.0..span_ms),
                })
            })
            .collect();

        Self {
            frame_len: config.frame_len,
            time_size: config.time_size as u64,
            rate_jitter: options.rate_jitter.abs(),
            rng,
            clocks,
        }
    }

    /// Next buffer to fill, or `None` if no channels are simulated
    pub fn next_frame(&mut self) -> Option<Frame> {
        let idx = self
            .clocks
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.next_ms.total_cmp(&b.1.next_ms))
            .map(|(i, _)| i)?;

        let drift = if self.rate_jitter > 0.0 {
            self.rng.random_range(-self.rate_jitter..=self.rate_jitter)
        } else {
            0.0
        };

        let clock = &mut self.clocks[idx];
        let full = clock.next_ms as u64 % self.time_size;
        let label = Label::compose(
            ((full / 256) & 0x07) as u8,
            clock.channel.unit,
            clock.channel.channel_type,
        );
        let channel = clock.channel;

        let rate = clock.nominal_hz * (1.0 + drift);
        clock.next_ms += self.frame_len as f64 * 1000.0 / rate;

        let samples = (0..self.frame_len)
            .map(|_| {
                Xyz::new(
                    self.rng.random_range(-1000..1000),
                    self.rng.random_range(-1000..1000),
                    self.rng.random_range(-1000..1000),
                )
            })
            .collect();

        tracing::trace!(%channel, full, "synthetic frame");
        Some(Frame::new((full % 256) as u8, label, samples))
    }

    /// Write `count` frames to a new log file
    pub fn write_log(&mut self, path: impl AsRef<Path>, count: usize) -> Result<usize> {
        let path = path.as_ref();
        let file = File::create(path).context(format!("Failed to create log {:?}", path))?;
        let mut out = BufWriter::new(file);

        let mut written = 0;
        for frame in self.by_ref().take(count) {
            out.write_all(&frame.encode())
                .context(format!("Failed to write frame to {:?}", path))?;
            written += 1;
        }
        out.flush().context(format!("Failed to flush {:?}", path))?;

        tracing::info!(frames = written, path = %path.display(), "synthetic log written");
        Ok(written)
    }
}

impl Iterator for SyntheticLogger {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.next_frame()
    }
}
