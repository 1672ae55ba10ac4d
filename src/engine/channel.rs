use crate::config::DemuxConfig;
use crate::core::{ChannelId, ChannelState, Frame, FrameError, Xyz};
use crate::io::scale_samples;
use crate::observability::ChannelMetrics;
use crate::resample::resample_into;
use crate::timing::{measured_rate_hz, target_length, TimestampUnwrapper};
use std::sync::Arc;

/// Resolve which channel a frame belongs to
pub fn route(config: &DemuxConfig, frame: &Frame) -> Result<ChannelId, FrameError> {
    if frame.samples.len() != config.frame_len {
        return Err(FrameError::WrongLength {
            expected: config.frame_len,
            actual: frame.samples.len(),
        });
    }
    let channel_type = frame.label.channel_type()?;
    let unit = frame.label.unit_index();
    if unit as usize >= config.rates.units() {
        return Err(FrameError::UnknownUnit {
            unit,
            units: config.rates.units(),
        });
    }
    Ok(ChannelId::new(unit, channel_type))
}

/// Result of pushing one frame through a channel
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Calibrated output ready to append
    Emit {
        elapsed_ms: i64,
        target_len: usize,
        values: Vec<f32>,
    },
    /// Elapsed time came out negative; nothing to write
    Rejected { elapsed_ms: i64, target_len: i64 },
}

/// Timing state and per-frame pipeline for a single channel
pub struct ChannelProcessor {
    channel: ChannelId,
    state: ChannelState,
    unwrapper: TimestampUnwrapper,
    frame_len: usize,
    divisor: f32,
    metrics: Arc<ChannelMetrics>,
    scratch: Vec<Xyz>,
}

impl ChannelProcessor {
    /// Start tracking `channel` from its first frame
    pub fn seed(
        channel: ChannelId,
        frame: &Frame,
        config: &DemuxConfig,
        metrics: Arc<ChannelMetrics>,
    ) -> Result<Self, FrameError> {
        let nominal = config
            .rates
            .nominal_rate(channel.unit, channel.channel_type)
            .ok_or(FrameError::UnknownUnit {
                unit: channel.unit,
                units: config.rates.units(),
            })?;
        let target = config.rates.target_rate(channel.channel_type);
        let time_size = config.time_size;

        let state = ChannelState::new(
            (frame.full_timestamp() as u32 % time_size) as u16,
            nominal,
            target,
        );

        Ok(Self {
            channel,
            state,
            unwrapper: TimestampUnwrapper::new(time_size),
            frame_len: config.frame_len,
            divisor: config.rates.scale_divisor(channel.channel_type),
            metrics,
            scratch: Vec::with_capacity(config.frame_len * 2),
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Unwrap, size, resample and scale one frame.
    ///
    /// The channel timestamp advances even when no output is produced.
    /// Frames are expected to have passed [`route`], so they hold exactly
    /// `frame_len` samples.
    pub fn advance(&mut self, frame: &Frame) -> Step {
        let t_curr = frame.full_timestamp() as u32 % self.unwrapper.time_size();
        let elapsed_ms = self.unwrapper.unwrap(
            self.state.nominal_rate_hz,
            self.frame_len,
            self.state.last_timestamp as u32,
            t_curr,
        );
        self.state.last_timestamp = t_curr as u16;

        let target_len = target_length(elapsed_ms, self.state.target_rate_hz);
        tracing::debug!(
            channel = %self.channel,
            t_curr,
            elapsed_ms,
            target_len,
            measured_hz = ?measured_rate_hz(self.frame_len, elapsed_ms),
            "frame timing"
        );

        if let Err(e) = resample_into(&mut self.scratch, &frame.samples, target_len) {
            tracing::warn!(channel = %self.channel, elapsed_ms, "dropping frame: {}", e);
            self.metrics.record_rejected();
            return Step::Rejected {
                elapsed_ms,
                target_len,
            };
        }

        self.metrics.record_frame(elapsed_ms);
        Step::Emit {
            elapsed_ms,
            target_len: self.scratch.len(),
            values: scale_samples(&self.scratch, self.divisor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelType, Label};

    fn frame_at(full: u16, unit: u8, ty: ChannelType, len: usize) -> Frame {
        let samples = (0..len as i16).map(|i| Xyz::new(i, -i, 2 * i)).collect();
        Frame::new((full % 256) as u8, Label::compose((full / 256) as u8, unit, ty), samples)
    }

    #[test]
    fn test_route_uses_unit_bits() {
        let config = DemuxConfig::default();
        let frame = frame_at(1800, 2, ChannelType::Gyroscope, 85);
        assert_eq!(
            route(&config, &frame).unwrap(),
            ChannelId::new(2, ChannelType::Gyroscope)
        );
    }

    #[test]
    fn test_route_rejects_unit_outside_table() {
        let config = DemuxConfig::default();
        let frame = frame_at(0, 7, ChannelType::Accelerometer, 85);
        assert_eq!(
            route(&config, &frame),
            Err(FrameError::UnknownUnit { unit: 7, units: 7 })
        );
    }

    #[test]
    fn test_route_rejects_short_frame() {
        let config = DemuxConfig::default();
        let frame = frame_at(680, 0, ChannelType::Accelerometer, 10);
        assert_eq!(
            route(&config, &frame),
            Err(FrameError::WrongLength { expected: 85, actual: 10 })
        );
    }

    #[test]
    fn test_advance_downsamples_accelerometer() {
        let config = DemuxConfig::default();
        let channel = ChannelId::new(0, ChannelType::Accelerometer);
        let metrics = Arc::new(ChannelMetrics::new(channel));
        let first = frame_at(1500, 0, ChannelType::Accelerometer, 85);
        let mut processor =
            ChannelProcessor::seed(channel, &first, &config, metrics.clone()).unwrap();

        // 680 ms later, wrapped: (1500 + 680) % 2048 = 132
        let next = frame_at(132, 0, ChannelType::Accelerometer, 85);
        match processor.advance(&next) {
            Step::Emit { elapsed_ms, target_len, values } => {
                assert_eq!(elapsed_ms, 680);
                assert_eq!(target_len, 68);
                assert_eq!(values.len(), 68 * 3);
                assert_eq!(values[3..6], [1.0 / 256.0, -1.0 / 256.0, 2.0 / 256.0]);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(processor.state().last_timestamp, 132);
        assert_eq!(metrics.frames_processed(), 1);
    }

    #[test]
    fn test_backwards_clock_rejected_but_timestamp_advances() {
        let config = DemuxConfig::default();
        let channel = ChannelId::new(1, ChannelType::Gyroscope);
        let metrics = Arc::new(ChannelMetrics::new(channel));
        let first = frame_at(1500, 1, ChannelType::Gyroscope, 85);
        let mut processor =
            ChannelProcessor::seed(channel, &first, &config, metrics.clone()).unwrap();

        // reading is 216 ms before the previous one
        let next = frame_at(1284, 1, ChannelType::Gyroscope, 85);
        assert_eq!(
            processor.advance(&next),
            Step::Rejected { elapsed_ms: -216, target_len: -21 }
        );
        assert_eq!(processor.state().last_timestamp, 1284);
        assert_eq!(metrics.frames_rejected(), 1);
    }
}
