use crate::core::{ChannelId, Xyz};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Destination for calibrated per-channel output
pub trait ChannelSink {
    /// Append flat `[x, y, z, x, y, z, ...]` values to the channel's stream
    fn append(&mut self, channel: ChannelId, values: &[f32]) -> Result<()>;
}

impl<S: ChannelSink + ?Sized> ChannelSink for Box<S> {
    fn append(&mut self, channel: ChannelId, values: &[f32]) -> Result<()> {
        (**self).append(channel, values)
    }
}

/// Divide every raw component by `divisor`, flattened in sample order
pub fn scale_samples(samples: &[Xyz], divisor: f32) -> Vec<f32> {
    samples
        .iter()
        .flat_map(|s| s.components())
        .map(|c| c as f32 / divisor)
        .collect()
}

/// `{prefix}{unit}_{acc|gyr|mag}.bin`
pub fn output_file_name(prefix: &str, channel: ChannelId) -> String {
    format!(
        "{}{}_{}.bin",
        prefix,
        channel.unit,
        channel.channel_type.short_name()
    )
}

/// Appends packed little-endian `f32` values to one file per channel
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
}

impl FileSink {
    /// Creates the output directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .context(format!("Failed to create output directory {:?}", dir))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn path_for(&self, channel: ChannelId) -> PathBuf {
        self.dir.join(output_file_name(&self.prefix, channel))
    }
}

impl ChannelSink for FileSink {
    fn append(&mut self, channel: ChannelId, values: &[f32]) -> Result<()> {
        let path = self.path_for(channel);
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open {:?} for append", path))?;
        file.write_all(&bytes)
            .context(format!("Failed to append to {:?}", path))?;
        Ok(())
    }
}

/// Keeps every channel's output in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    streams: HashMap<ChannelId, Vec<f32>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: ChannelId) -> Option<&[f32]> {
        self.streams.get(&channel).map(|v| v.as_slice())
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self.streams.keys().copied().collect();
        channels.sort();
        channels
    }

    pub fn into_inner(self) -> HashMap<ChannelId, Vec<f32>> {
        self.streams
    }
}

impl ChannelSink for MemorySink {
    fn append(&mut self, channel: ChannelId, values: &[f32]) -> Result<()> {
        self.streams.entry(channel).or_default().extend_from_slice(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChannelType;

    #[test]
    fn test_scale_flattens_in_order() {
        let samples = vec![Xyz::new(256, -512, 0), Xyz::new(1, 2, 3)];
        let values = scale_samples(&samples, 256.0);
        assert_eq!(values, vec![1.0, -2.0, 0.0, 1.0 / 256.0, 2.0 / 256.0, 3.0 / 256.0]);
    }

    #[test]
    fn test_output_file_name() {
        let channel = ChannelId::new(6, ChannelType::Accelerometer);
        assert_eq!(output_file_name("imu", channel), "imu6_acc.bin");
    }

    #[test]
    fn test_memory_sink_appends() {
        let mut sink = MemorySink::new();
        let channel = ChannelId::new(0, ChannelType::Magnetometer);
        sink.append(channel, &[1.0, 2.0, 3.0]).unwrap();
        sink.append(channel, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(sink.get(channel).unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(sink.channels(), vec![channel]);
    }
}
