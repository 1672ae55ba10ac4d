use crate::core::ChannelType;
use crate::core::Frame;
use crate::resilience::RetryPolicy;
use crate::timing::DEFAULT_TIME_SIZE;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One value per sensor type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRates<T> {
    pub accelerometer: T,
    pub gyroscope: T,
    pub magnetometer: T,
}

impl<T: Copy> ChannelRates<T> {
    pub fn new(accelerometer: T, gyroscope: T, magnetometer: T) -> Self {
        Self {
            accelerometer,
            gyroscope,
            magnetometer,
        }
    }

    pub fn get(&self, channel_type: ChannelType) -> T {
        match channel_type {
            ChannelType::Accelerometer => self.accelerometer,
            ChannelType::Gyroscope => self.gyroscope,
            ChannelType::Magnetometer => self.magnetometer,
        }
    }
}

/// Sampling rates and calibration for every channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    /// Expected capture rate in Hz, one entry per unit
    pub nominal: Vec<ChannelRates<u32>>,
    /// Output rate in Hz
    pub target: ChannelRates<u32>,
    /// Raw counts per physical unit
    pub scale: ChannelRates<f32>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            nominal: vec![ChannelRates::new(125, 116, 47); 7],
            target: ChannelRates::new(100, 100, 40),
            scale: ChannelRates::new(256.0, 512.0, 16.0),
        }
    }
}

impl RateTable {
    pub fn units(&self) -> usize {
        self.nominal.len()
    }

    pub fn nominal_rate(&self, unit: u8, channel_type: ChannelType) -> Option<u32> {
        self.nominal
            .get(unit as usize)
            .map(|rates| rates.get(channel_type))
    }

    pub fn target_rate(&self, channel_type: ChannelType) -> u32 {
        self.target.get(channel_type)
    }

    pub fn scale_divisor(&self, channel_type: ChannelType) -> f32 {
        self.scale.get(channel_type)
    }
}

/// Everything the demultiplexer needs to know about a log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemuxConfig {
    /// Samples per frame
    pub frame_len: usize,
    /// Modulus of the logger clock, in ms
    pub time_size: u32,
    pub rates: RateTable,
    /// Output file name prefix, e.g. `imu` -> `imu3_gyr.bin`
    pub output_prefix: String,
    /// Retry behaviour when appending to a channel output fails
    pub retry: RetryPolicy,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            frame_len: 85,
            time_size: DEFAULT_TIME_SIZE,
            rates: RateTable::default(),
            output_prefix: "imu".to_string(),
            retry: RetryPolicy::Never,
        }
    }
}

impl DemuxConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: DemuxConfig =
            serde_json::from_value(config).context("Failed to parse demux config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read config from {:?}", path))?;
        let value: Value = serde_json::from_str(&json)
            .context(format!("Failed to parse JSON in {:?}", path))?;
        Self::from_json(value)
    }

    /// Bytes per frame on disk
    pub fn frame_size_bytes(&self) -> usize {
        Frame::encoded_len(self.frame_len)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_len == 0 {
            bail!("frame_len must be positive");
        }
        // the label carries an 11-bit clock, so the modulus must divide 2048
        if self.time_size < 2
            || !self.time_size.is_power_of_two()
            || self.time_size > DEFAULT_TIME_SIZE
        {
            bail!(
                "time_size must be a power of two between 2 and {}, got {}",
                DEFAULT_TIME_SIZE,
                self.time_size
            );
        }
        if self.rates.nominal.is_empty() {
            bail!("rate table must list at least one unit");
        }
        if self.rates.nominal.len() > 8 {
            bail!("label holds 3 unit bits, rate table lists {} units", self.rates.nominal.len());
        }
        for (unit, rates) in self.rates.nominal.iter().enumerate() {
            for ty in ChannelType::ALL {
                if rates.get(ty) == 0 {
                    bail!("nominal {} rate for unit {} must be positive", ty.short_name(), unit);
                }
            }
        }
        for ty in ChannelType::ALL {
            if self.rates.target.get(ty) == 0 {
                bail!("target {} rate must be positive", ty.short_name());
            }
            let divisor = self.rates.scale.get(ty);
            if !divisor.is_finite() || divisor == 0.0 {
                bail!("{} scale divisor must be finite and non-zero", ty.short_name());
            }
        }
        Ok(())
    }
}
