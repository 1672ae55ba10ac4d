use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor type carried in label bits [1:0]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Accelerometer = 0,
    Gyroscope = 1,
    Magnetometer = 2,
}

impl ChannelType {
    pub const ALL: [ChannelType; 3] = [
        ChannelType::Accelerometer,
        ChannelType::Gyroscope,
        ChannelType::Magnetometer,
    ];

    pub fn from_bits(value: u8) -> Option<Self> {
        match value {
            0 => Some(ChannelType::Accelerometer),
            1 => Some(ChannelType::Gyroscope),
            2 => Some(ChannelType::Magnetometer),
            _ => None,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            ChannelType::Accelerometer => "acc",
            ChannelType::Gyroscope => "gyr",
            ChannelType::Magnetometer => "mag",
        }
    }
}

/// A (unit, sensor type) pair with its own timestamp history and output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId {
    pub unit: u8,
    pub channel_type: ChannelType,
}

impl ChannelId {
    pub fn new(unit: u8, channel_type: ChannelType) -> Self {
        Self { unit, channel_type }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "imu{}_{}", self.unit, self.channel_type.short_name())
    }
}

/// Per-channel timing state, alive for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    /// Last reconstructed timestamp, in `[0, time_size)`
    pub last_timestamp: u16,
    pub nominal_rate_hz: u32,
    pub target_rate_hz: u32,
}

impl ChannelState {
    pub fn new(last_timestamp: u16, nominal_rate_hz: u32, target_rate_hz: u32) -> Self {
        Self {
            last_timestamp,
            nominal_rate_hz,
            target_rate_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display() {
        let id = ChannelId::new(4, ChannelType::Gyroscope);
        assert_eq!(id.to_string(), "imu4_gyr");
    }

    #[test]
    fn test_from_bits() {
        for ty in ChannelType::ALL {
            assert_eq!(ChannelType::from_bits(ty as u8), Some(ty));
        }
        assert_eq!(ChannelType::from_bits(3), None);
    }
}
