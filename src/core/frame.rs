use super::ChannelType;
use thiserror::Error;

/// Timestamp byte + label byte
pub const FRAME_HEADER_BYTES: usize = 2;

/// Three little-endian i16 components
pub const SAMPLE_BYTES: usize = 6;

/// Errors raised while decoding a frame from the log
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The log ended part-way through a frame.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Label bits [1:0] hold a value that names no sensor.
    #[error("label {label:#04x} has unknown channel type {value}")]
    UnknownChannelType { label: u8, value: u8 },

    /// Unit index has no entry in the configured rate table.
    #[error("unit index {unit} is outside the rate table ({units} units)")]
    UnknownUnit { unit: u8, units: usize },

    /// Sample count differs from the configured frame length.
    #[error("frame holds {actual} samples, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    /// The underlying stream failed mid-read.
    #[error("failed to read frame: {0}")]
    Io(std::io::ErrorKind),
}

/// One raw 3-axis sample as captured by the logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xyz {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Xyz {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    pub fn components(&self) -> [i16; 3] {
        [self.x, self.y, self.z]
    }

    fn read(bytes: &[u8]) -> Self {
        Self {
            x: i16::from_le_bytes([bytes[0], bytes[1]]),
            y: i16::from_le_bytes([bytes[2], bytes[3]]),
            z: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.z.to_le_bytes());
    }
}

/// Frame label byte
///
/// ```text
///  7   6   5   4   3   2   1   0
/// ┌───────────┬───────────┬───────┐
/// │ time[10:8]│   unit    │ type  │
/// └───────────┴───────────┴───────┘
/// ```
///
/// The unit index is bits [4:2]. Bits [7:5] belong to the timestamp and
/// never identify a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u8);

impl Label {
    pub fn compose(timestamp_high: u8, unit: u8, channel_type: ChannelType) -> Self {
        Self(((timestamp_high & 0x07) << 5) | ((unit & 0x07) << 2) | channel_type as u8)
    }

    /// High three bits of the 11-bit timestamp
    pub fn timestamp_high(&self) -> u8 {
        self.0 >> 5
    }

    pub fn unit_index(&self) -> u8 {
        (self.0 >> 2) & 0x07
    }

    pub fn channel_type(&self) -> Result<ChannelType, FrameError> {
        let value = self.0 & 0x03;
        ChannelType::from_bits(value).ok_or(FrameError::UnknownChannelType {
            label: self.0,
            value,
        })
    }
}

/// A single fixed-size record from the sensor log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Low 8 bits of the capture timestamp
    pub timestamp: u8,
    pub label: Label,
    pub samples: Vec<Xyz>,
}

impl Frame {
    pub fn new(timestamp: u8, label: Label, samples: Vec<Xyz>) -> Self {
        Self {
            timestamp,
            label,
            samples,
        }
    }

    /// Byte size of a frame holding `frame_len` samples
    pub fn encoded_len(frame_len: usize) -> usize {
        FRAME_HEADER_BYTES + frame_len * SAMPLE_BYTES
    }

    /// Full 11-bit timestamp, `high3 * 256 + low8`
    pub fn full_timestamp(&self) -> u16 {
        self.label.timestamp_high() as u16 * 256 + self.timestamp as u16
    }

    pub fn decode(bytes: &[u8], frame_len: usize) -> Result<Self, FrameError> {
        let expected = Self::encoded_len(frame_len);
        if bytes.len() != expected {
            return Err(FrameError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let samples = bytes[FRAME_HEADER_BYTES..]
            .chunks_exact(SAMPLE_BYTES)
            .map(Xyz::read)
            .collect();

        Ok(Self {
            timestamp: bytes[0],
            label: Label(bytes[1]),
            samples,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(self.samples.len()));
        out.push(self.timestamp);
        out.push(self.label.0);
        for sample in &self.samples {
            sample.write(&mut out);
        }
        out
    }
}
