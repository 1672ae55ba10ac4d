pub mod length;
pub mod unwrap;

pub use length::{measured_rate_hz, target_length};
pub use unwrap::{expected_elapsed_ms, TimestampUnwrapper, DEFAULT_TIME_SIZE};
