pub mod hold;

pub use hold::{resample, resample_into, ResampleError};
