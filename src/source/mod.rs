pub mod synthetic;

pub use synthetic::{LoggerOptions, SyntheticLogger};
