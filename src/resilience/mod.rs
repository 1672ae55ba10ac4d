pub mod policy;
pub mod retrying_sink;

pub use policy::{Backoff, RetryPolicy};
pub use retrying_sink::RetryingSink;
