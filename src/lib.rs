pub mod config;
pub mod core;
pub mod engine;
pub mod io;
pub mod observability;
pub mod resample;
pub mod resilience;
pub mod source;
pub mod timing;
