pub mod metrics;
pub mod collector;
pub mod monitor;

pub use metrics::ChannelMetrics;
pub use collector::{MetricsCollector, MetricsSnapshot};
pub use monitor::RunMonitor;
