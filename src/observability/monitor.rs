use super::MetricsCollector;

pub struct RunMonitor {
    collector: MetricsCollector,
}

impl RunMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No channels seen".to_string();
        }

        let mut report = String::from("=== Channel Metrics ===\n");

        for metrics in &snapshot {
            let rate = match metrics.measured_rate_hz {
                Some(hz) => format!("{:.1} Hz", hz),
                None => "n/a".to_string(),
            };
            report.push_str(&format!("\n[{}]\n", metrics.channel));
            report.push_str(&format!(
                "  Frames: {} resampled, {} rejected\n",
                metrics.frames_processed, metrics.frames_rejected
            ));
            report.push_str(&format!("  Samples: {} written\n", metrics.samples_written));
            report.push_str(&format!(
                "  Write errors: {} ({} retries)\n",
                metrics.write_errors, metrics.retries
            ));
            report.push_str(&format!(
                "  Avg buffer: {} ms ({})\n",
                metrics.avg_elapsed_ms, rate
            ));
        }

        report
    }
}
