mod common;

use common::frame_at;
use imutab::config::DemuxConfig;
use imutab::core::{ChannelId, ChannelType};
use imutab::engine::Demultiplexer;
use imutab::io::MemorySink;
use imutab::observability::{MetricsCollector, RunMonitor};

#[test]
fn test_empty_report() {
    let monitor = RunMonitor::new(MetricsCollector::new(85));
    assert_eq!(monitor.generate_report(), "No channels seen");
}

#[test]
fn test_snapshot_is_ordered_by_channel() {
    let mut collector = MetricsCollector::new(85);
    collector.channel(ChannelId::new(4, ChannelType::Gyroscope));
    collector.channel(ChannelId::new(0, ChannelType::Magnetometer));
    collector.channel(ChannelId::new(0, ChannelType::Accelerometer));

    let channels: Vec<_> = collector.snapshot().into_iter().map(|s| s.channel).collect();
    assert_eq!(
        channels,
        vec![
            ChannelId::new(0, ChannelType::Accelerometer),
            ChannelId::new(0, ChannelType::Magnetometer),
            ChannelId::new(4, ChannelType::Gyroscope),
        ]
    );
}

#[test]
fn test_metrics_follow_a_run() {
    let mut demux = Demultiplexer::new(DemuxConfig::default(), MemorySink::new());
    let ty = ChannelType::Accelerometer;

    demux.process_frame(&frame_at(0, 1, ty, 85)).unwrap();
    demux.process_frame(&frame_at(680, 1, ty, 85)).unwrap();
    demux.process_frame(&frame_at(1360, 1, ty, 85)).unwrap();
    // 100 ms backwards
    demux.process_frame(&frame_at(1260, 1, ty, 85)).unwrap();

    let snapshot = demux.metrics().snapshot();
    assert_eq!(snapshot.len(), 1);
    let acc = &snapshot[0];
    assert_eq!(acc.frames_processed, 2);
    assert_eq!(acc.frames_rejected, 1);
    assert_eq!(acc.samples_written, 2 * 68);
    assert_eq!(acc.avg_elapsed_ms, 680);
    assert_eq!(acc.measured_rate_hz, Some(125.0));

    let report = RunMonitor::new(demux.metrics().clone()).generate_report();
    assert!(report.contains("[imu1_acc]"));
    assert!(report.contains("Frames: 2 resampled, 1 rejected"));
    assert!(report.contains("Avg buffer: 680 ms (125.0 Hz)"));
}

#[test]
fn test_seeded_only_channel_has_no_rate() {
    let mut demux = Demultiplexer::new(DemuxConfig::default(), MemorySink::new());
    demux.process_frame(&frame_at(0, 2, ChannelType::Magnetometer, 85)).unwrap();

    let report = RunMonitor::new(demux.metrics().clone()).generate_report();
    assert!(report.contains("[imu2_mag]"));
    assert!(report.contains("Avg buffer: 0 ms (n/a)"));
}
