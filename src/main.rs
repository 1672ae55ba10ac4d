use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imutab::config::DemuxConfig;
use imutab::engine::{AsyncDemultiplexer, Demultiplexer, RunSummary};
use imutab::io::{FileSink, FrameReader, MappedLog};
use imutab::observability::RunMonitor;
use imutab::resilience::RetryingSink;
use imutab::source::{LoggerOptions, SyntheticLogger};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imutab")]
#[command(about = "Split an IMU logger dump into rate-corrected per-sensor streams")]
struct Args {
    /// JSON config overriding frame size, clock modulus and rate tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resample every channel of a log and write one file per channel
    Process {
        /// Binary log produced by the logger
        log: PathBuf,

        /// Directory for the per-channel output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Process each channel on its own task
        #[arg(long)]
        parallel: bool,

        /// Stream the log instead of memory-mapping it
        #[arg(long)]
        no_mmap: bool,
    },

    /// Write a synthetic log with drifting sample rates
    Generate {
        /// Output log path
        out: PathBuf,

        #[arg(long, default_value_t = 100)]
        frames: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Maximum fractional rate drift per frame
        #[arg(long, default_value_t = 0.02)]
        jitter: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DemuxConfig::load(path)?,
        None => DemuxConfig::default(),
    };

    match args.command {
        Command::Process {
            log,
            out_dir,
            parallel,
            no_mmap,
        } => {
            tracing::info!("Processing {:?} -> {:?}", log, out_dir);
            let summary = if parallel {
                process_parallel(config, log, out_dir, !no_mmap).await?
            } else {
                tokio::task::spawn_blocking(move || process(config, log, out_dir, !no_mmap))
                    .await
                    .context("processing task panicked")??
            };
            print_summary(&summary);
        }
        Command::Generate {
            out,
            frames,
            seed,
            jitter,
        } => {
            let options = LoggerOptions {
                seed,
                channels: None,
                rate_jitter: jitter,
            };
            let written = SyntheticLogger::new(&config, options).write_log(&out, frames)?;
            println!("Wrote {} frames to {:?}", written, out);
        }
    }

    Ok(())
}

fn process(
    config: DemuxConfig,
    log: PathBuf,
    out_dir: PathBuf,
    mmap: bool,
) -> Result<RunSummary> {
    let sink = FileSink::new(&out_dir, config.output_prefix.clone())?;
    let sink = RetryingSink::new(sink, config.retry.clone());
    let frame_len = config.frame_len;
    let mut demux = Demultiplexer::new(config, sink);

    let summary = if mmap {
        let mapped = MappedLog::open(&log, frame_len)?;
        tracing::info!(frames = mapped.frame_count(), "log mapped");
        demux.run(mapped.frames())
    } else {
        demux.run(FrameReader::open(&log, frame_len)?)
    };
    if demux.sink().retries() > 0 {
        tracing::info!(retries = demux.sink().retries(), "appends retried");
    }

    println!("{}", RunMonitor::new(demux.metrics().clone()).generate_report());
    Ok(summary)
}

async fn process_parallel(
    config: DemuxConfig,
    log: PathBuf,
    out_dir: PathBuf,
    mmap: bool,
) -> Result<RunSummary> {
    let frame_len = config.frame_len;
    let mut demux = AsyncDemultiplexer::with_file_output(config, out_dir)?;

    if mmap {
        let mapped = MappedLog::open(&log, frame_len)?;
        tracing::info!(frames = mapped.frame_count(), "log mapped");
        demux.run(mapped.frames()).await?;
    } else {
        demux.run(FrameReader::open(&log, frame_len)?).await?;
    }

    let metrics = demux.metrics().clone();
    let summary = demux.finish().await?;
    println!("{}", RunMonitor::new(metrics).generate_report());
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===");
    println!("Frames read:     {}", summary.frames_read);
    println!("Frames written:  {}", summary.frames_written);
    println!("Channels seeded: {}", summary.frames_seeded);
    println!("Rejected:        {}", summary.frames_rejected);
    println!("Skipped:         {}", summary.frames_skipped);
    println!("Write failures:  {}", summary.write_failures);
    println!("Samples written: {}", summary.samples_written);
    if let Some(err) = &summary.stream_error {
        println!("Input ended early: {}", err);
    }
}
