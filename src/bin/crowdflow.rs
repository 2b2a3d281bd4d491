use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use crowdflow::integration::{ReplayDetector, ReplaySource, spawn_detection_worker};
use crowdflow::metrics::{self, JsonLinesSink, SharedSink};
use crowdflow::{CameraConfig, CancellationToken, Config, FlowEngine, PipelineSummary};

#[derive(Debug, Parser)]
#[command(
    name = "crowdflow",
    version,
    about = "Track detections and count ROI entries and exits per camera"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay each camera's recorded detections and append metrics
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Stop all cameras after this many seconds
        #[arg(long)]
        max_seconds: Option<f64>,
    },
    /// Print the most recent metrics record
    Latest {
        #[arg(short, long, default_value = "data/outputs/metrics.jsonl")]
        metrics: PathBuf,

        /// Only consider records from this camera
        #[arg(long)]
        camera: Option<String>,
    },
    /// Compare predicted active counts against a ground-truth metrics log
    Evaluate {
        #[arg(long)]
        ground_truth: PathBuf,

        #[arg(long)]
        predicted: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crowdflow=info"));
    fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run { config, max_seconds } => run(&config, max_seconds),
        Command::Latest { metrics, camera } => latest(&metrics, camera.as_deref()),
        Command::Evaluate {
            ground_truth,
            predicted,
        } => evaluate(&ground_truth, &predicted),
    }
}

fn run(config_path: &Path, max_seconds: Option<f64>) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("invalid configuration {}", config_path.display()))?;
    let sink = JsonLinesSink::open(&config.metrics_path)
        .with_context(|| format!("cannot open metrics sink {}", config.metrics_path.display()))?;
    let sink = SharedSink::new(sink);
    let cancel = CancellationToken::new();

    if let Some(seconds) = max_seconds {
        let limit = Duration::try_from_secs_f64(seconds)
            .context("--max-seconds must be a non-negative number")?;
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(limit);
            info!(seconds, "time limit reached, stopping");
            cancel.cancel();
        });
    }

    info!(
        cameras = config.cameras.len(),
        metrics = %config.metrics_path.display(),
        "starting"
    );

    let failed = thread::scope(|scope| {
        let handles: Vec<_> = config
            .cameras
            .iter()
            .map(|camera| {
                let sink = sink.clone();
                let cancel = &cancel;
                let config = &config;
                (camera.id.as_str(), scope.spawn(move || run_camera(camera, config, sink, cancel)))
            })
            .collect();

        let mut failed = 0usize;
        for (camera, handle) in handles {
            match handle.join() {
                Ok(Ok(summary)) => info!(
                    camera,
                    frames = summary.frames,
                    skipped = summary.skipped_frames,
                    in_count = summary.counts.in_count,
                    out_count = summary.counts.out_count,
                    net = summary.counts.net(),
                    sink_failures = summary.sink_failures,
                    "camera done"
                ),
                Ok(Err(err)) => {
                    error!(camera, "{err:#}");
                    failed += 1;
                }
                Err(_) => {
                    error!(camera, "camera pipeline panicked");
                    failed += 1;
                }
            }
        }
        failed
    });

    if failed > 0 {
        bail!("{failed} of {} camera pipelines failed", config.cameras.len());
    }
    Ok(())
}

fn run_camera(
    camera: &CameraConfig,
    config: &Config,
    sink: SharedSink<JsonLinesSink>,
    cancel: &CancellationToken,
) -> Result<PipelineSummary> {
    let path = camera
        .source
        .as_ref()
        .ok_or_else(|| anyhow!("camera `{}` has no detection source", camera.id))?;
    let source = ReplaySource::open(path)
        .with_context(|| format!("cannot open detections {}", path.display()))?;
    let mut engine = FlowEngine::from_config(camera, config, sink)?;

    let (frames, worker) =
        spawn_detection_worker(source, ReplayDetector, config.queue_capacity, cancel.clone());
    let summary = engine.run_queue(frames, cancel, config.read_timeout());

    let read = worker
        .join()
        .map_err(|_| anyhow!("detection worker for `{}` panicked", camera.id))?
        .with_context(|| format!("failed reading detections for `{}`", camera.id))?;
    info!(camera = %camera.id, frames = read, "detection stream closed");
    Ok(summary)
}

fn latest(path: &Path, camera: Option<&str>) -> Result<()> {
    let record = metrics::read_latest(path, camera)
        .with_context(|| format!("cannot read metrics {}", path.display()))?;
    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no metrics recorded yet"),
    }
    Ok(())
}

fn evaluate(ground_truth: &Path, predicted: &Path) -> Result<()> {
    let truth = metrics::read_records(ground_truth)
        .with_context(|| format!("cannot read ground truth {}", ground_truth.display()))?;
    let predicted_records = metrics::read_records(predicted)
        .with_context(|| format!("cannot read predictions {}", predicted.display()))?;

    let accuracy = metrics::evaluate_counts(&truth, &predicted_records)
        .ok_or_else(|| anyhow!("no records share a timestamp and camera"))?;
    println!("samples: {}", accuracy.samples);
    println!("MAE:     {:.3}", accuracy.mae);
    println!("RMSE:    {:.3}", accuracy.rmse);
    Ok(())
}
