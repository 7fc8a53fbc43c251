use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use microswing_rs::ingest;
use microswing_rs::synth::{self, SampleClock, SwingAxis};
use microswing_rs::{
    AutoStartTrigger, MeasurementConfig, MeasurementController, MeasurementError,
    MeasurementStatus, MotionModelKind, SensorSample,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recording (.json or .json.gz) with a top-level "samples" array
    #[arg(long, conflicts_with = "synthetic")]
    log: Option<PathBuf>,

    /// Generate a sine swing instead of reading a recording
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Synthetic swing amplitude (mm for the acceleration model, degrees otherwise)
    #[arg(long, default_value = "5.0")]
    synth_amplitude: f64,

    /// Synthetic swing frequency (Hz)
    #[arg(long, default_value = "1.0")]
    synth_freq: f64,

    /// Synthetic swing length after a 1 s rest (seconds)
    #[arg(long, default_value = "12.0")]
    synth_seconds: f64,

    /// Synthetic sample rate (Hz)
    #[arg(long, default_value = "50.0")]
    synth_rate: f64,

    /// Measurement config JSON (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target duration in seconds (defaults to the config value)
    #[arg(long)]
    duration: Option<f64>,

    /// Pace samples by their timestamps instead of replaying as fast as possible
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Wait for platform motion before starting the measurement
    #[arg(long, default_value_t = false)]
    autostart: bool,

    /// Ingest queue capacity
    #[arg(long, default_value = "512")]
    queue: usize,

    /// Write the full result (including samples) to this JSON file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Recording {
    samples: Vec<SensorSample>,
}

fn load_recording(path: &Path) -> anyhow::Result<Vec<SensorSample>> {
    let file = File::open(path)?;
    let recording: Recording = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))?
    } else {
        serde_json::from_reader(BufReader::new(file))?
    };
    Ok(recording.samples)
}

fn synthetic_samples(args: &Args, model: MotionModelKind) -> Vec<SensorSample> {
    // One second at rest so calibration sees a still sensor
    let lead_in = args.synth_rate.round() as usize;
    let count = (args.synth_seconds * args.synth_rate).round() as usize;
    let swing_clock = SampleClock::new(args.synth_rate, count).starting_at(1.0);
    let rest_clock = SampleClock::new(args.synth_rate, lead_in);

    let (mut samples, swing) = match model {
        MotionModelKind::Acceleration => (
            synth::constant_accel(rest_clock, 0.0, 0.0),
            synth::sine_accel(swing_clock, SwingAxis::X, args.synth_amplitude, args.synth_freq),
        ),
        MotionModelKind::Angle | MotionModelKind::Gyro => (
            synth::stationary(rest_clock, (0.0, 0.0)),
            synth::sine_angle(swing_clock, SwingAxis::X, args.synth_amplitude, args.synth_freq),
        ),
    };
    samples.extend(swing);
    samples
}

fn load_samples(args: &Args, model: MotionModelKind) -> anyhow::Result<Vec<SensorSample>> {
    if let Some(path) = args.log.as_ref() {
        return load_recording(path);
    }
    if args.synthetic {
        return Ok(synthetic_samples(args, model));
    }
    anyhow::bail!("Provide --log or --synthetic");
}

/// Feed samples into the channel, optionally at their recorded pace.
async fn reader_task(samples: Vec<SensorSample>, tx: mpsc::Sender<SensorSample>, realtime: bool) {
    let mut prev_ts: Option<f64> = None;
    for sample in samples {
        if realtime {
            if let Some(prev) = prev_ts {
                let dt = sample.timestamp - prev;
                if dt > 0.0 && dt.is_finite() {
                    sleep(Duration::from_secs_f64(dt)).await;
                }
            }
            prev_ts = Some(sample.timestamp);
        }
        if tx.send(sample).await.is_err() {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => MeasurementConfig::from_json_file(path)?,
        None => MeasurementConfig::default(),
    };
    let duration = args.duration.unwrap_or(config.measurement_duration_sec);
    let model = config.motion_model;
    let samples = load_samples(&args, model)?;
    let total = samples.len();
    eprintln!("[REPLAY] {} samples, {:?} model, target {:.1}s", total, model, duration);

    let mut trigger = AutoStartTrigger::new(&config);
    let controller = MeasurementController::new(config)?;
    let handle = ingest::spawn(controller, args.queue)?;

    let mut started = false;
    if args.autostart {
        trigger.arm();
    } else {
        handle.start(duration)?;
        started = true;
    }

    let (tx, mut rx) = mpsc::channel::<SensorSample>(args.queue.max(1));
    let reader = tokio::spawn(reader_task(samples, tx, args.realtime));

    let mut retries = 0u64;
    while let Some(sample) = rx.recv().await {
        if !started {
            if !trigger.update(&sample) {
                continue;
            }
            eprintln!("[REPLAY] motion detected at t={:.2}s", sample.timestamp);
            handle.start(duration)?;
            started = true;
        }

        loop {
            match handle.push_sample(sample) {
                Ok(()) => break,
                Err(MeasurementError::QueueFull) => {
                    retries += 1;
                    sleep(Duration::from_millis(1)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if handle.state().status == MeasurementStatus::Complete {
            break;
        }
    }
    drop(rx);
    reader.await?;

    let pending = handle.pending();
    if pending > 0 {
        eprintln!("[REPLAY] {} queued commands still draining", pending);
    }

    handle.stop(false)?;
    let controller = handle.shutdown()?;
    if retries > 0 {
        eprintln!("[REPLAY] queue full {} times", retries);
    }

    let Some(result) = controller.state().result else {
        anyhow::bail!("No measurement result (autostart never triggered or no samples measured)");
    };

    if let Some(path) = args.output.as_ref() {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &result)?;
        eprintln!("[REPLAY] result written to {}", path.display());
    }

    let summary = json!({
        "session_id": result.session_id,
        "recorded_at": result.recorded_at.to_rfc3339(),
        "model": model,
        "input_samples": total,
        "measured_samples": result.samples.len(),
        "duration_sec": result.duration_sec,
        "stability": result.metrics.stability,
        "oscillation_frequency_hz": result.metrics.oscillation_frequency,
        "coordination_factor": result.metrics.coordination_factor,
        "is_valid": result.is_valid,
        "validation_message": result.validation_message,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
