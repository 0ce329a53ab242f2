//! chordscan command line
//!
//! Usage:
//!   chordscan file <path> [--json] [--config cfg.json]
//!   chordscan batch [--jobs N] [--json] <file1> <file2> ...
//!   chordscan devices
//!   chordscan listen [--device N]          (feature `microphone`)

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use chordscan::analysis::report::{format_chords, format_segments, format_weights};
use chordscan::io::decode_audio;
use chordscan::{detect_chords, AnalysisConfig, ChordAnalysis, ChordSegment};

#[derive(Parser)]
#[command(name = "chordscan")]
#[command(about = "Chord recognition from audio files and live input")]
#[command(version)]
struct Cli {
    /// JSON file overriding analysis defaults (missing fields keep their default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one audio file and print the detected chord sequence
    File {
        /// Audio file (WAV, FLAC, MP3, AAC, ALAC)
        path: PathBuf,

        /// Emit the full analysis as JSON
        #[arg(long)]
        json: bool,

        /// Print merged chord segments instead of per-frame chords
        #[arg(long)]
        segments: bool,
    },

    /// Analyse many files in parallel
    Batch {
        /// Audio files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Parallel workers (default: CPU-1)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Emit one JSON object per line (JSONL)
        #[arg(long)]
        json: bool,
    },

    /// List audio input devices
    Devices,

    /// Print live chord detections from an input device until Enter is pressed
    Listen {
        /// Input device index from `chordscan devices` (default input if omitted)
        #[arg(short, long)]
        device: Option<usize>,

        /// Show the chroma bar view for every report
        #[arg(long)]
        bars: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: AnalysisConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn analyze_path(path: &Path, config: &AnalysisConfig) -> Result<ChordAnalysis> {
    let (samples, sample_rate) =
        decode_audio(path).with_context(|| format!("decoding {}", path.display()))?;
    let analysis = detect_chords(&samples, sample_rate, config.clone())
        .with_context(|| format!("analysing {}", path.display()))?;
    Ok(analysis)
}

fn run_file(path: &Path, json: bool, segments: bool, config: AnalysisConfig) -> Result<()> {
    let analysis = analyze_path(path, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let meta = &analysis.metadata;
    println!("File: {}", path.display());
    println!(
        "  {:.2}s at {} Hz, {} frames (window {}, hop {}), {:.1} ms",
        meta.duration_seconds,
        meta.sample_rate,
        meta.frames,
        meta.window_size,
        meta.hop_size,
        meta.processing_time_ms
    );

    if segments {
        print!("{}", format_segments(&analysis.segments()));
    } else {
        println!("Detected chords: {}", format_chords(&analysis.detections));
        println!("Detected weights: {}", format_weights(&analysis.detections));
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchItem {
    file: String,
    ok: bool,
    frames: usize,
    processing_time_ms: f32,
    segments: Vec<ChordSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_batch(paths: &[PathBuf], jobs: Option<usize>, json: bool, config: AnalysisConfig) -> Result<()> {
    let jobs = jobs.map(|j| j.max(1)).unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("building thread pool")?;

    let items: Vec<BatchItem> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let file = path.display().to_string();
                match analyze_path(path, &config) {
                    Ok(analysis) => BatchItem {
                        file,
                        ok: true,
                        frames: analysis.metadata.frames,
                        processing_time_ms: analysis.metadata.processing_time_ms,
                        segments: analysis.segments(),
                        error: None,
                    },
                    Err(e) => BatchItem {
                        file,
                        ok: false,
                        frames: 0,
                        processing_time_ms: 0.0,
                        segments: Vec::new(),
                        error: Some(format!("{:#}", e)),
                    },
                }
            })
            .collect()
    });

    let failed = items.iter().filter(|i| !i.ok).count();
    for item in &items {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else if let Some(err) = &item.error {
            println!("{}: FAILED ({})", item.file, err);
        } else {
            let chords: Vec<String> = item.segments.iter().map(|s| s.chord.name()).collect();
            println!(
                "{}: {} segments [{}] ({:.1} ms)",
                item.file,
                item.segments.len(),
                chords.join(" "),
                item.processing_time_ms
            );
        }
    }

    eprintln!(
        "Batch done: {} ok, {} failed in {:.2}s",
        items.len() - failed,
        failed,
        t0.elapsed().as_secs_f32()
    );
    Ok(())
}

#[cfg(feature = "microphone")]
fn run_devices() -> Result<()> {
    let devices = chordscan::streaming::capture::list_input_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for d in devices {
        println!(
            "{:>3}{} {}  ({} Hz, {} ch)",
            d.index,
            if d.is_default { "*" } else { " " },
            d.name,
            d.default_sample_rate.map_or("?".to_string(), |r| r.to_string()),
            d.channels.map_or("?".to_string(), |c| c.to_string())
        );
    }
    Ok(())
}

#[cfg(feature = "microphone")]
fn run_listen(device: Option<usize>, bars: bool, config: AnalysisConfig) -> Result<()> {
    use chordscan::analysis::report::render_chroma_bars;
    use chordscan::streaming::capture::LiveCapture;
    use std::time::Duration;

    let capture = LiveCapture::start(device, config)?;
    println!(
        "Listening on '{}' at {} Hz. Press Enter to stop.",
        capture.device_name(),
        capture.sample_rate()
    );

    let mailbox = capture.mailbox();
    let failures = capture.failures();
    let printer = std::thread::spawn(move || {
        let mut seen = 0;
        let mut seen_failure = 0;
        while !mailbox.is_closed() {
            let update = mailbox.wait_newer(seen, Duration::from_millis(250));

            if let Some((generation, failure)) = failures.wait_newer(seen_failure, Duration::ZERO) {
                eprintln!(
                    "[{:>5}] block skipped: {}",
                    failure.block_index, failure.error
                );
                seen_failure = generation;
            }

            let Some((generation, update)) = update else {
                continue;
            };
            seen = generation;
            if bars {
                print!("{}", render_chroma_bars(&update.chroma()));
            }
            println!(
                "[{:>5}] {:<4} {:.2}",
                update.block_index, update.detection.chord, update.detection.confidence
            );
        }
    });

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).context("reading stdin")?;

    capture.stop();
    if printer.join().is_err() {
        log::error!("Printer thread panicked");
    }
    Ok(())
}

#[cfg(not(feature = "microphone"))]
fn run_devices() -> Result<()> {
    anyhow::bail!("built without the `microphone` feature")
}

#[cfg(not(feature = "microphone"))]
fn run_listen(_device: Option<usize>, _bars: bool, _config: AnalysisConfig) -> Result<()> {
    anyhow::bail!("built without the `microphone` feature")
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::File {
            path,
            json,
            segments,
        } => run_file(&path, json, segments, config),
        Command::Batch { paths, jobs, json } => run_batch(&paths, jobs, json, config),
        Command::Devices => run_devices(),
        Command::Listen { device, bars } => run_listen(device, bars, config),
    }
}
