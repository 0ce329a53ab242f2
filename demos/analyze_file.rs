//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <audio-file>

use chordscan::analysis::report::{format_segments, render_chroma_bars};
use chordscan::io::decode_audio;
use chordscan::{detect_chords, AnalysisConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: analyze_file <audio-file>")?;

    let (samples, sample_rate) = decode_audio(&path)?;
    let analysis = detect_chords(&samples, sample_rate, AnalysisConfig::default())?;

    println!("Analysis Results:");
    println!("  Duration: {:.2}s", analysis.metadata.duration_seconds);
    println!("  Frames: {}", analysis.metadata.frames);
    println!("  Processing time: {:.2} ms", analysis.metadata.processing_time_ms);
    println!();
    print!("{}", format_segments(&analysis.segments()));

    // Chroma of the most confident frame
    if let Some((frame, best)) = analysis
        .detections
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.confidence.total_cmp(&b.1.confidence))
    {
        println!();
        println!("Strongest frame: {:.2}s {} ({:.2})", analysis.times[frame], best.chord, best.confidence);
        print!("{}", render_chroma_bars(&analysis.chromagram.column(frame)));
    }

    Ok(())
}
