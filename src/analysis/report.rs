//! Plain-text reports for the presentation layer
//!
//! Formatting only; nothing here feeds back into the analysis.

use super::result::{ChordDetection, ChordSegment};
use crate::features::chroma::{NUM_PITCH_CLASSES, PITCH_CLASS_NAMES};

/// Bar characters per unit of chroma energy
const BAR_SCALE: f32 = 5000.0;

/// Longest bar drawn, in characters
const MAX_BAR_WIDTH: usize = 60;

/// One line per pitch class: name, energy in percent and a `#` bar
///
/// # Example
///
/// ```
/// use chordscan::analysis::report::render_chroma_bars;
///
/// let mut column = [0.0f32; 12];
/// column[9] = 0.002;
/// let text = render_chroma_bars(&column);
/// assert!(text.lines().nth(9).unwrap().ends_with("##########"));
/// ```
pub fn render_chroma_bars(column: &[f32; NUM_PITCH_CLASSES]) -> String {
    let mut out = String::new();
    for (name, &value) in PITCH_CLASS_NAMES.iter().zip(column) {
        let width = ((BAR_SCALE * value.max(0.0)) as usize).min(MAX_BAR_WIDTH);
        out.push_str(&format!(
            "{:<2}\t{:>7.3}\t| {}\n",
            name,
            100.0 * value,
            "#".repeat(width)
        ));
    }
    out
}

/// Space-separated chord names
pub fn format_chords(detections: &[ChordDetection]) -> String {
    detections
        .iter()
        .map(|d| d.chord.name())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Space-separated confidences with two decimals
pub fn format_weights(detections: &[ChordDetection]) -> String {
    detections
        .iter()
        .map(|d| format!("{:.2}", d.confidence))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per segment: `start - end  chord  (confidence)`
pub fn format_segments(segments: &[ChordSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&format!(
            "{:>8.2}s - {:>8.2}s  {:<4} ({:.2})\n",
            seg.start,
            seg.end,
            seg.chord.name(),
            seg.mean_confidence
        ));
    }
    out
}
