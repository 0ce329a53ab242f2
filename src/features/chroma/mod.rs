//! Chroma extraction modules
//!
//! Fold a magnitude spectrogram across octaves into 12 pitch-class rows:
//! - Pitch naming and MIDI-to-frequency conversion
//! - Chromagram construction

pub mod extractor;
pub mod pitch;

pub use extractor::{compute_chromagram, Chromagram, ChromagramBuilder};
pub use pitch::{midi_to_hz, NUM_PITCH_CLASSES, PITCH_CLASS_NAMES};
