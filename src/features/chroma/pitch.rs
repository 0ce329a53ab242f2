//! Pitch classes and equal-tempered note frequencies

/// Number of pitch classes per octave
pub const NUM_PITCH_CLASSES: usize = 12;

/// Pitch class names in canonical order (C = 0)
pub const PITCH_CLASS_NAMES: [&str; NUM_PITCH_CLASSES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number of A4
pub const A4_MIDI: u8 = 69;

/// Equal-tempered frequency of a MIDI note
///
/// `freq = reference_pitch_hz * 2^((midi - 69) / 12)`
///
/// # Example
///
/// ```
/// use chordscan::features::chroma::midi_to_hz;
///
/// assert_eq!(midi_to_hz(69, 440.0), 440.0);
/// assert!((midi_to_hz(60, 440.0) - 261.6256).abs() < 1e-3);
/// ```
pub fn midi_to_hz(midi: u8, reference_pitch_hz: f32) -> f32 {
    reference_pitch_hz * 2f32.powf((midi as f32 - A4_MIDI as f32) / 12.0)
}

/// Pitch class of a MIDI note (0 = C)
pub fn pitch_class(midi: u8) -> usize {
    midi as usize % NUM_PITCH_CLASSES
}

/// Name of a pitch class, wrapping indices above 11
pub fn pitch_class_name(index: usize) -> &'static str {
    PITCH_CLASS_NAMES[index % NUM_PITCH_CLASSES]
}
