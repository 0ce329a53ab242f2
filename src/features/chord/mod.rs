//! Chord recognition modules
//!
//! Identify the sounding chord per frame using:
//! - A fixed 25-entry template bank (12 major, 12 minor, no-chord)
//! - Cosine-similarity template matching

pub mod matcher;
pub mod templates;

pub use matcher::{compute_chordgram, cosine_similarity, ChordMatcher, Chordgram};
pub use templates::{ChordTemplateBank, TemplateWeights, NUM_CHORDS};
