//! Chord templates
//!
//! Defines the 25-entry template bank: 12 major triads, 12 minor triads and
//! one no-chord profile. Templates are stored relative to a C root and rotated
//! for the other 11 roots.
//!
//! Bank order is fixed and doubles as the tie-break order of the matcher:
//! major C..B, minor C..B, no-chord last.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::analysis::result::Chord;
use crate::error::AnalysisError;
use crate::features::chroma::NUM_PITCH_CLASSES;

/// Number of templates in the bank
pub const NUM_CHORDS: usize = 25;

/// Root-relative template weights supplied by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateWeights {
    /// Major triad profile rooted on C (root, major third, fifth)
    pub major: [f32; NUM_PITCH_CLASSES],

    /// Minor triad profile rooted on C (root, minor third, fifth)
    pub minor: [f32; NUM_PITCH_CLASSES],

    /// No-chord profile (flat: matches diffuse, non-tonal energy)
    pub no_chord: [f32; NUM_PITCH_CLASSES],
}

impl Default for TemplateWeights {
    fn default() -> Self {
        Self {
            major: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            minor: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            no_chord: [1.0; NUM_PITCH_CLASSES],
        }
    }
}

impl TemplateWeights {
    /// Weights must be finite, non-negative and not all zero
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, weights) in [
            ("major", &self.major),
            ("minor", &self.minor),
            ("no_chord", &self.no_chord),
        ] {
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(AnalysisError::InvalidInput(format!(
                    "{} template weights must be finite and >= 0",
                    name
                )));
            }
            if weights.iter().all(|&w| w == 0.0) {
                return Err(AnalysisError::InvalidInput(format!(
                    "{} template weights are all zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// The 25 chord templates with precomputed squared norms
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTemplateBank {
    templates: Vec<[f32; NUM_PITCH_CLASSES]>,
    norms_sq: Vec<f32>,
}

static STANDARD_BANK: OnceLock<ChordTemplateBank> = OnceLock::new();

impl ChordTemplateBank {
    /// Build the bank by rotating the root-relative weights through all roots
    pub fn new(weights: &TemplateWeights) -> Result<Self, AnalysisError> {
        weights.validate()?;
        Ok(Self::build(weights))
    }

    /// Process-wide bank built from the default weights
    pub fn standard() -> &'static ChordTemplateBank {
        STANDARD_BANK.get_or_init(|| Self::build(&TemplateWeights::default()))
    }

    fn build(weights: &TemplateWeights) -> Self {
        let mut templates = Vec::with_capacity(NUM_CHORDS);
        for profile in [&weights.major, &weights.minor] {
            for root in 0..NUM_PITCH_CLASSES {
                templates.push(rotate(profile, root));
            }
        }
        templates.push(weights.no_chord);

        let norms_sq = templates
            .iter()
            .map(|t| t.iter().map(|w| w * w).sum())
            .collect();

        Self {
            templates,
            norms_sq,
        }
    }

    /// Number of templates (always 25)
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template by bank index
    pub fn get(&self, index: usize) -> &[f32; NUM_PITCH_CLASSES] {
        &self.templates[index]
    }

    /// Template of a chord
    pub fn template(&self, chord: Chord) -> &[f32; NUM_PITCH_CLASSES] {
        &self.templates[chord.index()]
    }

    /// Squared Euclidean norm of a template
    pub fn norm_sq(&self, index: usize) -> f32 {
        self.norms_sq[index]
    }

    /// Iterate `(chord, template)` in bank order
    pub fn iter(&self) -> impl Iterator<Item = (Chord, &[f32; NUM_PITCH_CLASSES])> + '_ {
        self.templates
            .iter()
            .enumerate()
            .filter_map(|(i, t)| Chord::from_index(i).map(|c| (c, t)))
    }
}

/// Shift a C-rooted profile up by `root` semitones
fn rotate(profile: &[f32; NUM_PITCH_CLASSES], root: usize) -> [f32; NUM_PITCH_CLASSES] {
    let mut out = [0.0f32; NUM_PITCH_CLASSES];
    for (pc, &w) in profile.iter().enumerate() {
        out[(pc + root) % NUM_PITCH_CLASSES] = w;
    }
    out
}
