//! Chord template matching
//!
//! Scores every chromagram frame against every template of the bank with
//! cosine similarity and keeps the best match per frame.
//!
//! # Algorithm
//!
//! ```text
//! score(frame, t) = dot(chroma, t) / (|chroma| * |t|)      (0 / 0 = 0)
//! best(frame)     = argmax_t score(frame, t)               (lowest index on ties)
//! ```
//!
//! # Example
//!
//! ```
//! use chordscan::features::chord::ChordMatcher;
//! use chordscan::features::chroma::Chromagram;
//! use chordscan::analysis::result::Chord;
//!
//! let mut frame = [0.0f32; 12];
//! frame[0] = 1.0; // C
//! frame[4] = 1.0; // E
//! frame[7] = 1.0; // G
//! let chroma = Chromagram::from_frames(&[frame]);
//!
//! let (chordgram, detections) = ChordMatcher::standard().match_chromagram(&chroma);
//! assert_eq!(detections[0].chord, Chord::Major(0));
//! assert_eq!(chordgram.frames(), 1);
//! ```

use serde::{Deserialize, Serialize};

use super::templates::{ChordTemplateBank, NUM_CHORDS};
use crate::analysis::result::{Chord, ChordDetection};
use crate::error::AnalysisError;
use crate::features::chroma::{Chromagram, NUM_PITCH_CLASSES};
use crate::features::spectral::SpectralMatrix;

/// Similarity scores over time: 25 rows (bank order) by frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChordgramParts")]
pub struct Chordgram {
    scores: SpectralMatrix,
}

#[derive(Deserialize)]
struct ChordgramParts {
    scores: SpectralMatrix,
}

impl TryFrom<ChordgramParts> for Chordgram {
    type Error = AnalysisError;

    fn try_from(parts: ChordgramParts) -> Result<Self, Self::Error> {
        Self::from_matrix(parts.scores)
    }
}

impl Chordgram {
    /// Wrap a 25-row score matrix
    pub fn from_matrix(scores: SpectralMatrix) -> Result<Self, AnalysisError> {
        if scores.rows() != NUM_CHORDS {
            return Err(AnalysisError::InvalidInput(format!(
                "Chordgram must have {} rows, got {}",
                NUM_CHORDS,
                scores.rows()
            )));
        }
        Ok(Self { scores })
    }

    /// Number of time frames
    pub fn frames(&self) -> usize {
        self.scores.cols()
    }

    /// Scores of all 25 templates for one frame
    pub fn column(&self, frame: usize) -> [f32; NUM_CHORDS] {
        let mut out = [0.0f32; NUM_CHORDS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.scores.get(i, frame);
        }
        out
    }

    /// Score of one chord at one frame
    pub fn score(&self, chord: Chord, frame: usize) -> f32 {
        self.scores.get(chord.index(), frame)
    }

    /// Underlying 25 x frames matrix
    pub fn as_matrix(&self) -> &SpectralMatrix {
        &self.scores
    }
}

/// Cosine similarity with `0 / 0 = 0`, clamped to `[-1, 1]`
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum();
    let norm_b: f32 = b.iter().map(|x| x * x).sum();
    similarity_from_parts(dot, norm_a, norm_b)
}

fn similarity_from_parts(dot: f32, norm_sq_a: f32, norm_sq_b: f32) -> f32 {
    let denom = (norm_sq_a * norm_sq_b).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Template matcher over a chord bank
#[derive(Debug, Clone)]
pub struct ChordMatcher {
    bank: ChordTemplateBank,
}

impl ChordMatcher {
    /// Matcher over a custom bank
    pub fn new(bank: ChordTemplateBank) -> Self {
        Self { bank }
    }

    /// Matcher over the default bank
    pub fn standard() -> Self {
        Self::new(ChordTemplateBank::standard().clone())
    }

    /// The bank in use
    pub fn bank(&self) -> &ChordTemplateBank {
        &self.bank
    }

    /// Score one 12-element profile against every template
    pub fn score_frame(&self, chroma: &[f32; NUM_PITCH_CLASSES]) -> [f32; NUM_CHORDS] {
        let chroma_norm_sq: f32 = chroma.iter().map(|x| x * x).sum();
        let mut scores = [0.0f32; NUM_CHORDS];
        for (i, score) in scores.iter_mut().enumerate() {
            let template = self.bank.get(i);
            let dot: f32 = chroma.iter().zip(template).map(|(x, w)| x * w).sum();
            *score = similarity_from_parts(dot, chroma_norm_sq, self.bank.norm_sq(i));
        }
        scores
    }

    /// Pick the best-scoring chord; ties go to the lowest bank index
    pub fn best_match(scores: &[f32; NUM_CHORDS]) -> ChordDetection {
        let mut best_idx = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best_idx] {
                best_idx = i;
            }
        }
        ChordDetection {
            chord: Chord::from_index(best_idx).unwrap_or(Chord::NoChord),
            confidence: scores[best_idx],
        }
    }

    /// Score every frame, returning the chordgram and per-frame detections
    pub fn match_chromagram(&self, chroma: &Chromagram) -> (Chordgram, Vec<ChordDetection>) {
        let n_frames = chroma.frames();
        log::debug!("Matching {} chroma frames against {} templates", n_frames, self.bank.len());

        let mut scores = SpectralMatrix::zeros(NUM_CHORDS, n_frames);
        let mut detections = Vec::with_capacity(n_frames);

        for frame in 0..n_frames {
            let column = self.score_frame(&chroma.column(frame));
            for (i, &s) in column.iter().enumerate() {
                scores.set(i, frame, s);
            }
            detections.push(Self::best_match(&column));
        }

        (Chordgram { scores }, detections)
    }
}

/// One-shot chord matching against the default bank
pub fn compute_chordgram(chroma: &Chromagram) -> (Chordgram, Vec<ChordDetection>) {
    ChordMatcher::standard().match_chromagram(chroma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chord::TemplateWeights;

    fn frame(notes: &[(usize, f32)]) -> [f32; 12] {
        let mut f = [0.0f32; 12];
        for &(pc, v) in notes {
            f[pc] = v;
        }
        f
    }

    #[test]
    fn test_self_match_is_maximal() {
        let matcher = ChordMatcher::standard();
        let c_major = *matcher.bank().template(Chord::Major(0));
        let (chordgram, detections) = matcher.match_chromagram(&Chromagram::from_frames(&[c_major]));

        assert_eq!(detections[0].chord, Chord::Major(0));
        assert!((detections[0].confidence - 1.0).abs() < 1e-6);
        assert_eq!(chordgram.score(Chord::Major(0), 0), detections[0].confidence);
    }

    #[test]
    fn test_every_template_matches_itself() {
        let matcher = ChordMatcher::standard();
        for (chord, template) in matcher.bank().iter() {
            let detection = ChordMatcher::best_match(&matcher.score_frame(template));
            assert_eq!(detection.chord, chord);
        }
    }

    #[test]
    fn test_minor_triad() {
        // A, C, E with uneven levels
        let chroma = Chromagram::from_frames(&[frame(&[(9, 0.9), (0, 0.5), (4, 0.6)])]);
        let (_, detections) = compute_chordgram(&chroma);
        assert_eq!(detections[0].chord, Chord::Minor(9));
        assert_eq!(detections[0].chord.name(), "Am");
    }

    #[test]
    fn test_flat_profile_is_no_chord() {
        let chroma = Chromagram::from_frames(&[[0.2f32; 12]]);
        let (_, detections) = compute_chordgram(&chroma);
        assert_eq!(detections[0].chord, Chord::NoChord);
        assert!((detections[0].confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_scores_zero_without_nan() {
        let chroma = Chromagram::from_frames(&[[0.0f32; 12], [0.0f32; 12]]);
        let (chordgram, detections) = compute_chordgram(&chroma);

        assert!(chordgram.as_matrix().as_slice().iter().all(|&s| s == 0.0));
        for d in &detections {
            // All scores tie at zero: lowest bank index wins
            assert_eq!(d.chord, Chord::Major(0));
            assert_eq!(d.confidence, 0.0);
        }
    }

    #[test]
    fn test_scores_bounded_and_shape() {
        let frames: Vec<[f32; 12]> = (0..8)
            .map(|i| {
                let mut f = [0.0f32; 12];
                for (pc, v) in f.iter_mut().enumerate() {
                    *v = ((pc * 31 + i * 17) % 11) as f32 / 10.0;
                }
                f
            })
            .collect();
        let (chordgram, detections) = compute_chordgram(&Chromagram::from_frames(&frames));

        assert_eq!(chordgram.as_matrix().shape(), (25, 8));
        assert_eq!(detections.len(), 8);
        for frame in 0..8 {
            let column = chordgram.column(frame);
            assert!(column.iter().all(|s| (-1.0..=1.0).contains(s) && !s.is_nan()));
            let max = column.iter().cloned().fold(f32::MIN, f32::max);
            assert_eq!(detections[frame].confidence, max);
            assert_eq!(chordgram.score(detections[frame].chord, frame), max);
        }
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let mut scores = [0.5f32; NUM_CHORDS];
        scores[3] = 0.9;
        scores[15] = 0.9;
        let detection = ChordMatcher::best_match(&scores);
        assert_eq!(detection.chord, Chord::Major(3));
    }

    #[test]
    fn test_custom_bank() {
        let weights = TemplateWeights {
            major: [1.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
            ..Default::default()
        };
        let matcher = ChordMatcher::new(ChordTemplateBank::new(&weights).unwrap());
        let scores = matcher.score_frame(&frame(&[(2, 1.0), (6, 0.8), (9, 0.9)]));
        assert_eq!(ChordMatcher::best_match(&scores).chord, Chord::Major(2));
    }

    #[test]
    fn test_json_rejects_wrong_row_count() {
        let (chordgram, _) = compute_chordgram(&Chromagram::from_frames(&[[0.3f32; 12]]));
        let json = serde_json::to_string(&chordgram).unwrap();
        assert_eq!(serde_json::from_str::<Chordgram>(&json).unwrap(), chordgram);

        let twelve = format!(
            r#"{{"scores":{}}}"#,
            serde_json::to_string(&SpectralMatrix::zeros(12, 1)).unwrap()
        );
        assert!(serde_json::from_str::<Chordgram>(&twelve).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
