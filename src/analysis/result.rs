//! Analysis result types

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;
use crate::features::chord::Chordgram;
use crate::features::chroma::{Chromagram, PITCH_CLASS_NAMES};

/// Chord label recognised by the template bank
///
/// Labels compare by bank position, so a root outside `0..12` built in code
/// equals its reduced form. Deserialization rejects such roots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "ChordLabel")]
pub enum Chord {
    /// Major triad (0 = C, 1 = C#, ..., 11 = B)
    Major(u8),
    /// Minor triad (0 = C, 1 = C#, ..., 11 = B)
    Minor(u8),
    /// No clear tonal content
    NoChord,
}

/// Wire form of [`Chord`], checked before conversion
#[derive(Deserialize)]
enum ChordLabel {
    Major(u8),
    Minor(u8),
    NoChord,
}

impl TryFrom<ChordLabel> for Chord {
    type Error = String;

    fn try_from(label: ChordLabel) -> Result<Self, Self::Error> {
        let check = |root: u8| {
            if root < 12 {
                Ok(root)
            } else {
                Err(format!("chord root {} outside 0..12", root))
            }
        };
        Ok(match label {
            ChordLabel::Major(root) => Chord::Major(check(root)?),
            ChordLabel::Minor(root) => Chord::Minor(check(root)?),
            ChordLabel::NoChord => Chord::NoChord,
        })
    }
}

impl PartialEq for Chord {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index()
    }
}

impl Eq for Chord {}

impl Hash for Chord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index().hash(state);
    }
}

impl Chord {
    /// Number of distinct labels (12 major + 12 minor + no-chord)
    pub const COUNT: usize = 25;

    /// Position in the template bank: major C..B, minor C..B, no-chord
    ///
    /// # Example
    ///
    /// ```
    /// use chordscan::analysis::result::Chord;
    ///
    /// assert_eq!(Chord::Major(0).index(), 0);
    /// assert_eq!(Chord::Minor(9).index(), 21);
    /// assert_eq!(Chord::NoChord.index(), 24);
    /// ```
    pub fn index(&self) -> usize {
        match self {
            Chord::Major(root) => *root as usize % 12,
            Chord::Minor(root) => 12 + *root as usize % 12,
            Chord::NoChord => 24,
        }
    }

    /// Inverse of [`Chord::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0..=11 => Some(Chord::Major(index as u8)),
            12..=23 => Some(Chord::Minor((index - 12) as u8)),
            24 => Some(Chord::NoChord),
            _ => None,
        }
    }

    /// All labels in bank order
    pub fn all() -> impl Iterator<Item = Chord> {
        (0..Self::COUNT).filter_map(Chord::from_index)
    }

    /// Chord name in American notation (e.g., "C", "F#", "Am", "C#m", "NC")
    ///
    /// # Example
    ///
    /// ```
    /// use chordscan::analysis::result::Chord;
    ///
    /// assert_eq!(Chord::Major(0).name(), "C");
    /// assert_eq!(Chord::Major(6).name(), "F#");
    /// assert_eq!(Chord::Minor(9).name(), "Am");
    /// assert_eq!(Chord::NoChord.name(), "NC");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Chord::Major(root) => PITCH_CLASS_NAMES[*root as usize % 12].to_string(),
            Chord::Minor(root) => format!("{}m", PITCH_CLASS_NAMES[*root as usize % 12]),
            Chord::NoChord => "NC".to_string(),
        }
    }

    /// Parse a name produced by [`Chord::name`]
    ///
    /// # Example
    ///
    /// ```
    /// use chordscan::analysis::result::Chord;
    ///
    /// assert_eq!(Chord::from_name("G"), Some(Chord::Major(7)));
    /// assert_eq!(Chord::from_name("D#m"), Some(Chord::Minor(3)));
    /// assert_eq!(Chord::from_name("NC"), Some(Chord::NoChord));
    /// assert_eq!(Chord::from_name("H"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "NC" {
            return Some(Chord::NoChord);
        }

        let (root_name, minor) = match name.strip_suffix('m') {
            Some(root) => (root, true),
            None => (name, false),
        };

        let root = PITCH_CLASS_NAMES.iter().position(|&n| n == root_name)? as u8;
        Some(if minor {
            Chord::Minor(root)
        } else {
            Chord::Major(root)
        })
    }

    /// Root pitch class, `None` for no-chord
    pub fn root(&self) -> Option<u8> {
        match self {
            Chord::Major(root) | Chord::Minor(root) => Some(*root % 12),
            Chord::NoChord => None,
        }
    }

    /// Whether this is the no-chord label
    pub fn is_no_chord(&self) -> bool {
        matches!(self, Chord::NoChord)
    }

    /// Pitch classes of the triad (root, third, fifth)
    pub fn pitch_classes(&self) -> Option<[u8; 3]> {
        let (root, third) = match self {
            Chord::Major(root) => (*root % 12, 4),
            Chord::Minor(root) => (*root % 12, 3),
            Chord::NoChord => return None,
        };
        Some([root, (root + third) % 12, (root + 7) % 12])
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name())
    }
}

/// Best template match for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordDetection {
    /// Highest-scoring chord
    pub chord: Chord,

    /// Its cosine similarity score in [-1, 1]
    pub confidence: f32,
}

/// Run of consecutive frames carrying the same chord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSegment {
    /// Detected chord
    pub chord: Chord,

    /// Segment start in seconds
    pub start: f32,

    /// Segment end in seconds
    pub end: f32,

    /// Number of frames merged into the segment
    pub frames: usize,

    /// Mean confidence over the merged frames
    pub mean_confidence: f32,
}

/// Complete chord analysis of a sample buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordAnalysis {
    /// STFT bin frequencies in Hz
    pub frequencies: Vec<f32>,

    /// Frame centre times in seconds
    pub times: Vec<f32>,

    /// Pitch-class profile per frame
    pub chromagram: Chromagram,

    /// Template scores per frame
    pub chordgram: Chordgram,

    /// Best match per frame
    pub detections: Vec<ChordDetection>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl ChordAnalysis {
    /// Detected chord names, one per frame
    pub fn chord_names(&self) -> Vec<String> {
        self.detections.iter().map(|d| d.chord.name()).collect()
    }

    /// Merge consecutive identical detections into segments
    ///
    /// Segment bounds sit half a hop either side of the first and last frame
    /// centres, clamped at zero.
    pub fn segments(&self) -> Vec<ChordSegment> {
        let half_hop = self.metadata.hop_seconds() / 2.0;
        let mut segments: Vec<ChordSegment> = Vec::new();

        for (detection, &time) in self.detections.iter().zip(&self.times) {
            match segments.last_mut() {
                Some(seg) if seg.chord == detection.chord => {
                    let total = seg.mean_confidence * seg.frames as f32 + detection.confidence;
                    seg.frames += 1;
                    seg.mean_confidence = total / seg.frames as f32;
                    seg.end = time + half_hop;
                }
                _ => segments.push(ChordSegment {
                    chord: detection.chord,
                    start: (time - half_hop).max(0.0),
                    end: time + half_hop,
                    frames: 1,
                    mean_confidence: detection.confidence,
                }),
            }
        }

        segments
    }
}
