//! Feature extraction modules
//!
//! This module contains the per-frame signal stages:
//! - Spectral analysis (STFT magnitude, harmonic suppression)
//! - Chroma extraction
//! - Chord template matching

pub mod chord;
pub mod chroma;
pub mod spectral;
