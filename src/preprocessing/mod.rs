//! Audio preprocessing modules
//!
//! Everything downstream expects mono `f32` samples; this module turns
//! decoder and device output into that shape.

pub mod channel_mixer;
