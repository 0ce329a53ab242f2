//! Audio I/O modules
//!
//! File decoding using Symphonia and block accumulation for live input.

pub mod decoder;
pub mod sample_buffer;

pub use decoder::decode_audio;
pub use sample_buffer::SampleBuffer;
