//! Real-time chord recognition
//!
//! - [`StreamingAdapter`]: fixed-size blocks in, reportable results out
//! - [`LatestMailbox`]: single-slot hand-off from the capture thread to a consumer
//! - `capture` (feature `microphone`): cpal input stream driving the adapter

pub mod adapter;
pub mod mailbox;

#[cfg(feature = "microphone")]
pub mod capture;

pub use adapter::{
    is_reportable, BlockFailure, BlockOutcome, LiveUpdate, StreamStats, StreamingAdapter,
};
pub use mailbox::LatestMailbox;
