//! Block-wise chord recognition for live input
//!
//! [`StreamingAdapter`] runs the full pipeline once per fixed-size block and
//! publishes reportable results to a [`LatestMailbox`]. A block is reportable
//! when its label is not no-chord and its chroma energy exceeds the
//! configured activity threshold.
//!
//! Per-block failures are logged, counted and published to a separate
//! failure mailbox; the adapter keeps going with the next block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::mailbox::LatestMailbox;
use crate::analysis::pipeline::ChordPipeline;
use crate::analysis::result::ChordDetection;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chord::{Chordgram, NUM_CHORDS};
use crate::features::chroma::{Chromagram, NUM_PITCH_CLASSES};
use crate::io::sample_buffer::SampleBuffer;

/// Result of one block, as published to the mailbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    /// Zero-based index of the block since the adapter started
    pub block_index: u64,

    /// Chromagram of the block
    pub chromagram: Chromagram,

    /// Template scores of the block
    pub chordgram: Chordgram,

    /// Best match of the newest frame
    pub detection: ChordDetection,

    /// Chroma column sum of the newest frame
    pub energy: f32,
}

impl LiveUpdate {
    /// Index of the frame the detection refers to
    pub fn frame(&self) -> usize {
        self.chromagram.frames().saturating_sub(1)
    }

    /// Chroma profile of the reported frame
    pub fn chroma(&self) -> [f32; NUM_PITCH_CLASSES] {
        self.chromagram.column(self.frame())
    }

    /// Template scores of the reported frame, bank order
    pub fn scores(&self) -> [f32; NUM_CHORDS] {
        self.chordgram.column(self.frame())
    }
}

/// A block the pipeline rejected
#[derive(Debug, Clone)]
pub struct BlockFailure {
    /// Zero-based index of the failed block
    pub block_index: u64,
    /// Why the block was rejected
    pub error: AnalysisError,
}

/// What happened to one block
#[derive(Debug, Clone)]
pub enum BlockOutcome {
    /// Published to the mailbox
    Reported(Arc<LiveUpdate>),
    /// Analysed but below the activity threshold or no-chord
    Suppressed(LiveUpdate),
    /// Analysis failed; the adapter continues with the next block
    Failed(AnalysisError),
}

/// Counters shared between the capture thread and observers
#[derive(Debug, Default)]
pub struct StreamCounters {
    blocks: AtomicU64,
    reported: AtomicU64,
    suppressed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`StreamCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Blocks processed
    pub blocks: u64,
    /// Blocks published
    pub reported: u64,
    /// Blocks analysed but not published
    pub suppressed: u64,
    /// Blocks that failed analysis
    pub failed: u64,
}

impl StreamCounters {
    /// Current counter values
    pub fn snapshot(&self) -> StreamStats {
        StreamStats {
            blocks: self.blocks.load(Ordering::Relaxed),
            reported: self.reported.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Whether a detection should reach the user
///
/// # Example
///
/// ```
/// use chordscan::analysis::result::{Chord, ChordDetection};
/// use chordscan::streaming::is_reportable;
///
/// let c = ChordDetection { chord: Chord::Major(0), confidence: 0.9 };
/// assert!(is_reportable(&c, 0.5, 0.01));
/// assert!(!is_reportable(&c, 0.005, 0.01));
///
/// let nc = ChordDetection { chord: Chord::NoChord, confidence: 0.9 };
/// assert!(!is_reportable(&nc, 0.5, 0.01));
/// ```
pub fn is_reportable(detection: &ChordDetection, energy: f32, activity_threshold: f32) -> bool {
    !detection.chord.is_no_chord() && energy > activity_threshold
}

/// Runs the chord pipeline on fixed-size blocks and publishes the newest result
#[derive(Debug)]
pub struct StreamingAdapter {
    pipeline: ChordPipeline,
    mailbox: Arc<LatestMailbox<LiveUpdate>>,
    failures: Arc<LatestMailbox<BlockFailure>>,
    counters: Arc<StreamCounters>,
    buffer: SampleBuffer,
}

impl StreamingAdapter {
    /// Build a pipeline for `sample_rate` and publish into a fresh mailbox
    ///
    /// # Errors
    ///
    /// Returns the pipeline construction error for an invalid configuration.
    pub fn new(sample_rate: u32, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let pipeline = ChordPipeline::new(sample_rate, config)?;
        Ok(Self::with_mailbox(pipeline, Arc::new(LatestMailbox::new())))
    }

    /// Wrap an existing pipeline and mailbox
    pub fn with_mailbox(pipeline: ChordPipeline, mailbox: Arc<LatestMailbox<LiveUpdate>>) -> Self {
        let buffer = SampleBuffer::new(pipeline.config().block_size);
        log::info!(
            "Streaming adapter ready: block size {} ({:.1} ms at {} Hz)",
            buffer.block_size(),
            buffer.block_size() as f32 * 1000.0 / pipeline.sample_rate() as f32,
            pipeline.sample_rate()
        );
        Self {
            pipeline,
            mailbox,
            failures: Arc::new(LatestMailbox::new()),
            counters: Arc::new(StreamCounters::default()),
            buffer,
        }
    }

    /// Mailbox receiving reportable updates
    pub fn mailbox(&self) -> Arc<LatestMailbox<LiveUpdate>> {
        Arc::clone(&self.mailbox)
    }

    /// Mailbox receiving the most recent block failure
    pub fn failures(&self) -> Arc<LatestMailbox<BlockFailure>> {
        Arc::clone(&self.failures)
    }

    /// Shared counters, readable from other threads
    pub fn counters(&self) -> Arc<StreamCounters> {
        Arc::clone(&self.counters)
    }

    /// Current counter values
    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }

    /// Samples per analysed block
    pub fn block_size(&self) -> usize {
        self.buffer.block_size()
    }

    /// Underlying pipeline
    pub fn pipeline(&self) -> &ChordPipeline {
        &self.pipeline
    }

    /// Analyse one complete block
    pub fn process_block(&mut self, block: &[f32]) -> BlockOutcome {
        let sinks = Sinks {
            updates: &self.mailbox,
            failures: &self.failures,
            counters: &self.counters,
        };
        handle_block(&self.pipeline, &sinks, block)
    }

    /// Accumulate mono samples of any length, analysing each completed block
    ///
    /// Returns the number of blocks analysed.
    pub fn push_samples(&mut self, samples: &[f32]) -> usize {
        let pipeline = &self.pipeline;
        let sinks = Sinks {
            updates: &self.mailbox,
            failures: &self.failures,
            counters: &self.counters,
        };
        self.buffer.push_with(samples, |block| {
            handle_block(pipeline, &sinks, block);
        })
    }
}

/// Where block results go
struct Sinks<'a> {
    updates: &'a LatestMailbox<LiveUpdate>,
    failures: &'a LatestMailbox<BlockFailure>,
    counters: &'a StreamCounters,
}

fn handle_block(pipeline: &ChordPipeline, sinks: &Sinks<'_>, block: &[f32]) -> BlockOutcome {
    let counters = sinks.counters;
    let block_index = counters.blocks.fetch_add(1, Ordering::Relaxed);

    let update = match analyze_block(pipeline, block, block_index) {
        Ok(update) => update,
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            log::warn!("Block {} skipped: {}", block_index, e);
            sinks.failures.publish(BlockFailure {
                block_index,
                error: e.clone(),
            });
            return BlockOutcome::Failed(e);
        }
    };

    if is_reportable(&update.detection, update.energy, pipeline.config().activity_threshold) {
        counters.reported.fetch_add(1, Ordering::Relaxed);
        let update = Arc::new(update);
        sinks.updates.publish_arc(Arc::clone(&update));
        BlockOutcome::Reported(update)
    } else {
        counters.suppressed.fetch_add(1, Ordering::Relaxed);
        BlockOutcome::Suppressed(update)
    }
}

/// Run the pipeline and report the newest frame of the block
fn analyze_block(
    pipeline: &ChordPipeline,
    block: &[f32],
    block_index: u64,
) -> Result<LiveUpdate, AnalysisError> {
    let spectrogram = pipeline.spectrogram(block)?;
    let chromagram = pipeline.chromagram(&spectrogram)?;
    let (chordgram, detections) = pipeline.matcher().match_chromagram(&chromagram);

    let detection = *detections.last().ok_or_else(|| {
        AnalysisError::ComputationDegenerate("Block produced no frames".to_string())
    })?;
    let energy = chromagram.energy(detections.len() - 1);

    Ok(LiveUpdate {
        block_index,
        chromagram,
        chordgram,
        detection,
        energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Chord;
    use std::f32::consts::PI;

    const SR: u32 = 22050;

    fn test_config() -> AnalysisConfig {
        AnalysisConfig {
            window_size: 4096,
            overlap: 2048,
            block_size: 4096,
            harmonic_suppression: false,
            ..Default::default()
        }
    }

    fn c_major_block(len: usize) -> Vec<f32> {
        let freqs = [261.63f32, 329.63, 392.0];
        (0..len)
            .map(|i| {
                let t = i as f32 / SR as f32;
                freqs.iter().map(|f| 0.3 * (2.0 * PI * f * t).sin()).sum::<f32>()
            })
            .collect()
    }

    #[test]
    fn test_reports_chord_block() {
        let mut adapter = StreamingAdapter::new(SR, test_config()).unwrap();
        let mailbox = adapter.mailbox();

        match adapter.process_block(&c_major_block(4096)) {
            BlockOutcome::Reported(update) => {
                assert_eq!(update.detection.chord, Chord::Major(0));
                assert_eq!(update.block_index, 0);
                assert!(update.energy > 0.01);
            }
            other => panic!("expected a report, got {:?}", other),
        }

        let latest = mailbox.latest().unwrap();
        assert_eq!(latest.detection.chord, Chord::Major(0));
        assert_eq!(adapter.stats().reported, 1);
    }

    #[test]
    fn test_silence_is_suppressed() {
        let mut adapter = StreamingAdapter::new(SR, test_config()).unwrap();
        let outcome = adapter.process_block(&vec![0.0; 4096]);
        assert!(matches!(outcome, BlockOutcome::Suppressed(_)));
        assert!(adapter.mailbox().latest().is_none());
        assert_eq!(adapter.stats().suppressed, 1);
    }

    #[test]
    fn test_bad_block_does_not_stop_stream() {
        let mut adapter = StreamingAdapter::new(SR, test_config()).unwrap();

        let outcome = adapter.process_block(&[0.1; 100]);
        assert!(matches!(outcome, BlockOutcome::Failed(AnalysisError::InvalidInput(_))));

        let outcome = adapter.process_block(&c_major_block(4096));
        assert!(matches!(outcome, BlockOutcome::Reported(_)));

        let (generation, failure) = adapter.failures().snapshot().unwrap();
        assert_eq!(generation, 1);
        assert_eq!(failure.block_index, 0);
        assert!(matches!(failure.error, AnalysisError::InvalidInput(_)));

        let stats = adapter.stats();
        assert_eq!(stats.blocks, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.reported, 1);
    }

    #[test]
    fn test_push_samples_in_uneven_chunks() {
        let mut adapter = StreamingAdapter::new(SR, test_config()).unwrap();
        let signal = c_major_block(4096 * 3);

        let mut analysed = 0;
        for chunk in signal.chunks(1000) {
            analysed += adapter.push_samples(chunk);
        }

        assert_eq!(analysed, 3);
        let latest = adapter.mailbox().latest().unwrap();
        assert_eq!(latest.block_index, 2);
        assert_eq!(adapter.mailbox().generation(), 3);
    }

    #[test]
    fn test_live_update_accessors_and_json() {
        let mut adapter = StreamingAdapter::new(SR, test_config()).unwrap();
        let update = match adapter.process_block(&c_major_block(4096 * 2)) {
            BlockOutcome::Reported(update) => update,
            other => panic!("expected a report, got {:?}", other),
        };

        // Two-window block: three frames, the last one is reported
        assert_eq!(update.chromagram.frames(), 3);
        assert_eq!(update.frame(), 2);
        assert_eq!(update.scores()[update.detection.chord.index()], update.detection.confidence);
        assert!((update.chroma().iter().sum::<f32>() - update.energy).abs() < 1e-6);

        let json = serde_json::to_string(&*update).unwrap();
        let back: LiveUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.detection, update.detection);
        assert_eq!(back.chromagram.frames(), 3);
    }
}
