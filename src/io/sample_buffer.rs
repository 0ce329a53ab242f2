//! Fixed-size block accumulation
//!
//! Capture callbacks deliver chunks of arbitrary length; the streaming
//! adapter wants exact `block_size` blocks. [`SampleBuffer`] bridges the two
//! with a single preallocated block and no further allocation.

/// Accumulates samples into consecutive, non-overlapping blocks
#[derive(Debug)]
pub struct SampleBuffer {
    /// Block storage, always `block_size` long
    data: Vec<f32>,
    /// Samples filled in the current block
    position: usize,
}

impl SampleBuffer {
    /// Create a buffer emitting blocks of `block_size` samples
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0.0; block_size.max(1)],
            position: 0,
        }
    }

    /// Samples per emitted block
    pub fn block_size(&self) -> usize {
        self.data.len()
    }

    /// Add samples, calling `on_block` once for each completed block
    ///
    /// Returns the number of blocks emitted.
    ///
    /// # Example
    ///
    /// ```
    /// use chordscan::io::sample_buffer::SampleBuffer;
    ///
    /// let mut buffer = SampleBuffer::new(4);
    /// let mut blocks = Vec::new();
    /// buffer.push_with(&[1.0; 10], |block| blocks.push(block.to_vec()));
    /// assert_eq!(blocks.len(), 2);
    ///
    /// // The two leftover samples open the next block
    /// buffer.push_with(&[2.0; 2], |block| blocks.push(block.to_vec()));
    /// assert_eq!(blocks[2], vec![1.0, 1.0, 2.0, 2.0]);
    /// ```
    pub fn push_with<F: FnMut(&[f32])>(&mut self, mut samples: &[f32], mut on_block: F) -> usize {
        let block_size = self.data.len();
        let mut emitted = 0;

        while !samples.is_empty() {
            let take = (block_size - self.position).min(samples.len());
            self.data[self.position..self.position + take].copy_from_slice(&samples[..take]);
            self.position += take;
            samples = &samples[take..];

            if self.position == block_size {
                on_block(&self.data);
                self.position = 0;
                emitted += 1;
            }
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_preserve_order() {
        let mut buffer = SampleBuffer::new(3);
        let mut blocks: Vec<Vec<f32>> = Vec::new();

        let input: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let n = buffer.push_with(&input[..5], |b| blocks.push(b.to_vec()));
        assert_eq!(n, 1);
        let n = buffer.push_with(&input[5..], |b| blocks.push(b.to_vec()));
        assert_eq!(n, 1);

        assert_eq!(blocks, vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]);

        // 6 and 7 are still held back
        buffer.push_with(&[8.0], |b| blocks.push(b.to_vec()));
        assert_eq!(blocks[2], vec![6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_exact_fill() {
        let mut buffer = SampleBuffer::new(4);
        let mut count = 0;
        assert_eq!(buffer.push_with(&[0.5; 8], |_| count += 1), 2);
        assert_eq!(count, 2);

        // Nothing carried over: three more samples do not complete a block
        assert_eq!(buffer.push_with(&[0.5; 3], |_| count += 1), 0);
        assert_eq!(buffer.push_with(&[0.5; 1], |_| count += 1), 1);
        assert_eq!(buffer.block_size(), 4);
    }

    #[test]
    fn test_empty_push() {
        let mut buffer = SampleBuffer::new(4);
        assert_eq!(buffer.push_with(&[], |_| panic!("no block expected")), 0);
    }
}
