//! Channel mixing (interleaved multichannel to mono)

/// Append the mono average of interleaved `data` to `out`
///
/// `data` holds `frame0_ch0, frame0_ch1, ...`. A trailing partial frame is
/// ignored. Does not allocate when `out` already has room, which makes it
/// usable from an audio callback.
///
/// # Example
///
/// ```
/// use chordscan::preprocessing::channel_mixer::downmix_into;
///
/// let mut mono = Vec::new();
/// downmix_into(&[1.0, 0.0, 0.5, 0.5], 2, &mut mono);
/// assert_eq!(mono, vec![0.5, 0.5]);
/// ```
pub fn downmix_into(data: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(data);
        return;
    }
    out.extend(
        data.chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_average() {
        let mut mono = Vec::new();
        downmix_into(&[0.2, 0.4, 0.6, -0.6, 1.0, 0.0], 2, &mut mono);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);
        assert!((mono[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_channel_passthrough() {
        let data = [0.1, 0.2, 0.3];
        let mut mono = Vec::new();
        downmix_into(&data, 1, &mut mono);
        assert_eq!(mono, data.to_vec());
    }

    #[test]
    fn test_partial_frame_dropped() {
        let mut mono = Vec::new();
        downmix_into(&[1.0, 1.0, 1.0, 0.5, 0.5], 3, &mut mono);
        assert_eq!(mono, vec![1.0]);
    }

    #[test]
    fn test_appends_to_existing() {
        let mut out = vec![9.0];
        downmix_into(&[1.0, 3.0], 2, &mut out);
        assert_eq!(out, vec![9.0, 2.0]);
    }
}
