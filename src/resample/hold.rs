//! Length correction by sample-and-hold.
//!
//! Stretches or shrinks a buffer to an arbitrary length by duplicating or
//! dropping one sample per stride window, with the windows spread evenly
//! across the buffer. No interpolation or filtering is applied.

use thiserror::Error;

/// Compensates for `4.999999` flooring to `4` after repeated stride additions
const CURSOR_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResampleError {
    #[error("target length must not be negative, got {0}")]
    NegativeTargetLength(i64),

    #[error("cannot stretch an empty buffer to {0} samples")]
    EmptySource(i64),
}

pub fn resample<T: Clone>(source: &[T], target_length: i64) -> Result<Vec<T>, ResampleError> {
    let mut out = Vec::new();
    resample_into(&mut out, source, target_length)?;
    Ok(out)
}

/// Same as [`resample`], writing into `out` (cleared first).
pub fn resample_into<T: Clone>(
    out: &mut Vec<T>,
    source: &[T],
    target_length: i64,
) -> Result<(), ResampleError> {
    if target_length < 0 {
        return Err(ResampleError::NegativeTargetLength(target_length));
    }
    out.clear();

    let len = source.len();
    let target = target_length as usize;
    if target == len {
        out.extend_from_slice(source);
        return Ok(());
    }
    if target == 0 {
        return Ok(());
    }
    if len == 0 {
        return Err(ResampleError::EmptySource(target_length));
    }

    out.reserve(target);
    if target > len {
        hold_evenly(out, source, target - len);
    } else {
        drop_evenly(out, source, len - target);
    }

    debug_assert_eq!(out.len(), target);
    Ok(())
}

/// Cursor positions `floor(k * stride + eps)` for `k = 1..=adjustments`,
/// clamped to the source length.
fn window_ends(len: usize, adjustments: usize) -> impl Iterator<Item = usize> {
    let stride = len as f64 / adjustments as f64;
    let mut cursor = 0.0f64;
    (0..adjustments).map(move |_| {
        cursor += stride;
        ((cursor + CURSOR_EPSILON).floor() as usize).min(len)
    })
}

/// Copy each window whole, then repeat the last sample written.
fn hold_evenly<T: Clone>(out: &mut Vec<T>, source: &[T], insertions: usize) {
    let mut start = 0;
    for end in window_ends(source.len(), insertions) {
        out.extend_from_slice(&source[start..end]);
        // a window narrower than one sample holds whatever came before it
        let held = out.last().unwrap_or(&source[0]).clone();
        out.push(held);
        start = end;
    }
    out.extend_from_slice(&source[start..]);
}

/// Copy each window minus its last sample.
fn drop_evenly<T: Clone>(out: &mut Vec<T>, source: &[T], removals: usize) {
    let mut start = 0;
    for end in window_ends(source.len(), removals) {
        if end > start {
            out.extend_from_slice(&source[start..end - 1]);
        }
        start = end;
    }
    out.extend_from_slice(&source[start..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<i32> {
        (0..len as i32).collect()
    }

    #[test]
    fn test_identity() {
        let source = ramp(85);
        assert_eq!(resample(&source, 85).unwrap(), source);
    }

    #[test]
    fn test_zero_target_is_empty() {
        assert!(resample(&ramp(85), 0).unwrap().is_empty());
        assert!(resample::<i32>(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_negative_target_rejected() {
        assert_eq!(
            resample(&ramp(10), -3),
            Err(ResampleError::NegativeTargetLength(-3))
        );
    }

    #[test]
    fn test_empty_source_cannot_grow() {
        assert_eq!(resample::<i32>(&[], 4), Err(ResampleError::EmptySource(4)));
    }

    #[test]
    fn test_upsample_by_five() {
        // stride 2.0: windows [0,2) [2,4) [4,6) [6,8) [8,10), each gains one held sample
        let out = resample(&ramp(10), 15).unwrap();
        assert_eq!(out, vec![0, 1, 1, 2, 3, 3, 4, 5, 5, 6, 7, 7, 8, 9, 9]);
    }

    #[test]
    fn test_downsample_by_five() {
        // stride 2.0: the last sample of each window is dropped
        let out = resample(&ramp(10), 5).unwrap();
        assert_eq!(out, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_fractional_stride_upsample() {
        // stride 10/3: window ends at 3, 6, 10
        let out = resample(&ramp(10), 13).unwrap();
        assert_eq!(out, vec![0, 1, 2, 2, 3, 4, 5, 5, 6, 7, 8, 9, 9]);
    }

    #[test]
    fn test_fractional_stride_downsample() {
        // stride 85/17 = 5.0 accumulates float error; epsilon keeps ends on 5, 10, ...
        let out = resample(&ramp(85), 68).unwrap();
        assert_eq!(out.len(), 68);
        let dropped: Vec<i32> = ramp(85).into_iter().filter(|v| !out.contains(v)).collect();
        assert_eq!(dropped, (0..17).map(|k| k * 5 + 4).collect::<Vec<_>>());
    }

    #[test]
    fn test_more_insertions_than_samples() {
        // stride < 1: some windows are empty and repeat the previous hold
        let out = resample(&ramp(3), 8).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(out.first(), Some(&0));
        assert_eq!(out.last(), Some(&2));
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
        for v in 0..3 {
            assert!(out.contains(&v));
        }
    }

    #[test]
    fn test_single_sample_target() {
        assert_eq!(resample(&ramp(85), 1).unwrap().len(), 1);
    }

    #[test]
    fn test_resample_into_reuses_buffer() {
        let mut out = vec![99; 40];
        resample_into(&mut out, &ramp(10), 12).unwrap();
        assert_eq!(out.len(), 12);
        assert!(!out.contains(&99));
    }
}
