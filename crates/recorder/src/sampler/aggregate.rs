//! Sample buffer and median aggregation

use std::num::NonZeroUsize;

/// Fixed-capacity buffer for one sampling cycle
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f64>,
    capacity: NonZeroUsize,
}

impl SampleBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a sample in acquisition order
    ///
    /// Returns false (and drops the sample) if the buffer is already full.
    pub fn push(&mut self, celsius: f64) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(celsius);
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity.get()
    }

    /// Samples in acquisition order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Discard the samples of the previous cycle
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Median with the upper-middle element for even counts
///
/// Sorts `samples` in place and returns the element at `len / 2`; returns
/// `None` for an empty slice.
pub fn median(samples: &mut [f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_by(f64::total_cmp);
    Some(samples[samples.len() / 2])
}

/// Reduce a full buffer to its representative value
///
/// Returns `None` unless every slot has been filled. The buffer is left
/// sorted and must be cleared before the next cycle.
pub fn aggregate(buffer: &mut SampleBuffer) -> Option<f64> {
    if !buffer.is_full() {
        return None;
    }
    median(&mut buffer.samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer_with(samples: &[f64]) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(NonZeroUsize::new(samples.len()).unwrap());
        for &s in samples {
            assert!(buffer.push(s));
        }
        buffer
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(aggregate(&mut buffer_with(&[3.0, 1.0, 2.0])), Some(2.0));
    }

    #[test]
    fn test_median_even_takes_upper_middle() {
        // sorted [1, 2, 3, 4] -> index 2
        assert_eq!(aggregate(&mut buffer_with(&[4.0, 1.0, 3.0, 2.0])), Some(3.0));
    }

    #[test]
    fn test_median_single() {
        assert_eq!(aggregate(&mut buffer_with(&[21.75])), Some(21.75));
    }

    #[test]
    fn test_median_with_duplicates() {
        assert_eq!(median(&mut [22.0, 22.0, 19.0, 22.0, 30.0]), Some(22.0));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_partial_buffer_is_not_aggregated() {
        let mut buffer = SampleBuffer::new(NonZeroUsize::new(3).unwrap());
        buffer.push(1.0);
        buffer.push(2.0);

        assert_eq!(aggregate(&mut buffer), None);
    }

    #[test]
    fn test_push_rejects_overflow() {
        let mut buffer = buffer_with(&[1.0, 2.0]);

        assert!(!buffer.push(3.0));
        assert_eq!(buffer.samples(), &[1.0, 2.0]);
    }

    #[test]
    fn test_clear_reuses_buffer() {
        let mut buffer = buffer_with(&[5.0, 4.0]);
        assert_eq!(aggregate(&mut buffer), Some(5.0));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);
        assert!(buffer.push(1.0));
        assert!(buffer.push(0.5));
        assert_eq!(aggregate(&mut buffer), Some(1.0));
    }

    proptest! {
        #[test]
        fn prop_median_is_upper_middle_of_sorted(
            samples in prop::collection::vec(-40.0f64..125.0, 1..64)
        ) {
            let mut sorted = samples.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let expected = sorted[samples.len() / 2];

            let mut buffer = buffer_with(&samples);
            prop_assert_eq!(aggregate(&mut buffer), Some(expected));
        }

        #[test]
        fn prop_median_is_order_independent(
            samples in prop::collection::vec(-40.0f64..125.0, 1..32)
        ) {
            let mut samples = samples;
            let forward = median(&mut samples.clone());
            samples.reverse();
            prop_assert_eq!(median(&mut samples), forward);
        }
    }
}
