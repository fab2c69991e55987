//! Signal Conditioning: Outlier Trimming of Raw RSSI Windows
//!
//! RSSI sample distributions carry heavy tails: multipath reflections
//! and body shadowing produce occasional readings tens of dB away from
//! the true level. Feeding those straight into the Kalman filter drags
//! the estimate around, so the window is trimmed first.
//!
//! The trim is symmetric: the window is sorted ascending and
//! `floor(p·n)` elements are discarded from *each* tail. Symmetry keeps
//! the trimmed mean unbiased for symmetric noise; an asymmetric trim
//! would systematically shift the filtered level and therefore the
//! distance.
//!
//! The operation is pure - the caller's window is never touched. The
//! collector keeps accumulating into the live window while the cycle
//! computes over its own sorted copy.

use heapless::Vec;

use crate::{
    constants::{MAX_TRIM_FRACTION, SAMPLE_WINDOW_CAPACITY},
    errors::{PositioningError, PositioningResult},
};

/// Conditioned sample sequence handed to the distance estimator
pub type TrimmedSamples = Vec<i16, SAMPLE_WINDOW_CAPACITY>;

/// Removes `floor(trim_fraction · len)` extreme readings from each tail
///
/// Returns the surviving samples sorted ascending. Order within the
/// trimmed output does not matter downstream: the Kalman seed is the
/// mean, and for a sorted pass the filter still converges on the same
/// central level.
///
/// ## Errors
///
/// - `InvalidConfiguration` if `trim_fraction` is outside `[0, 0.5)`
///   or the input exceeds the window capacity.
/// - `InsufficientSamples` if trimming would leave nothing - with a
///   valid fraction this only happens for an empty input window.
pub fn trim_outliers(samples: &[i16], trim_fraction: f64) -> PositioningResult<TrimmedSamples> {
    if !trim_fraction.is_finite() || trim_fraction < 0.0 || trim_fraction >= MAX_TRIM_FRACTION {
        return Err(PositioningError::InvalidConfiguration {
            reason: "trim fraction must lie in [0, 0.5)",
        });
    }

    let mut sorted = TrimmedSamples::new();
    if sorted.extend_from_slice(samples).is_err() {
        return Err(PositioningError::InvalidConfiguration {
            reason: "sample window exceeds configured capacity",
        });
    }
    sorted.sort_unstable();

    let n = sorted.len();
    let tail = (trim_fraction * n as f64) as usize;

    if 2 * tail >= n {
        return Err(PositioningError::InsufficientSamples {
            required: 2 * tail + 1,
            available: n,
        });
    }

    let mut trimmed = TrimmedSamples::new();
    // Bounds checked above, pushes cannot fail
    let _ = trimmed.extend_from_slice(&sorted[tail..n - tail]);
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_both_tails() {
        // 10 samples, p = 0.1: one trimmed from each end
        let samples = [-90, -60, -61, -62, -59, -63, -58, -60, -61, -20];
        let trimmed = trim_outliers(&samples, 0.1).unwrap();

        assert_eq!(trimmed.len(), 8);
        assert!(!trimmed.contains(&-90));
        assert!(!trimmed.contains(&-20));
    }

    #[test]
    fn zero_fraction_keeps_everything() {
        let samples = [-60, -65, -55];
        let trimmed = trim_outliers(&samples, 0.0).unwrap();
        assert_eq!(trimmed.as_slice(), &[-65, -60, -55]);
    }

    #[test]
    fn caller_window_untouched() {
        let samples = [-20, -90, -60];
        let _ = trim_outliers(&samples, 0.1).unwrap();
        assert_eq!(samples, [-20, -90, -60]);
    }

    #[test]
    fn rejects_invalid_fraction() {
        assert!(trim_outliers(&[-60, -61], 0.5).is_err());
        assert!(trim_outliers(&[-60, -61], -0.1).is_err());
        assert!(trim_outliers(&[-60, -61], f64::NAN).is_err());
    }

    #[test]
    fn short_window_fully_trimmed_is_error() {
        // p = 0.4, n = 2: floor(0.8) = 0 per tail, survives.
        assert!(trim_outliers(&[-60, -61], 0.4).is_ok());
        // p = 0.4, n = 5: 2 per tail, 1 survives.
        assert_eq!(trim_outliers(&[-60, -61, -62, -63, -64], 0.4).unwrap().len(), 1);
        // Empty input trims to nothing
        let err = trim_outliers(&[], 0.1).unwrap_err();
        assert!(matches!(err, PositioningError::InsufficientSamples { .. }));
    }

    proptest! {
        /// Output length is n − 2·floor(p·n) across the whole input space
        #[test]
        fn trim_length_property(
            samples in prop::collection::vec(-100i16..0, 1..SAMPLE_WINDOW_CAPACITY),
            trim_fraction in 0.0f64..0.49,
        ) {
            let n = samples.len();
            let tail = (trim_fraction * n as f64) as usize;

            match trim_outliers(&samples, trim_fraction) {
                Ok(trimmed) => prop_assert_eq!(trimmed.len(), n - 2 * tail),
                Err(PositioningError::InsufficientSamples { .. }) => {
                    prop_assert!(2 * tail >= n);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Surviving samples are always within the original extremes
        #[test]
        fn trim_preserves_bounds(
            samples in prop::collection::vec(-100i16..0, 3..SAMPLE_WINDOW_CAPACITY),
        ) {
            let min = *samples.iter().min().unwrap();
            let max = *samples.iter().max().unwrap();

            if let Ok(trimmed) = trim_outliers(&samples, 0.1) {
                for &s in trimmed.iter() {
                    prop_assert!(s >= min && s <= max);
                }
            }
        }
    }
}
