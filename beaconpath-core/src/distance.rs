//! Distance Estimation: Scalar Kalman Filter + Log-Distance Path Loss
//!
//! ## Overview
//!
//! One estimator instance per beacon turns a conditioned RSSI window
//! into a single distance:
//!
//! ```text
//! trimmed window ─→ scalar Kalman filter ─→ mean filtered level ─→
//!     d = 10^((rssi_ref − level) / (10·N))
//! ```
//!
//! ## Filter Model
//!
//! The transmitter is stationary over one window, so the state is a
//! single scalar (the true signal level) with identity-like dynamics:
//!
//! ```text
//! Predict:  x̂ = A·x        P̂ = A·P·A + Q
//! Gain:     K = P̂·H / (H·P̂·H + R)
//! Update:   x = x̂ + K·(r − H·x̂)    P = (1 − K·H)·P̂
//! ```
//!
//! The filter is seeded with the trimmed mean and its running state
//! feeds each prediction. The per-step estimates are averaged rather
//! than taking only the final state: early steps still carry the seed's
//! information, and the average damps any residual drift across the
//! window.
//!
//! ## Why Average, Then Convert?
//!
//! The path-loss model is exponential in the signal level, so filtering
//! in dB space (where the noise is approximately Gaussian) and
//! converting once at the end avoids biasing the distance the way
//! per-sample conversion and averaging in meters would.

use crate::{
    errors::{PositioningError, PositioningResult},
    profile::{BeaconProfile, KalmanParams},
};

/// One-dimensional Kalman filter over a beacon's signal level
#[derive(Debug, Clone)]
pub struct ScalarKalman {
    /// State-transition scalar (A)
    a: f64,
    /// Measurement scalar (H)
    h: f64,
    /// Process noise covariance (Q)
    q: f64,
    /// Measurement noise covariance (R)
    r: f64,
    /// Current state estimate
    x: f64,
    /// Current estimate error covariance
    p: f64,
}

impl ScalarKalman {
    /// Creates a filter seeded with an initial state estimate
    pub fn new(params: &KalmanParams, initial_state: f64) -> Self {
        Self {
            a: params.a,
            h: params.h,
            q: params.q,
            r: params.r,
            x: initial_state,
            p: params.p0,
        }
    }

    /// Runs one predict/update step and returns the new state estimate
    pub fn step(&mut self, measurement: f64) -> f64 {
        // Predict
        let x_hat = self.a * self.x;
        let p_hat = self.a * self.p * self.a + self.q;

        // Update
        let gain = p_hat * self.h / (self.h * p_hat * self.h + self.r);
        self.x = x_hat + gain * (measurement - self.h * x_hat);
        self.p = (1.0 - gain * self.h) * p_hat;

        self.x
    }

    /// Current state estimate
    pub fn state(&self) -> f64 {
        self.x
    }

    /// Current estimate error covariance
    pub fn covariance(&self) -> f64 {
        self.p
    }
}

/// A beacon's distance estimate for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceEstimate {
    /// Index of the beacon this estimate belongs to
    pub beacon_index: u8,
    /// Estimated transmitter-receiver distance, always ≥ 0
    pub meters: f64,
}

/// Filters a trimmed sample sequence down to one signal level (dBm)
///
/// Seeds the filter with the sample mean, steps through the sequence in
/// order, and averages the per-step estimates.
pub fn filter_signal_level(params: &KalmanParams, trimmed: &[i16]) -> PositioningResult<f64> {
    if trimmed.is_empty() {
        return Err(PositioningError::InsufficientSamples {
            required: 1,
            available: 0,
        });
    }

    let mean = trimmed.iter().map(|&r| r as f64).sum::<f64>() / trimmed.len() as f64;
    let mut filter = ScalarKalman::new(params, mean);

    let mut estimate_sum = 0.0;
    for &rssi in trimmed {
        estimate_sum += filter.step(rssi as f64);
    }

    Ok(estimate_sum / trimmed.len() as f64)
}

/// Log-distance path-loss inversion: filtered level → meters
///
/// `d = 10^((rssi_ref − level) / (10·N))`. The exponent's sign makes
/// the output strictly decreasing in `level`: a stronger signal always
/// means a shorter distance. The exponential form guarantees d > 0.
pub fn path_loss_distance(rssi_ref: f64, level: f64, path_loss_exponent: f64) -> f64 {
    libm::pow(10.0, (rssi_ref - level) / (10.0 * path_loss_exponent))
}

/// Produces a beacon's distance estimate from its conditioned window
pub fn estimate_distance(
    profile: &BeaconProfile,
    trimmed: &[i16],
) -> PositioningResult<DistanceEstimate> {
    let level = filter_signal_level(&profile.kalman, trimmed)?;

    Ok(DistanceEstimate {
        beacon_index: profile.index,
        meters: path_loss_distance(profile.rssi_ref, level, profile.path_loss_exponent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> BeaconProfile {
        BeaconProfile::new(1, [0.0; 3], -59.0, 2.0).unwrap()
    }

    #[test]
    fn constant_signal_converges() {
        let params = KalmanParams::default();
        let mut filter = ScalarKalman::new(&params, -70.0);

        let mut estimate = 0.0;
        for _ in 0..50 {
            estimate = filter.step(-62.0);
        }

        assert!((estimate - -62.0).abs() < 0.5);
        // Covariance settles well below P0
        assert!(filter.covariance() < params.p0);
    }

    #[test]
    fn seed_matches_constant_input() {
        // Seeded at the measurement level, the filter must stay there
        let params = KalmanParams::default();
        let mut filter = ScalarKalman::new(&params, -60.0);

        for _ in 0..10 {
            let estimate = filter.step(-60.0);
            assert!((estimate - -60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn distance_decreases_with_signal_level() {
        let rssi_ref = -59.0;
        let n = 2.0;

        let mut previous = f64::INFINITY;
        for level in [-90.0, -80.0, -70.0, -59.0, -50.0] {
            let d = path_loss_distance(rssi_ref, level, n);
            assert!(d > 0.0);
            assert!(d < previous, "distance must strictly decrease as level rises");
            previous = d;
        }
    }

    #[test]
    fn reference_level_is_one_meter() {
        // At the 1 m calibration level the model returns exactly 1 m
        assert!((path_loss_distance(-59.0, -59.0, 2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_window_gives_exact_distance() {
        // rssi_ref − 10·N·log10(5) at N=2 ⇒ level for 5 m is −72.98...
        let profile = test_profile();
        let level = profile.rssi_ref - 10.0 * profile.path_loss_exponent * libm::log10(5.0);
        let rssi = level as i16; // integer readings, small quantization error

        let window = [rssi; 50];
        let estimate = estimate_distance(&profile, &window).unwrap();

        assert_eq!(estimate.beacon_index, 1);
        // Within quantization of the synthetic integer RSSI
        assert!((estimate.meters - 5.0).abs() < 0.7);
    }

    #[test]
    fn empty_window_is_insufficient() {
        let err = estimate_distance(&test_profile(), &[]).unwrap_err();
        assert!(matches!(err, PositioningError::InsufficientSamples { .. }));
    }
}
