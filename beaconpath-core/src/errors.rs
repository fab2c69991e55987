//! Error Types for the Localization Core
//!
//! ## Design Philosophy
//!
//! The error system follows the same constraints as the rest of the crate:
//!
//! 1. **Small Size**: Each variant is kept minimal since errors are returned
//!    in the per-cycle hot path and may be stored alongside cycle outcomes.
//!
//! 2. **No Heap Allocation**: All error data is inline - no String, only
//!    `&'static str` for reasons. Memory usage stays deterministic.
//!
//! 3. **Copy Semantics**: Errors implement Copy so they can be attached to
//!    warnings and results without move complications.
//!
//! ## Fatal vs. Non-Fatal
//!
//! A positioning cycle distinguishes two failure severities:
//!
//! - [`PositioningError`] aborts the cycle (or withholds one beacon's
//!   estimate); no position is produced for that path.
//! - [`CycleWarning`] records a recoverable condition on an otherwise
//!   successful cycle - the position is still returned.
//!
//! No panic crosses the crate boundary; every failure is an explicit value.

use thiserror_no_std::Error;

/// Result type for localization operations
pub type PositioningResult<T> = Result<T, PositioningError>;

/// Fatal failures - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PositioningError {
    /// Fewer than the required number of beacons produced a usable
    /// distance estimate this cycle. No position can be solved.
    #[error("Need {required} ranged beacons, have {available}")]
    InsufficientBeacons {
        /// Minimum beacon count for trilateration
        required: usize,
        /// Beacons that actually produced a distance estimate
        available: usize,
    },

    /// A beacon's sample window is below the minimum size, so its
    /// distance estimate is withheld for this cycle.
    #[error("Need {required} samples, have {available}")]
    InsufficientSamples {
        /// Minimum number of samples for a trusted estimate
        required: usize,
        /// Samples actually available
        available: usize,
    },

    /// Malformed setup detected eagerly at configuration time
    /// (non-positive path-loss exponent, bad beacon naming, ...).
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the supplied configuration
        reason: &'static str,
    },

    /// Collinear or coincident beacons defeated both the closed-form
    /// solver and the numerical refiner.
    #[error("Degenerate beacon geometry")]
    DegenerateGeometry,

    /// The bearing anchor or baseline beacon could not be identified
    /// from the configured layout. Position is unaffected.
    #[error("Bearing beacons not identifiable in layout")]
    InsufficientBeaconMetadata,

    /// The compass produced no usable headings this cycle.
    #[error("Compass sensor unavailable")]
    SensorUnavailable,
}

/// Non-fatal conditions attached to a successful cycle outcome
///
/// Warnings are recorded (and logged when the `log` feature is enabled)
/// but never abort the cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleWarning {
    /// The radical under the z-coordinate square root was negative and
    /// was clamped to zero. The supplied distances are mutually
    /// inconsistent, usually because the user is outside the beacon
    /// triangle's reach.
    OutOfRangeMeasurement {
        /// The negative radical before clamping (m²)
        radical: f64,
    },

    /// A cross-check beacon's measured distance disagrees with the
    /// solved position beyond tolerance.
    MeasurementInconsistency {
        /// Index of the disagreeing beacon
        beacon_index: u8,
        /// Absolute deviation between measured and geometric distance (m)
        deviation: f64,
    },

    /// The bearing could not be computed this cycle; position is still
    /// valid. Carries the underlying cause.
    BearingUnavailable {
        /// Why the bearing was omitted
        reason: PositioningError,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for PositioningError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InsufficientBeacons { required, available } =>
                defmt::write!(fmt, "Need {} beacons, have {}", required, available),
            Self::InsufficientSamples { required, available } =>
                defmt::write!(fmt, "Need {} samples, have {}", required, available),
            Self::InvalidConfiguration { reason } =>
                defmt::write!(fmt, "Invalid configuration: {}", reason),
            Self::DegenerateGeometry =>
                defmt::write!(fmt, "Degenerate beacon geometry"),
            Self::InsufficientBeaconMetadata =>
                defmt::write!(fmt, "Bearing beacons not identifiable"),
            Self::SensorUnavailable =>
                defmt::write!(fmt, "Compass unavailable"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleWarning {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OutOfRangeMeasurement { radical } =>
                defmt::write!(fmt, "z radical {} clamped to 0", radical),
            Self::MeasurementInconsistency { beacon_index, deviation } =>
                defmt::write!(fmt, "Beacon {} deviates by {} m", beacon_index, deviation),
            Self::BearingUnavailable { reason } =>
                defmt::write!(fmt, "Bearing omitted: {}", reason),
        }
    }
}
