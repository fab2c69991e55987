//! Constants for the Localization Core
//!
//! Centralized, documented constants used throughout the crate. Every
//! tuning number lives here with its purpose and source, grouped by the
//! pipeline stage it belongs to.

// ===== SAMPLE COLLECTION =====

/// Capacity of a per-beacon RSSI sample window.
///
/// The collector keeps only the most recent readings; older samples
/// reflect a position the user may have already left.
///
/// Source: reference beacon firmware streams ~10 readings/second, so
/// 50 samples cover the last ~5 seconds of movement.
pub const SAMPLE_WINDOW_CAPACITY: usize = 50;

/// Minimum window size before a beacon's distance estimate is trusted.
///
/// Below this, the trimmed mean and the Kalman filter have too little
/// data to suppress multipath spikes, so the estimate is withheld.
///
/// Source: matches the full window - an estimate is only produced from
/// a completely filled window.
pub const MIN_SAMPLES_FOR_ESTIMATE: usize = 50;

/// Fraction of samples discarded from each tail of the sorted window.
///
/// RSSI distributions have heavy tails from multipath reflections;
/// trimming 10% per side removes them without biasing the center.
///
/// Source: empirical tuning against the reference deployment.
pub const DEFAULT_TRIM_FRACTION: f64 = 0.1;

/// Upper bound (exclusive) on a valid trim fraction.
///
/// At 0.5 per tail the trim would always discard the whole window.
pub const MAX_TRIM_FRACTION: f64 = 0.5;

// ===== TRILATERATION =====

/// Minimum number of ranged beacons for a position fix.
///
/// Three spheres intersect in (up to) two points; the non-negative-z
/// convention picks one. Fewer beacons leave the system underdetermined.
pub const MIN_BEACONS_FOR_FIX: usize = 3;

/// Maximum number of configured beacons.
///
/// Bounds every per-beacon collection in the crate so no allocation is
/// needed. Deployments in scope use 3-4 beacons.
pub const MAX_BEACONS: usize = 8;

/// Tolerance for the 4th-and-later beacon cross-check (meters).
///
/// A solved position whose geometric distance to an extra beacon
/// deviates beyond this from the measured distance is flagged as a
/// measurement inconsistency.
pub const CROSS_CHECK_TOLERANCE_M: f64 = 0.1;

/// Multiple of [`CROSS_CHECK_TOLERANCE_M`] beyond which the closed-form
/// solution is considered bad enough to re-solve with the refiner.
pub const CROSS_CHECK_REFINE_FACTOR: f64 = 10.0;

/// Length below which a baseline vector is treated as degenerate (meters).
///
/// Guards the closed-form solver against coincident or collinear
/// beacons before any division.
pub const DEGENERACY_EPSILON: f64 = 1e-9;

/// Maximum warnings attached to one cycle outcome.
pub const MAX_CYCLE_WARNINGS: usize = 8;

// ===== POSITION REFINER =====

/// Iteration budget for the Nelder-Mead position refiner.
///
/// The residual surface for 3-4 beacons is smooth; convergence is
/// typically reached well under 100 iterations. The budget leaves
/// headroom for the flat valleys a collinear layout produces.
/// Exhausting it is reported as degenerate geometry.
pub const REFINER_MAX_ITERATIONS: usize = 400;

/// Convergence threshold on the refiner's simplex residual spread (m⁴).
///
/// When best and worst vertex residuals agree this closely the simplex
/// has collapsed onto the minimum.
pub const REFINER_TOLERANCE: f64 = 1e-12;

/// Initial simplex edge length for the refiner (meters).
///
/// One meter spans enough of the residual surface to escape flat
/// starts from the origin while staying within room scale.
pub const REFINER_INITIAL_STEP: f64 = 1.0;

// ===== BEARING =====

/// Number of compass readings averaged per cycle.
///
/// Source: reference behavior - five headings are batched per cycle to
/// smooth magnetometer jitter.
pub const COMPASS_BATCH_LEN: usize = 5;

/// Occurrence rank at which raw 0° headings start entering the average.
///
/// An exact 0° reading usually means the sensor is stuck rather than
/// the user facing true north. A genuine north-facing user produces
/// repeated zeros, a stuck sensor produces isolated ones, so zeros
/// before this occurrence are dropped from the batch. This is a
/// heuristic, not a proven correction.
pub const STUCK_ZERO_MIN_RECURRENCE: usize = 2;
