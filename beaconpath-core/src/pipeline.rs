//! Positioning Pipeline: Collector, Readiness, and the Compute Cycle
//!
//! ## Overview
//!
//! The radio and sensor layer is asynchronous and unreliable; the math
//! is synchronous and pure. This module is the seam between the two,
//! built as an explicit pipeline instead of reactive recomputation:
//!
//! ```text
//! radio reads ──→ SampleCollector ──ready()──→ take_snapshot()
//! compass     ──→      │                            │
//!                      └── keeps accumulating       ▼
//!                                     Positioner::run_cycle(&inputs)
//!                                                   │
//!                                                   ▼
//!                                      CycleOutcome { position,
//!                                                     bearing,
//!                                                     warnings }
//! ```
//!
//! The collector owns the mutable buffers. The cycle runs over an
//! immutable snapshot, so a concurrent radio callback can never race
//! the math - snapshotting and clearing happen in one call on the
//! caller's thread.
//!
//! ## Readiness
//!
//! A cycle is worth running once at least three beacons hold full
//! sample windows. The compass batch is *not* part of readiness: a dead
//! magnetometer degrades the outcome to position-only instead of
//! blocking it.
//!
//! ## Statelessness
//!
//! [`Positioner`] holds only configuration. Each `run_cycle` call is a
//! pure function of its inputs; the previous outcome (if the caller
//! kept one) can be fed back through [`CycleInputs::last_known`] to
//! seed the numerical refiner.

use heapless::Vec;

use crate::{
    bearing,
    buffer::SampleWindow,
    conditioning::trim_outliers,
    constants::{
        COMPASS_BATCH_LEN, DEFAULT_TRIM_FRACTION, MAX_BEACONS, MAX_CYCLE_WARNINGS,
        MAX_TRIM_FRACTION, MIN_BEACONS_FOR_FIX, MIN_SAMPLES_FOR_ESTIMATE,
        SAMPLE_WINDOW_CAPACITY,
    },
    distance::estimate_distance,
    errors::{CycleWarning, PositioningError, PositioningResult},
    geometry::Vec3,
    profile::BeaconLayout,
    trilateration::{trilaterate, RangedBeacon},
};

/// An immutable snapshot of one cycle's raw inputs
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    /// Per-beacon chronological sample copies, keyed by beacon index
    pub windows: Vec<(u8, Vec<i16, SAMPLE_WINDOW_CAPACITY>), MAX_BEACONS>,
    /// Raw compass headings (degrees, clockwise-from-north)
    pub compass: Vec<f64, COMPASS_BATCH_LEN>,
    /// Previous solved position, seeds the refiner when geometry is bad
    pub last_known: Option<Vec3>,
}

/// Result of one positioning cycle, superseded by the next
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Solved user position in the beacon world frame (meters)
    pub position: Vec3,
    /// Signed bearing toward the target in [−180, 180] degrees
    /// (positive = turn left), or `None` when it could not be computed
    pub bearing: Option<f64>,
    /// Non-fatal conditions met during the cycle
    pub warnings: Vec<CycleWarning, MAX_CYCLE_WARNINGS>,
}

/// Owns the mutable sample buffers fed by the radio/sensor layer
pub struct SampleCollector {
    windows: Vec<(u8, SampleWindow<SAMPLE_WINDOW_CAPACITY>), MAX_BEACONS>,
    compass: Vec<f64, COMPASS_BATCH_LEN>,
}

impl SampleCollector {
    /// Creates a collector with one window per configured beacon
    pub fn new(layout: &BeaconLayout) -> Self {
        let mut windows = Vec::new();
        for profile in layout.iter() {
            // Layout size is bounded by MAX_BEACONS, push cannot fail
            let _ = windows.push((profile.index, SampleWindow::new()));
        }

        Self {
            windows,
            compass: Vec::new(),
        }
    }

    /// Records one RSSI reading for a beacon
    ///
    /// Returns `false` when the index matches no configured beacon -
    /// the boundary contract says unknown streams are dropped, not
    /// silently mixed in.
    pub fn record_rssi(&mut self, beacon_index: u8, rssi: i16) -> bool {
        match self.windows.iter_mut().find(|(i, _)| *i == beacon_index) {
            Some((_, window)) => {
                window.push(rssi);
                true
            }
            None => false,
        }
    }

    /// Records one raw compass heading, keeping only the freshest batch
    pub fn record_heading(&mut self, degrees: f64) {
        if self.compass.is_full() {
            self.compass.remove(0);
        }
        // Full case handled above, push cannot fail
        let _ = self.compass.push(degrees);
    }

    /// Number of beacons whose windows have reached the minimum size
    pub fn ranged_beacon_count(&self) -> usize {
        self.windows
            .iter()
            .filter(|(_, w)| w.len() >= MIN_SAMPLES_FOR_ESTIMATE)
            .count()
    }

    /// True once enough beacons hold full windows to attempt a fix
    pub fn ready(&self) -> bool {
        self.ranged_beacon_count() >= MIN_BEACONS_FOR_FIX
    }

    /// Copies out the cycle inputs and clears the consumed buffers
    ///
    /// Windows and the compass batch restart empty; the next cycle runs
    /// over data collected entirely after this call, never a blend.
    pub fn take_snapshot(&mut self, last_known: Option<Vec3>) -> CycleInputs {
        let mut inputs = CycleInputs {
            windows: Vec::new(),
            compass: self.compass.clone(),
            last_known,
        };

        for (index, window) in self.windows.iter_mut() {
            let _ = inputs.windows.push((*index, window.snapshot()));
            window.clear();
        }
        self.compass.clear();

        inputs
    }
}

/// Stateless per-cycle computation over a snapshot of inputs
pub struct Positioner {
    layout: BeaconLayout,
    trim_fraction: f64,
}

impl Positioner {
    /// Creates a positioner for a configured beacon layout
    ///
    /// The layout must hold at least three beacons; anything less can
    /// never satisfy trilateration and is a configuration error.
    pub fn new(layout: BeaconLayout) -> PositioningResult<Self> {
        if layout.len() < MIN_BEACONS_FOR_FIX {
            return Err(PositioningError::InvalidConfiguration {
                reason: "layout needs at least three beacons",
            });
        }

        Ok(Self {
            layout,
            trim_fraction: DEFAULT_TRIM_FRACTION,
        })
    }

    /// Overrides the default outlier trim fraction
    pub fn with_trim_fraction(mut self, trim_fraction: f64) -> PositioningResult<Self> {
        if !trim_fraction.is_finite()
            || trim_fraction < 0.0
            || trim_fraction >= MAX_TRIM_FRACTION
        {
            return Err(PositioningError::InvalidConfiguration {
                reason: "trim fraction must lie in [0, 0.5)",
            });
        }
        self.trim_fraction = trim_fraction;
        Ok(self)
    }

    /// The configured beacon layout
    pub fn layout(&self) -> &BeaconLayout {
        &self.layout
    }

    /// Runs one full positioning cycle over a snapshot
    ///
    /// Per beacon: trim outliers, filter, convert to distance. Beacons
    /// with undersized windows are skipped - fatal only if fewer than
    /// three estimates survive. Then trilaterate and fuse the bearing;
    /// bearing-level failures degrade to `bearing: None` plus a
    /// warning, never discarding the position.
    pub fn run_cycle(&self, inputs: &CycleInputs) -> PositioningResult<CycleOutcome> {
        let mut ranged: Vec<RangedBeacon, MAX_BEACONS> = Vec::new();

        for (index, samples) in inputs.windows.iter() {
            let Some(profile) = self.layout.get(*index) else {
                // Stream for a beacon this positioner was not
                // configured with; the collector should have dropped it
                continue;
            };

            if samples.len() < MIN_SAMPLES_FOR_ESTIMATE {
                // This beacon sits out the cycle; the others may still
                // carry it
                continue;
            }

            let trimmed = trim_outliers(samples, self.trim_fraction)?;
            let estimate = estimate_distance(profile, &trimmed)?;

            let _ = ranged.push(RangedBeacon {
                beacon_index: estimate.beacon_index,
                position: profile.position,
                distance: estimate.meters,
            });
        }

        if ranged.len() < MIN_BEACONS_FOR_FIX {
            return Err(PositioningError::InsufficientBeacons {
                required: MIN_BEACONS_FOR_FIX,
                available: ranged.len(),
            });
        }

        let fix = trilaterate(&ranged, inputs.last_known)?;
        let mut warnings = fix.warnings;

        let bearing = match bearing::compute_bearing(fix.position, &inputs.compass, &self.layout)
        {
            Ok(angle) => Some(angle),
            Err(
                reason @ (PositioningError::InsufficientBeaconMetadata
                | PositioningError::SensorUnavailable),
            ) => {
                log_warn!("bearing omitted this cycle: {:?}", reason);
                let _ = warnings.push(CycleWarning::BearingUnavailable { reason });
                None
            }
            Err(fatal) => return Err(fatal),
        };

        Ok(CycleOutcome {
            position: fix.position,
            bearing,
            warnings,
        })
    }
}
