//! Localization core for beaconpath
//!
//! Estimates a mobile user's position and relative bearing toward a
//! fixed target from three short-range radio beacons of known position
//! plus a magnetic-heading sensor.
//!
//! The crate is the pure computational core of the system. Radio
//! discovery, connection handling, characteristic plumbing and UI all
//! live in a collaborator layer that feeds raw inputs in and consumes
//! typed results out:
//!
//! ```text
//! RSSI windows ─→ outlier trim ─→ scalar Kalman ─→ distances
//!                                                      │
//! compass batch ──────────────┐                        ▼
//!                             │                  trilateration
//!                             ▼                        │
//!                       bearing fusion ←── position ───┘
//! ```
//!
//! Key constraints:
//! - `no_std` capable, no heap allocation anywhere in the core
//! - every failure is an explicit result value, no panics at the boundary
//! - each cycle is a pure function over a snapshot of inputs
//!
//! ```no_run
//! use beaconpath_core::{BeaconLayout, BeaconProfile, Positioner, SampleCollector};
//!
//! let mut layout = BeaconLayout::new();
//! layout.push(BeaconProfile::new(1, [0.0, 0.0, 2.2], -59.0, 2.0)?.with_boresight_offset(30.0))?;
//! layout.push(BeaconProfile::new(2, [5.0, 0.0, 2.2], -59.0, 2.0)?)?;
//! layout.push(BeaconProfile::new(3, [0.0, 5.0, 2.2], -59.0, 2.0)?)?;
//!
//! let positioner = Positioner::new(layout.clone())?;
//! let mut collector = SampleCollector::new(&layout);
//!
//! // ... radio layer calls collector.record_rssi / record_heading ...
//!
//! if collector.ready() {
//!     let outcome = positioner.run_cycle(&collector.take_snapshot(None))?;
//!     // outcome.position, outcome.bearing
//! }
//! # Ok::<(), beaconpath_core::PositioningError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Macro for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod bearing;
pub mod buffer;
pub mod conditioning;
pub mod constants;
pub mod distance;
pub mod errors;
pub mod geometry;
pub mod pipeline;
pub mod profile;
pub mod refine;
pub mod trilateration;

// Public API
pub use bearing::{average_heading, compute_bearing};
pub use buffer::SampleWindow;
pub use conditioning::trim_outliers;
pub use distance::{estimate_distance, DistanceEstimate, ScalarKalman};
pub use errors::{CycleWarning, PositioningError, PositioningResult};
pub use pipeline::{CycleInputs, CycleOutcome, Positioner, SampleCollector};
pub use profile::{
    beacon_index_from_name, parse_device_info, BeaconLayout, BeaconProfile, KalmanParams,
};
pub use refine::refine_position;
pub use trilateration::{trilaterate, Fix, RangedBeacon};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
