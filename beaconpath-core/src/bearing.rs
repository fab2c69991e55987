//! Bearing Fusion: Compass Headings + Solved Position + Beacon Geometry
//!
//! ## Overview
//!
//! The final pipeline stage answers "how far do I turn to face the
//! target?". It fuses three inputs:
//!
//! - the solved user position (projected onto the beacon plane),
//! - a batch of magnetic compass headings, averaged,
//! - the layout's two designated beacons: the anchor (index 1) carries
//!   a fixed boresight angle toward the target, the baseline beacon
//!   (index 2) fixes the reference direction from the anchor.
//!
//! ```text
//! angle_n  = atan2(baseline.y, baseline.x) + anchor.boresight
//! forward  = unit vector at (angle_n − averaged heading)
//! to target= −user_xy            (target sits at the world origin)
//! bearing  = ±acos(to_target · forward / |to_target|)
//! ```
//!
//! ## Conventions (pinned)
//!
//! - Raw compass readings are degrees, clockwise-from-north increasing.
//!   They are converted to the navigation convention used everywhere
//!   else in this module - **increasing = turning left** - via
//!   `360 − h`, then normalized into (−180, 180].
//! - The returned bearing is in [−180, 180]; **positive means turn
//!   left**, negative means turn right. The sign comes from the planar
//!   cross product of the forward vector and the user position vector.
//! - The target is fixed at the world origin; the beacon world frame is
//!   chosen at configuration time to make that true.
//!
//! ## Stuck-Sensor Heuristic
//!
//! Some magnetometers report exactly 0° when wedged rather than when
//! facing north. A batch therefore drops 0° readings until 0° recurs;
//! from the second occurrence onward zeros are averaged like any other
//! reading (the first zero stays dropped even then, so one sample per
//! batch is sacrificed to the check). This is a heuristic, not a proven
//! correction - a user genuinely facing north produces consistent zeros
//! and loses only that one sample.

use crate::{
    constants::STUCK_ZERO_MIN_RECURRENCE,
    errors::{PositioningError, PositioningResult},
    geometry::{self, Vec2, Vec3},
    profile::BeaconLayout,
};

/// Length below which the user is considered to be standing on the
/// target, making the bearing direction meaningless.
const AT_TARGET_EPSILON: f64 = 1e-9;

/// Wraps an angle in degrees into (−180, 180]
fn normalize_degrees(mut angle: f64) -> f64 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Averages a compass batch into one heading (degrees, left-positive)
///
/// Applies the raw-to-navigation conversion and the stuck-at-zero
/// heuristic described in the module docs.
///
/// ## Errors
///
/// `SensorUnavailable` if the batch is empty or every sample was
/// rejected by the heuristic.
pub fn average_heading(batch: &[f64]) -> PositioningResult<f64> {
    if batch.is_empty() {
        return Err(PositioningError::SensorUnavailable);
    }

    let mut sum = 0.0;
    let mut accepted = 0usize;
    let mut zeros_seen = 0usize;
    for &raw in batch {
        if raw == 0.0 {
            zeros_seen += 1;
            // Zeros only start counting once they recur
            if zeros_seen < STUCK_ZERO_MIN_RECURRENCE {
                continue;
            }
        }
        sum += normalize_degrees(360.0 - raw);
        accepted += 1;
    }

    if accepted == 0 {
        return Err(PositioningError::SensorUnavailable);
    }

    Ok(sum / accepted as f64)
}

/// Computes the signed bearing from the user toward the target
///
/// ## Errors
///
/// - `InsufficientBeaconMetadata` if the layout lacks the anchor
///   (index 1) or baseline (index 2) beacon. The caller's position is
///   unaffected - only the bearing is unavailable.
/// - `SensorUnavailable` if the compass batch yields no heading.
pub fn compute_bearing(
    user_position: Vec3,
    compass_batch: &[f64],
    layout: &BeaconLayout,
) -> PositioningResult<f64> {
    let anchor = layout
        .anchor()
        .ok_or(PositioningError::InsufficientBeaconMetadata)?;
    let baseline = layout
        .baseline()
        .ok_or(PositioningError::InsufficientBeaconMetadata)?;

    let heading = average_heading(compass_batch)?;

    // Polar angle of the anchor-to-target direction: baseline geometry
    // plus the anchor's calibrated boresight offset.
    let baseline_angle =
        libm::atan2(baseline.position[1], baseline.position[0]).to_degrees();
    let angle_n = baseline_angle + anchor.boresight_offset_deg;

    // The user's facing direction: boresight direction rotated back by
    // the averaged heading (heading is left-positive).
    let forward_angle = (angle_n - heading).to_radians();
    let forward: Vec2 = [libm::cos(forward_angle), libm::sin(forward_angle)];

    let user_xy: Vec2 = [user_position[0], user_position[1]];
    let to_target: Vec2 = [-user_xy[0], -user_xy[1]];

    let separation = geometry::norm2(&to_target);
    if separation < AT_TARGET_EPSILON {
        // Standing on the target: no turn needed
        return Ok(0.0);
    }

    // |forward| = 1, so only the target vector needs normalizing
    let cos_alpha = (geometry::dot2(&to_target, &forward) / separation).clamp(-1.0, 1.0);
    let mut alpha = libm::acos(cos_alpha).to_degrees();

    // acos gives magnitude only; the side of the forward vector the
    // user position falls on decides left vs. right.
    if geometry::cross2(&forward, &user_xy) > 0.0 {
        alpha = -alpha;
    }

    Ok(alpha)
}
