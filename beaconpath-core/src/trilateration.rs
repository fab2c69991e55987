//! Closed-Form Trilateration with Degeneracy Fallback
//!
//! ## Overview
//!
//! Given three beacons at known world positions and their estimated
//! distances, the solver builds an orthonormal frame from the beacon
//! triangle and solves the sphere intersection in closed form:
//!
//! ```text
//! ex = normalize(p2 − p1)          d = |p2 − p1|
//! i  = ex · (p3 − p1)              ey = normalize((p3 − p1) − i·ex)
//! ez = ex × ey                     j = ey · (p3 − p1)
//!
//! x  = (d1² − d2² + d²) / 2d
//! y  = (d1² − d3² + i² + j²) / 2j − (i/j)·x
//! z² = d1² − x² − y²               (clamped to 0 when negative)
//! ```
//!
//! World position = `p1 + x·ex + y·ey + √(z²)·ez`.
//!
//! ## Robustness
//!
//! RSSI ranging is noisy, so the three spheres rarely intersect exactly.
//! Rather than failing, inconsistencies degrade gracefully:
//!
//! - A negative z radical is clamped to 0 and recorded as an
//!   out-of-range warning - the planar fix is still useful.
//! - Extra beacons (4th and later) cross-check the solution; deviations
//!   beyond tolerance are recorded as measurement inconsistencies, and
//!   a gross deviation re-solves through the numerical refiner.
//! - Coincident or collinear beacons defeat the closed form entirely
//!   (`d` or `j` vanish); the solver falls back to the refiner before
//!   any division happens.

use heapless::Vec;

use crate::{
    constants::{
        CROSS_CHECK_REFINE_FACTOR, CROSS_CHECK_TOLERANCE_M, DEGENERACY_EPSILON,
        MAX_CYCLE_WARNINGS, MIN_BEACONS_FOR_FIX,
    },
    errors::{CycleWarning, PositioningError, PositioningResult},
    geometry::{self, Vec3},
    refine,
};

/// A beacon position paired with its measured distance for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedBeacon {
    /// Index of the beacon (name-suffix convention)
    pub beacon_index: u8,
    /// Fixed world position (meters)
    pub position: Vec3,
    /// Estimated distance from the user (meters, ≥ 0)
    pub distance: f64,
}

/// A solved position plus the non-fatal conditions met along the way
#[derive(Debug, Clone)]
pub struct Fix {
    /// User position in the beacon world frame (meters)
    pub position: Vec3,
    /// Non-fatal conditions recorded while solving
    pub warnings: Vec<CycleWarning, MAX_CYCLE_WARNINGS>,
}

/// Solves the user position from ≥3 ranged beacons
///
/// The first three beacons drive the closed form; any further beacons
/// only cross-check. `last_known` seeds the refiner when the closed
/// form is unusable.
pub fn trilaterate(ranged: &[RangedBeacon], last_known: Option<Vec3>) -> PositioningResult<Fix> {
    if ranged.len() < MIN_BEACONS_FOR_FIX {
        return Err(PositioningError::InsufficientBeacons {
            required: MIN_BEACONS_FOR_FIX,
            available: ranged.len(),
        });
    }

    let (b1, b2, b3) = (&ranged[0], &ranged[1], &ranged[2]);

    let r21 = geometry::sub(&b2.position, &b1.position);
    let r31 = geometry::sub(&b3.position, &b1.position);
    let d = geometry::norm(&r21);

    if d < DEGENERACY_EPSILON {
        // Beacons 1 and 2 coincide, the frame has no x axis
        return refine_fallback(ranged, last_known);
    }

    let ex = geometry::scale(&r21, 1.0 / d);
    let i = geometry::dot(&ex, &r31);
    let ey_raw = geometry::sub(&r31, &geometry::scale(&ex, i));
    let j = geometry::norm(&ey_raw);

    if j < DEGENERACY_EPSILON {
        // Beacon 3 lies on the 1-2 line, the frame has no y axis
        return refine_fallback(ranged, last_known);
    }

    let ey = geometry::scale(&ey_raw, 1.0 / j);
    let ez = geometry::cross(&ex, &ey);

    let (d1, d2, d3) = (b1.distance, b2.distance, b3.distance);
    let x = (d1 * d1 - d2 * d2 + d * d) / (2.0 * d);
    let y = (d1 * d1 - d3 * d3 + i * i + j * j) / (2.0 * j) - (i / j) * x;

    let mut warnings = Vec::new();
    let radical = d1 * d1 - x * x - y * y;
    let z = if radical < 0.0 {
        log_warn!(
            "z radical {} is negative, clamping to plane; distances are inconsistent",
            radical
        );
        let _ = warnings.push(CycleWarning::OutOfRangeMeasurement { radical });
        0.0
    } else {
        libm::sqrt(radical)
    };

    let mut position = b1.position;
    position = geometry::add(&position, &geometry::scale(&ex, x));
    position = geometry::add(&position, &geometry::scale(&ey, y));
    position = geometry::add(&position, &geometry::scale(&ez, z));

    // Cross-check against any extra beacons
    let mut worst_deviation = 0.0f64;
    for extra in &ranged[MIN_BEACONS_FOR_FIX..] {
        let geometric = geometry::distance_between(&extra.position, &position);
        let deviation = libm::fabs(geometric - extra.distance);

        if deviation > CROSS_CHECK_TOLERANCE_M {
            log_warn!(
                "beacon {} distance deviates by {} m from solved position",
                extra.beacon_index,
                deviation
            );
            let _ = warnings.push(CycleWarning::MeasurementInconsistency {
                beacon_index: extra.beacon_index,
                deviation,
            });
        }
        worst_deviation = worst_deviation.max(deviation);
    }

    // A gross cross-check failure means the closed form latched onto a
    // bad triple; re-solve over all beacons, seeded from its answer.
    if worst_deviation > CROSS_CHECK_REFINE_FACTOR * CROSS_CHECK_TOLERANCE_M {
        let refined = refine::refine_position(ranged, position)?;
        return Ok(Fix {
            position: refined,
            warnings,
        });
    }

    Ok(Fix { position, warnings })
}

fn refine_fallback(ranged: &[RangedBeacon], last_known: Option<Vec3>) -> PositioningResult<Fix> {
    let seed = last_known.unwrap_or([0.0; 3]);
    let position = refine::refine_position(ranged, seed)?;

    Ok(Fix {
        position,
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranged(index: u8, position: Vec3, target: &Vec3) -> RangedBeacon {
        RangedBeacon {
            beacon_index: index,
            position,
            distance: geometry::distance_between(&position, target),
        }
    }

    #[test]
    fn round_trip_recovers_point() {
        let target = [3.2, 4.7, 1.5];
        let beacons = [
            ranged(1, [0.0, 0.0, 0.0], &target),
            ranged(2, [10.0, 0.0, 0.0], &target),
            ranged(3, [0.0, 10.0, 0.0], &target),
        ];

        let fix = trilaterate(&beacons, None).unwrap();

        for axis in 0..3 {
            assert!((fix.position[axis] - target[axis]).abs() < 1e-6);
        }
        assert!(fix.warnings.is_empty());
    }

    #[test]
    fn planar_point_recovered_exactly() {
        let target = [2.0, 3.0, 0.0];
        let beacons = [
            ranged(1, [0.0, 0.0, 0.0], &target),
            ranged(2, [10.0, 0.0, 0.0], &target),
            ranged(3, [0.0, 10.0, 0.0], &target),
        ];

        let fix = trilaterate(&beacons, None).unwrap();
        assert!(geometry::distance_between(&fix.position, &target) < 1e-6);
    }

    #[test]
    fn inconsistent_distances_clamp_z() {
        // Distances too short for any 3-D intersection: the frame gives
        // x = y = 1, so the radical is 1 − 1 − 1 = −1
        let beacons = [
            RangedBeacon { beacon_index: 1, position: [0.0, 0.0, 0.0], distance: 1.0 },
            RangedBeacon { beacon_index: 2, position: [10.0, 0.0, 0.0], distance: 9.0 },
            RangedBeacon { beacon_index: 3, position: [0.0, 10.0, 0.0], distance: 9.0 },
        ];

        let fix = trilaterate(&beacons, None).unwrap();

        assert_eq!(fix.position[2], 0.0);
        assert!(fix
            .warnings
            .iter()
            .any(|w| matches!(w, CycleWarning::OutOfRangeMeasurement { .. })));
    }

    #[test]
    fn too_few_beacons() {
        let target = [1.0, 1.0, 0.0];
        let beacons = [
            ranged(1, [0.0, 0.0, 0.0], &target),
            ranged(2, [10.0, 0.0, 0.0], &target),
        ];

        let err = trilaterate(&beacons, None).unwrap_err();
        assert_eq!(
            err,
            PositioningError::InsufficientBeacons { required: 3, available: 2 }
        );
    }

    #[test]
    fn fourth_beacon_cross_check() {
        let target = [3.0, 3.0, 0.0];
        let mut beacons = heapless::Vec::<RangedBeacon, 4>::new();
        beacons.push(ranged(1, [0.0, 0.0, 0.0], &target)).unwrap();
        beacons.push(ranged(2, [10.0, 0.0, 0.0], &target)).unwrap();
        beacons.push(ranged(3, [0.0, 10.0, 0.0], &target)).unwrap();

        // Consistent 4th beacon: no warning
        beacons.push(ranged(4, [10.0, 10.0, 0.0], &target)).unwrap();
        let fix = trilaterate(&beacons, None).unwrap();
        assert!(fix.warnings.is_empty());

        // Perturb it past tolerance (but below the refine threshold)
        beacons[3].distance += 0.5;
        let fix = trilaterate(&beacons, None).unwrap();
        assert!(matches!(
            fix.warnings[0],
            CycleWarning::MeasurementInconsistency { beacon_index: 4, .. }
        ));
    }

    #[test]
    fn collinear_beacons_fall_back_to_refiner() {
        let target = [2.0, 5.0, 0.0];
        // All three beacons on the x axis: closed form undefined, but
        // the refiner can still find a planar minimum.
        let beacons = [
            ranged(1, [0.0, 0.0, 0.0], &target),
            ranged(2, [5.0, 0.0, 0.0], &target),
            ranged(3, [10.0, 0.0, 0.0], &target),
        ];

        let fix = trilaterate(&beacons, Some([1.0, 4.0, 0.0])).unwrap();

        // Collinear layouts leave a mirror ambiguity across the beacon
        // line; the residual itself must still vanish.
        for b in &beacons {
            let geometric = geometry::distance_between(&b.position, &fix.position);
            assert!((geometric - b.distance).abs() < 1e-3);
        }
    }

    #[test]
    fn coincident_beacons_fall_back() {
        let target = [1.0, 2.0, 0.0];
        let beacons = [
            ranged(1, [0.0, 0.0, 0.0], &target),
            ranged(2, [0.0, 0.0, 0.0], &target),
            ranged(3, [5.0, 0.0, 0.0], &target),
        ];

        // Coincident pair: no unique solution, but the call must not
        // panic or divide by zero - either a refined fix or a clean
        // degenerate-geometry error is acceptable.
        match trilaterate(&beacons, Some(target)) {
            Ok(fix) => {
                for b in &beacons {
                    let geometric = geometry::distance_between(&b.position, &fix.position);
                    assert!((geometric - b.distance).abs() < 1e-2);
                }
            }
            Err(err) => assert_eq!(err, PositioningError::DegenerateGeometry),
        }
    }
}
