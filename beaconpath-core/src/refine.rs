//! Numerical Position Refinement (Nelder-Mead)
//!
//! ## Overview
//!
//! When the closed-form trilateration is unusable - coincident or
//! collinear beacons, or a solution the cross-check rejects outright -
//! the position is found by direct minimization of the ranging residual:
//!
//! ```text
//! f(p) = Σᵢ (dᵢ − |p − beaconᵢ|)²
//! ```
//!
//! Nelder-Mead is used because the residual's gradient is undefined at
//! every beacon position (the |·| kink), the dimension is tiny (3), and
//! a derivative-free simplex needs nothing beyond stack arrays - no
//! allocation, no linear algebra.
//!
//! ## Algorithm
//!
//! Standard reflection / expansion / contraction / shrink with the
//! conventional coefficients (α=1, γ=2, ρ=0.5, σ=0.5). The simplex
//! starts at the seed point with one vertex offset per axis. The run
//! converges when best and worst residuals agree within tolerance;
//! exhausting the iteration budget is reported as degenerate geometry.
//!
//! The criterion bounds the residual, not the position. With every
//! beacon in one plane the residual is only quartic in the out-of-plane
//! offset, so the returned z can sit millimeters off the plane while
//! the in-plane components are converged far tighter.

use crate::{
    constants::{REFINER_INITIAL_STEP, REFINER_MAX_ITERATIONS, REFINER_TOLERANCE},
    errors::{PositioningError, PositioningResult},
    geometry::{self, Vec3},
    trilateration::RangedBeacon,
};

/// Simplex vertex count for a 3-D search
const VERTICES: usize = 4;

// Conventional Nelder-Mead coefficients
const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Sum of squared ranging residuals at a candidate position
fn residual(ranged: &[RangedBeacon], candidate: &Vec3) -> f64 {
    let mut sum = 0.0;
    for beacon in ranged {
        let diff = beacon.distance - geometry::distance_between(candidate, &beacon.position);
        sum += diff * diff;
    }
    sum
}

/// Centroid of all vertices except the worst
fn centroid_excluding(simplex: &[Vec3; VERTICES], worst: usize) -> Vec3 {
    let mut c = [0.0; 3];
    for (v, vertex) in simplex.iter().enumerate() {
        if v != worst {
            c = geometry::add(&c, vertex);
        }
    }
    geometry::scale(&c, 1.0 / (VERTICES - 1) as f64)
}

/// Point on the line through the centroid and the worst vertex
///
/// `factor` > 0 reflects away from the worst vertex, < 0 contracts
/// toward it.
fn along(centroid: &Vec3, worst: &Vec3, factor: f64) -> Vec3 {
    geometry::add(centroid, &geometry::scale(&geometry::sub(centroid, worst), factor))
}

/// Minimizes the ranging residual from a seed position
///
/// The seed is the last known position when the caller has one, else
/// the world origin. Returns `DegenerateGeometry` when the simplex
/// fails to collapse within the iteration budget.
pub fn refine_position(ranged: &[RangedBeacon], seed: Vec3) -> PositioningResult<Vec3> {
    let mut simplex: [Vec3; VERTICES] = [seed; VERTICES];
    for axis in 0..3 {
        simplex[axis + 1][axis] += REFINER_INITIAL_STEP;
    }

    let mut values = [0.0; VERTICES];
    for (v, vertex) in simplex.iter().enumerate() {
        values[v] = residual(ranged, vertex);
    }

    for _ in 0..REFINER_MAX_ITERATIONS {
        // Order the simplex: best, worst, second worst
        let mut best = 0;
        let mut worst = 0;
        for v in 1..VERTICES {
            if values[v] < values[best] {
                best = v;
            }
            if values[v] > values[worst] {
                worst = v;
            }
        }
        let mut second_worst = best;
        for v in 0..VERTICES {
            if v != worst && values[v] > values[second_worst] {
                second_worst = v;
            }
        }

        if values[worst] - values[best] < REFINER_TOLERANCE {
            return Ok(simplex[best]);
        }

        let centroid = centroid_excluding(&simplex, worst);
        let reflected = along(&centroid, &simplex[worst], REFLECTION);
        let f_reflected = residual(ranged, &reflected);

        if f_reflected < values[best] {
            // Reflection found a new best: try pushing further
            let expanded = along(&centroid, &simplex[worst], EXPANSION);
            let f_expanded = residual(ranged, &expanded);

            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
        } else if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
        } else {
            // Contract toward the better side of the worst vertex
            let contracted = if f_reflected < values[worst] {
                along(&centroid, &simplex[worst], CONTRACTION)
            } else {
                along(&centroid, &simplex[worst], -CONTRACTION)
            };
            let f_contracted = residual(ranged, &contracted);

            if f_contracted < values[worst].min(f_reflected) {
                simplex[worst] = contracted;
                values[worst] = f_contracted;
            } else {
                // Shrink everything toward the best vertex
                let best_vertex = simplex[best];
                for v in 0..VERTICES {
                    if v != best {
                        simplex[v] = geometry::add(
                            &best_vertex,
                            &geometry::scale(&geometry::sub(&simplex[v], &best_vertex), SHRINK),
                        );
                        values[v] = residual(ranged, &simplex[v]);
                    }
                }
            }
        }
    }

    Err(PositioningError::DegenerateGeometry)
}
