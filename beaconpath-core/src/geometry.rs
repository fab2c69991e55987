//! Vector Operations for Trilateration and Bearing Math
//!
//! Plain functions over fixed-size arrays - no allocation, no generics
//! beyond what the call sites need. All math is `f64` via `libm` so the
//! same code runs with and without `std`; the trilateration round-trip
//! accuracy target (1e-6 m) rules out single precision.

/// 3-D point or vector in the beacon world frame (meters)
pub type Vec3 = [f64; 3];

/// 2-D vector for the planar bearing step
pub type Vec2 = [f64; 2];

/// Dot product: u · v
pub fn dot(u: &Vec3, v: &Vec3) -> f64 {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

/// Euclidean norm: |v|
pub fn norm(v: &Vec3) -> f64 {
    libm::sqrt(dot(v, v))
}

/// Component-wise difference: u − v
pub fn sub(u: &Vec3, v: &Vec3) -> Vec3 {
    [u[0] - v[0], u[1] - v[1], u[2] - v[2]]
}

/// Component-wise sum: u + v
pub fn add(u: &Vec3, v: &Vec3) -> Vec3 {
    [u[0] + v[0], u[1] + v[1], u[2] + v[2]]
}

/// Scalar multiple: s·v
pub fn scale(v: &Vec3, s: f64) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

/// Unit vector in the direction of `v`
///
/// Callers must guard against zero-length input; the solver checks the
/// norm against its degeneracy epsilon before normalizing.
pub fn normalize(v: &Vec3) -> Vec3 {
    scale(v, 1.0 / norm(v))
}

/// Cross product: u × v
pub fn cross(u: &Vec3, v: &Vec3) -> Vec3 {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

/// Distance between two points
pub fn distance_between(u: &Vec3, v: &Vec3) -> f64 {
    norm(&sub(u, v))
}

/// Planar cross product z-component: uₓ·v_y − u_y·vₓ
///
/// Sign resolves which side of `u` the vector `v` lies on.
pub fn cross2(u: &Vec2, v: &Vec2) -> f64 {
    u[0] * v[1] - u[1] * v[0]
}

/// Planar dot product
pub fn dot2(u: &Vec2, v: &Vec2) -> f64 {
    u[0] * v[0] + u[1] * v[1]
}

/// Planar norm
pub fn norm2(v: &Vec2) -> f64 {
    libm::sqrt(dot2(v, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_norm() {
        let u = [3.0, 4.0, 0.0];
        assert_eq!(dot(&u, &u), 25.0);
        assert_eq!(norm(&u), 5.0);
    }

    #[test]
    fn cross_right_handed() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross(&x, &y), [0.0, 0.0, 1.0]);
        assert_eq!(cross(&y, &x), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn normalize_unit_length() {
        let v = [2.0, -2.0, 1.0];
        let n = normalize(&v);
        assert!((norm(&n) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn planar_cross_sign() {
        // y is to the left of x: positive cross
        assert!(cross2(&[1.0, 0.0], &[0.0, 1.0]) > 0.0);
        assert!(cross2(&[1.0, 0.0], &[0.0, -1.0]) < 0.0);
    }

    #[test]
    fn distance_symmetric() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 3.0];
        assert_eq!(distance_between(&a, &b), 5.0);
        assert_eq!(distance_between(&b, &a), 5.0);
    }
}
