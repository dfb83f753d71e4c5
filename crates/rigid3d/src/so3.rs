//! Rotation-vector (axis-angle) maps for SO(3).
//!
//! A rotation vector `v` encodes a rotation of `|v|` radians about the axis
//! `v / |v|`. It is the minimal 3-parameter encoding used by the optimizer
//! parameter contract: non-redundant and free of gimbal lock. The maps below
//! go through unit quaternions; small angles take a Taylor branch to avoid
//! dividing by a vanishing angle.

use glam::{DMat3, DQuat, DVec3};
use rand::Rng;

const SMALL_ANGLE_EPSILON: f64 = 1.0e-6;

/// Rotation vector -> unit quaternion.
///
/// `q = (cos(theta/2), sin(theta/2) * axis)` with `theta = |v|`.
pub fn exp(v: DVec3) -> DQuat {
    let theta = v.length();

    let (w, b) = if theta < SMALL_ANGLE_EPSILON {
        // sin(theta/2)/theta -> 1/2 as theta -> 0
        (1.0, 0.5)
    } else {
        let theta_half = theta / 2.0;
        (theta_half.cos(), theta_half.sin() / theta)
    };
    let xyz = b * v;

    DQuat::from_xyzw(xyz.x, xyz.y, xyz.z, w)
}

/// Unit quaternion -> rotation vector. Inverse of [`exp`].
pub fn log(q: DQuat) -> DVec3 {
    let vec = DVec3::new(q.x, q.y, q.z);
    let norm = vec.length();

    if norm < SMALL_ANGLE_EPSILON {
        // first-order: v ~= 2 * vec / w
        vec * 2.0 / q.w
    } else {
        vec * 2.0 * norm.atan2(q.w) / norm
    }
}

/// Skew-symmetric matrix of `v`, satisfying `hat(v) * w == v.cross(w)`.
pub fn hat(v: DVec3) -> DMat3 {
    DMat3::from_cols_array(&[
        0.0, v.z, -v.y, //
        -v.z, 0.0, v.x, //
        v.y, -v.x, 0.0,
    ])
}

/// Right Jacobian of SO(3) at `v`.
///
/// Satisfies `exp(v + dv) ~= exp(v) * exp(right_jacobian(v) * dv)` for small
/// `dv`; the rotation block of the transform Jacobian is built from it.
pub fn right_jacobian(v: DVec3) -> DMat3 {
    let skew = hat(v);
    let theta = v.length();

    if theta < SMALL_ANGLE_EPSILON {
        // Taylor: (1-cos)/theta^2 -> 1/2, (theta-sin)/theta^3 -> 1/6
        DMat3::IDENTITY - 0.5 * skew + (skew * skew) * (1.0 / 6.0)
    } else {
        DMat3::IDENTITY - ((1.0 - theta.cos()) / theta.powi(2)) * skew
            + ((theta - theta.sin()) / theta.powi(3)) * (skew * skew)
    }
}

/// Uniformly distributed random unit quaternion (Shoemake method).
pub fn random_rotation() -> DQuat {
    let mut rng = rand::rng();

    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let r3: f64 = rng.random();

    let one_minus_r1_sqrt = (1.0 - r1).sqrt();
    let r1_sqrt = r1.sqrt();

    let w = one_minus_r1_sqrt * (2.0 * std::f64::consts::PI * r2).cos();
    let x = one_minus_r1_sqrt * (2.0 * std::f64::consts::PI * r2).sin();
    let y = r1_sqrt * (2.0 * std::f64::consts::PI * r3).cos();
    let z = r1_sqrt * (2.0 * std::f64::consts::PI * r3).sin();

    DQuat::from_xyzw(x, y, z, w).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exp_zero() {
        let q = exp(DVec3::ZERO);
        assert_eq!(q, DQuat::from_xyzw(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_exp_log_roundtrip() {
        for v in [
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.1, -0.2, 0.3),
            DVec3::new(-2.0, 1.0, 0.5),
            DVec3::new(1e-9, -1e-9, 1e-9),
        ] {
            let log_v = log(exp(v));
            assert_relative_eq!(log_v.x, v.x, epsilon = 1e-12);
            assert_relative_eq!(log_v.y, v.y, epsilon = 1e-12);
            assert_relative_eq!(log_v.z, v.z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_exp_matches_axis_angle() {
        let axis = DVec3::new(0.0, 0.0, 1.0);
        let angle = std::f64::consts::FRAC_PI_2;
        let q = exp(axis * angle);
        let expected = DQuat::from_axis_angle(axis, angle);
        assert_relative_eq!(q.dot(expected).abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hat_cross_product() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        let w = DVec3::new(-0.5, 0.4, 2.0);
        let hat_w = hat(v) * w;
        let cross = v.cross(w);
        assert_relative_eq!(hat_w.x, cross.x, epsilon = 1e-12);
        assert_relative_eq!(hat_w.y, cross.y, epsilon = 1e-12);
        assert_relative_eq!(hat_w.z, cross.z, epsilon = 1e-12);
    }

    #[test]
    fn test_hat_antisymmetric() {
        let m = hat(DVec3::new(0.3, -1.2, 0.7));
        let sum = m + m.transpose();
        assert!(sum.to_cols_array().iter().all(|&x| x.abs() < 1e-15));
    }

    #[test]
    fn test_right_jacobian_identity_at_zero() {
        let jr = right_jacobian(DVec3::ZERO);
        let diff = jr - DMat3::IDENTITY;
        assert!(diff.to_cols_array().iter().all(|&x| x.abs() < 1e-12));
    }

    #[test]
    fn test_right_jacobian_small_angle_branch_continuous() {
        // the two branches must agree around the switch point
        let v = DVec3::new(2e-6, 0.0, 0.0);
        let exact = right_jacobian(v);
        let taylor = DMat3::IDENTITY - 0.5 * hat(v) + (hat(v) * hat(v)) * (1.0 / 6.0);
        let diff = exact - taylor;
        assert!(diff.to_cols_array().iter().all(|&x| x.abs() < 1e-12));
    }

    #[test]
    fn test_random_rotation_is_unit() {
        for _ in 0..10 {
            let q = random_rotation();
            assert_relative_eq!(q.length(), 1.0, epsilon = 1e-12);
        }
    }
}
