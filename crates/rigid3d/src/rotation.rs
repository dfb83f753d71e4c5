//! Orthonormal 3x3 rotation matrix with a maintained inverse.
//!
//! The direct matrix and its inverse are stored together and only ever
//! updated as a pair, so inversion is a field swap instead of a recompute.
//! For a true rotation the cached inverse is the transpose.

use glam::{DMat3, DQuat, DVec3};

use crate::so3;

/// A 3x3 rotation matrix paired with its cached inverse.
///
/// Invariant: at any observable instant the cached inverse is consistent with
/// the direct matrix. Constructors derive it from the direct matrix; mutators
/// update both fields together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix {
    direct: DMat3,
    inverse: DMat3,
}

impl RotationMatrix {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        direct: DMat3::IDENTITY,
        inverse: DMat3::IDENTITY,
    };

    /// Create a rotation from a matrix.
    ///
    /// NOTE: the matrix should be orthonormal; the cached inverse is set to
    /// its transpose. Call [`orthonormalize`](Self::orthonormalize) if the
    /// input may have drifted.
    pub fn from_matrix(direct: DMat3) -> Self {
        Self {
            direct,
            inverse: direct.transpose(),
        }
    }

    /// Create a rotation from a quaternion. The quaternion is normalized
    /// before conversion.
    pub fn from_quaternion(q: DQuat) -> Self {
        Self::from_matrix(DMat3::from_quat(q.normalize()))
    }

    /// Create a rotation of `angle` radians about `axis`.
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        Self::from_quaternion(DQuat::from_axis_angle(axis.normalize(), angle))
    }

    /// Uniformly distributed random rotation.
    pub fn from_random() -> Self {
        Self::from_quaternion(so3::random_rotation())
    }

    /// Pair a direct matrix with an explicit inverse, bypassing the
    /// transpose derivation. Test seam for modeling drifted matrices whose
    /// honest inverse is no longer the transpose.
    pub(crate) fn from_parts(direct: DMat3, inverse: DMat3) -> Self {
        Self { direct, inverse }
    }

    /// The direct matrix.
    pub fn matrix(&self) -> &DMat3 {
        &self.direct
    }

    /// The cached inverse matrix.
    pub fn inverse_matrix(&self) -> &DMat3 {
        &self.inverse
    }

    /// Determinant of the direct matrix. +1 for a proper rotation.
    pub fn determinant(&self) -> f64 {
        self.direct.determinant()
    }

    /// Largest absolute entry of `R^t * R - I`, the distance from the
    /// orthonormal manifold.
    pub fn orthonormality_deviation(&self) -> f64 {
        let residual = self.direct.transpose() * self.direct - DMat3::IDENTITY;
        residual
            .to_cols_array()
            .iter()
            .fold(0.0, |acc, &x| f64::max(acc, x.abs()))
    }

    /// Project the direct matrix back onto the orthonormal manifold and
    /// recompute the cached inverse.
    ///
    /// Round-trips through a normalized quaternion, which discards any
    /// scaling and shear accumulated by repeated matrix products.
    pub fn orthonormalize(&mut self) {
        let deviation = self.orthonormality_deviation();
        self.direct = DMat3::from_quat(DQuat::from_mat3(&self.direct).normalize());
        self.inverse = self.direct.transpose();
        log::trace!("re-orthonormalized rotation, deviation was {deviation:.3e}");
    }

    /// Rotation composed with `other`: `self` applied after `other`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            direct: self.direct * other.direct,
            inverse: other.inverse * self.inverse,
        }
    }

    /// The inverse rotation. Swaps the cached pair; no arithmetic.
    pub fn inverted(&self) -> Self {
        Self {
            direct: self.inverse,
            inverse: self.direct,
        }
    }

    /// Apply the rotation to a point or free vector: `R * v`.
    pub fn rotate(&self, v: DVec3) -> DVec3 {
        self.direct * v
    }

    /// Apply the inverse rotation: `R^-1 * v`, through the cached inverse.
    pub fn rotate_inverse(&self, v: DVec3) -> DVec3 {
        self.inverse * v
    }

    /// Apply the covariant rule: `(R^-1)^t * c`, through the cached inverse.
    ///
    /// For an exactly orthonormal matrix this coincides with [`rotate`], but
    /// the inverse-transpose path is kept distinct so covariant quantities
    /// stay correct when the direct matrix has drifted.
    pub fn rotate_covariant(&self, c: DVec3) -> DVec3 {
        self.inverse.transpose() * c
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let r = RotationMatrix::IDENTITY;
        assert_eq!(*r.matrix(), DMat3::IDENTITY);
        assert_eq!(*r.inverse_matrix(), DMat3::IDENTITY);
        assert_relative_eq!(r.determinant(), 1.0);
    }

    #[test]
    fn test_inverse_is_transpose() {
        let r = RotationMatrix::from_axis_angle(DVec3::new(1.0, 2.0, -1.0), 0.8);
        let diff = *r.inverse_matrix() - r.matrix().transpose();
        assert!(diff.to_cols_array().iter().all(|&x| x.abs() < 1e-15));
    }

    #[test]
    fn test_compose_keeps_pair_consistent() {
        let a = RotationMatrix::from_axis_angle(DVec3::X, 0.3);
        let b = RotationMatrix::from_axis_angle(DVec3::Z, -1.1);
        let c = a.compose(&b);
        let product = c.matrix().mul_mat3(c.inverse_matrix());
        let diff = product - DMat3::IDENTITY;
        assert!(diff.to_cols_array().iter().all(|&x| x.abs() < 1e-12));
    }

    #[test]
    fn test_inverted_roundtrip() {
        let r = RotationMatrix::from_random();
        let back = r.inverted().inverted();
        assert_eq!(*back.matrix(), *r.matrix());
    }

    #[test]
    fn test_orthonormalize_projects_back() {
        let r = RotationMatrix::from_axis_angle(DVec3::Y, 0.6);
        // uniform scaling knocks the matrix off the manifold
        let mut drifted = RotationMatrix::from_matrix(*r.matrix() * 1.001);
        assert!(drifted.orthonormality_deviation() > 1e-4);

        drifted.orthonormalize();
        assert!(drifted.orthonormality_deviation() < 1e-12);
        let diff = *drifted.matrix() - *r.matrix();
        assert!(diff.to_cols_array().iter().all(|&x| x.abs() < 1e-9));
    }

    #[test]
    fn test_rotate_covariant_matches_rotate_when_orthonormal() {
        let r = RotationMatrix::from_random();
        let c = DVec3::new(0.4, -1.0, 2.5);
        let a = r.rotate(c);
        let b = r.rotate_covariant(c);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-12);
    }
}
