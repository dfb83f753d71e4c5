//! Rigid 3D transform: a rotation followed by a translation.
//!
//! `Rigid3` is the registration primitive: it maps points as `R * p + t`,
//! free vectors as `R * v` and covariant vectors (gradients, normals) as
//! `(R^-1)^t * c`. Composition and inversion stay numerically consistent
//! across long chains of iterative refinement: the rotation is projected
//! back onto the orthonormal manifold after every composition.

use std::fmt;

use glam::{DMat4, DQuat, DVec3, DVec4};

use crate::error::TransformError;
use crate::rotation::RotationMatrix;
use crate::so3;

/// Number of optimizer parameters: 3 rotation-vector + 3 translation.
pub const NUM_PARAMETERS: usize = 6;

/// Determinant guard below which the rotation is treated as non-invertible.
const MIN_DETERMINANT: f64 = 1e-10;

/// A rigid transform of 3D space: rotation plus translation.
///
/// The transform is a plain `Copy` value; share it across workers by
/// cloning, not by aliasing, since mutators rewrite the cached rotation
/// pair in place.
#[derive(Debug, Clone, Copy)]
pub struct Rigid3 {
    rotation: RotationMatrix,
    offset: DVec3,
}

impl Rigid3 {
    /// The identity transform: `R = I`, `t = 0`.
    pub const IDENTITY: Self = Self {
        rotation: RotationMatrix::IDENTITY,
        offset: DVec3::ZERO,
    };

    /// Create a transform from a rotation and a translation offset.
    pub fn new(rotation: RotationMatrix, offset: DVec3) -> Self {
        Self { rotation, offset }
    }

    /// Create a transform rotating by `angle` radians about `axis`, then
    /// translating by `offset`.
    pub fn from_axis_angle(axis: DVec3, angle: f64, offset: DVec3) -> Self {
        Self::new(RotationMatrix::from_axis_angle(axis, angle), offset)
    }

    /// Uniformly distributed random rigid transform with offset components
    /// in `[-1, 1)`.
    pub fn from_random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let offset = DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        Self::new(RotationMatrix::from_random(), offset)
    }

    /// The rotation component.
    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    /// The translation offset.
    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    /// Replace the rotation component. The cached inverse travels with the
    /// [`RotationMatrix`], so the pair stays consistent.
    pub fn set_rotation(&mut self, rotation: RotationMatrix) {
        self.rotation = rotation;
    }

    /// Replace the translation offset.
    pub fn set_offset(&mut self, offset: DVec3) {
        self.offset = offset;
    }

    /// Map a point: `R * p + t`.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation.rotate(point) + self.offset
    }

    /// Map a free vector (difference of points, direction): `R * v`.
    /// Translation-invariant.
    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.rotation.rotate(vector)
    }

    /// Map a covariant vector (gradient, normal): `(R^-1)^t * c`.
    ///
    /// Computed through the cached inverse, not the direct matrix, so the
    /// covariant rule holds even if the rotation has drifted off the
    /// orthonormal manifold.
    pub fn transform_covariant_vector(&self, covariant: DVec3) -> DVec3 {
        self.rotation.rotate_covariant(covariant)
    }

    /// Pre-image of a point under the transform: `R^-1 * (p - t)`.
    ///
    /// Fails with [`TransformError::NotInvertible`] if the rotation has
    /// collapsed toward a singular matrix.
    pub fn back_transform_point(&self, point: DVec3) -> Result<DVec3, TransformError> {
        self.check_invertible()?;
        Ok(self.rotation.rotate_inverse(point - self.offset))
    }

    /// Pre-image of a free vector: `R^-1 * v`.
    pub fn back_transform_vector(&self, vector: DVec3) -> Result<DVec3, TransformError> {
        self.check_invertible()?;
        Ok(self.rotation.rotate_inverse(vector))
    }

    /// Pre-image of a covariant vector: the covariant rule of the inverse
    /// rotation, through the cached pair.
    pub fn back_transform_covariant_vector(
        &self,
        covariant: DVec3,
    ) -> Result<DVec3, TransformError> {
        self.check_invertible()?;
        Ok(self.rotation.inverted().rotate_covariant(covariant))
    }

    /// Compose in place with `other`.
    ///
    /// * `pre = false` (post-composition): the result applies `other` first,
    ///   then `self` — `R <- R_self * R_other`, `t <- R_self * t_other + t_self`.
    /// * `pre = true` (pre-composition): the result applies `self` first,
    ///   then `other` — `R <- R_other * R_self`, `t <- t_other + R_other * t_self`.
    ///
    /// The two orders do not commute in general. After the update the
    /// rotation is re-orthonormalized so repeated composition cannot
    /// accumulate scaling or shear.
    pub fn compose(&mut self, other: &Rigid3, pre: bool) {
        let (rotation, offset) = if pre {
            (
                other.rotation.compose(&self.rotation),
                other.offset + other.rotation.rotate(self.offset),
            )
        } else {
            (
                self.rotation.compose(&other.rotation),
                self.rotation.rotate(other.offset) + self.offset,
            )
        };
        self.rotation = rotation;
        self.offset = offset;
        self.rotation.orthonormalize();
    }

    /// Compose in place with a pure translation.
    ///
    /// With `pre = true` the offset is prepended in the original frame
    /// (`t <- R * offset + t`); otherwise it is appended in the transformed
    /// frame (`t <- t + offset`). The rotation is untouched, so no drift
    /// correction is needed.
    pub fn translate(&mut self, offset: DVec3, pre: bool) {
        if pre {
            self.offset += self.rotation.rotate(offset);
        } else {
            self.offset += offset;
        }
    }

    /// A fresh transform mapping the other way: `R' = R^-1`, `t' = -R^-1 * t`.
    ///
    /// Does not mutate `self`. The rotation inverse is the cached pair
    /// swapped, so this is a defensive determinant check plus one rotation.
    pub fn inverse(&self) -> Result<Rigid3, TransformError> {
        self.check_invertible()?;
        let rotation = self.rotation.inverted();
        let offset = -rotation.rotate(self.offset);
        Ok(Rigid3 { rotation, offset })
    }

    /// Homogeneous 4x4 matrix form of the transform.
    pub fn as_matrix(&self) -> DMat4 {
        let mut matrix = DMat4::from_mat3(*self.rotation.matrix());
        matrix.w_axis = DVec4::new(self.offset.x, self.offset.y, self.offset.z, 1.0);
        matrix
    }

    /// The 6 optimizer parameters: rotation vector then translation,
    /// `[rx, ry, rz, tx, ty, tz]`.
    pub fn parameters(&self) -> [f64; NUM_PARAMETERS] {
        let rvec = so3::log(DQuat::from_mat3(self.rotation.matrix()));
        [
            rvec.x,
            rvec.y,
            rvec.z,
            self.offset.x,
            self.offset.y,
            self.offset.z,
        ]
    }

    /// Rebuild the transform from 6 parameters (see
    /// [`parameters`](Self::parameters)).
    ///
    /// Fails with [`TransformError::InvalidParametersLength`] if the slice
    /// length is not 6 and [`TransformError::NonFiniteParameter`] if any
    /// component is NaN or infinite. A failed call leaves the transform
    /// unchanged.
    pub fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), TransformError> {
        if parameters.len() != NUM_PARAMETERS {
            return Err(TransformError::InvalidParametersLength {
                expected: NUM_PARAMETERS,
                got: parameters.len(),
            });
        }
        if let Some(index) = parameters.iter().position(|p| !p.is_finite()) {
            return Err(TransformError::NonFiniteParameter { index });
        }

        let rvec = DVec3::new(parameters[0], parameters[1], parameters[2]);
        self.rotation = RotationMatrix::from_quaternion(so3::exp(rvec));
        self.offset = DVec3::new(parameters[3], parameters[4], parameters[5]);
        Ok(())
    }

    /// Partial derivatives of the transformed-point coordinates with respect
    /// to the 6 parameters, evaluated at `point`: a 3x6 matrix, row per
    /// output coordinate.
    ///
    /// Rotation block: `-R * hat(p) * Jr(rvec)` with `Jr` the right Jacobian
    /// of SO(3); translation block: identity.
    pub fn jacobian(&self, point: DVec3) -> [[f64; NUM_PARAMETERS]; 3] {
        let rvec = so3::log(DQuat::from_mat3(self.rotation.matrix()));
        let rotation_block =
            -(*self.rotation.matrix() * so3::hat(point) * so3::right_jacobian(rvec));

        let mut jacobian = [[0.0; NUM_PARAMETERS]; 3];
        for (col, axis) in [
            rotation_block.x_axis,
            rotation_block.y_axis,
            rotation_block.z_axis,
        ]
        .iter()
        .enumerate()
        {
            jacobian[0][col] = axis.x;
            jacobian[1][col] = axis.y;
            jacobian[2][col] = axis.z;
        }
        for row in 0..3 {
            jacobian[row][3 + row] = 1.0;
        }
        jacobian
    }

    /// Value equality within an absolute tolerance, component-wise over the
    /// rotation matrix and offset.
    pub fn approx_eq(&self, other: &Rigid3, epsilon: f64) -> bool {
        let rotation_diff = *self.rotation.matrix() - *other.rotation.matrix();
        let offset_diff = self.offset - other.offset;
        rotation_diff
            .to_cols_array()
            .iter()
            .chain(offset_diff.to_array().iter())
            .all(|&x| x.abs() <= epsilon)
    }

    fn check_invertible(&self) -> Result<(), TransformError> {
        let determinant = self.rotation.determinant();
        if determinant.abs() < MIN_DETERMINANT {
            return Err(TransformError::NotInvertible { determinant });
        }
        Ok(())
    }
}

impl Default for Rigid3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Rigid3 {
    /// Human-readable dump of the direct matrix, its cached inverse and the
    /// offset. For logs only; no parsing contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direct = self.rotation.matrix();
        let inverse = self.rotation.inverse_matrix();
        writeln!(f, "Rigid3")?;
        writeln!(f, "  matrix:")?;
        for row in 0..3 {
            let r = direct.row(row);
            writeln!(f, "    [{:>12.6} {:>12.6} {:>12.6}]", r.x, r.y, r.z)?;
        }
        writeln!(f, "  inverse:")?;
        for row in 0..3 {
            let r = inverse.row(row);
            writeln!(f, "    [{:>12.6} {:>12.6} {:>12.6}]", r.x, r.y, r.z)?;
        }
        write!(
            f,
            "  offset: [{:>12.6} {:>12.6} {:>12.6}]",
            self.offset.x, self.offset.y, self.offset.z
        )
    }
}
