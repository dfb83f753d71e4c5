#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the transform algebra.
pub mod error;

/// Orthonormal rotation matrix with a maintained inverse.
pub mod rotation;

/// Rotation-vector parameterization of SO(3).
pub mod so3;

/// The rigid 3D transform.
pub mod transform;

pub use error::TransformError;
pub use rotation::RotationMatrix;
pub use transform::Rigid3;
