/// An error type for the rigid transform operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The cached rotation has collapsed toward a singular matrix and cannot
    /// be inverted or back-transformed through.
    #[error("rotation matrix is not invertible (determinant {determinant})")]
    NotInvertible {
        /// Determinant of the direct rotation matrix at the failing call.
        determinant: f64,
    },

    /// The parameter vector has the wrong number of components.
    #[error("parameter vector has wrong length: expected {expected}, got {got}")]
    InvalidParametersLength {
        /// Number of parameters the transform expects.
        expected: usize,
        /// Number of parameters the caller supplied.
        got: usize,
    },

    /// A parameter component is NaN or infinite.
    #[error("parameter {index} is not finite")]
    NonFiniteParameter {
        /// Index of the offending component in the parameter vector.
        index: usize,
    },
}
