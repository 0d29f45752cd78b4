//! This module defines the custom error types for the library.
//!
//! Every failure that can surface from a factorization or an eigen-extraction call
//! is collected in a single enum, [`CholeskyErrorKind`], wrapped by the public
//! [`CholeskyError`]. Numerical exhaustion of the residual diagonal is *not* an
//! error: it ends the factorization early and is only visible through the rank
//! and the trace of the result.
//!
//! Using the [`thiserror`] crate keeps the `Display` implementations declarative.
//! [`faer::linalg::svd::SvdError`] does not implement [`std::error::Error`], so it
//! is wrapped manually and formatted with `Debug`.
use thiserror::Error;

/// Represents all possible errors that can occur during a pivoted Cholesky
/// factorization or the eigen-extraction built on top of it.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct CholeskyError(#[from] CholeskyErrorKind);

impl CholeskyError {
    /// Returns `true` if the error was caused by invalid inputs. All of these except
    /// a non-finite kernel entry are raised before any iteration.
    pub fn is_validation_error(&self) -> bool {
        !self.is_decomposition_failure()
    }

    /// Returns `true` if the dense SVD of the projected matrix failed to converge.
    pub fn is_decomposition_failure(&self) -> bool {
        matches!(self.0, CholeskyErrorKind::SvdError(_))
    }
}

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum CholeskyErrorKind {
    /// The kernel matrix handed to the factorizer is not square.
    #[error("Kernel matrix must be square, but it has {nrows} rows and {ncols} columns.")]
    NotSquare { nrows: usize, ncols: usize },

    /// The index set is empty, so there is nothing to factorize.
    #[error("Cannot factorize an empty index set.")]
    EmptyInput,

    /// A stopping tolerance that is zero, negative, or not finite.
    #[error("Stopping tolerance must be a positive finite number, got {0}.")]
    InvalidTolerance(f64),

    /// `NumberOfEigenfunctions(0)` was requested.
    #[error("The number of requested eigenfunctions must be at least 1.")]
    ZeroRank,

    /// The uniform weight of the eigen-extraction is zero, negative, or not finite.
    #[error("Scale factor must be a positive finite number, got {0}.")]
    InvalidScale(f64),

    /// A diagonal entry `k(x, x)` is negative, so the kernel cannot be
    /// positive semi-definite.
    #[error("Kernel diagonal must be non-negative, but entry {index} is {value}.")]
    NegativeDiagonal { index: usize, value: f64 },

    /// The kernel returned NaN or an infinity for an off-diagonal entry, which
    /// makes the Schur complement column undefined.
    #[error("Kernel entry ({row}, {col}) is not finite.")]
    NonFiniteEntry { row: usize, col: usize },

    /// Wraps an error originating from [`faer`]'s singular value decomposition.
    #[error("The singular value decomposition of the projected kernel matrix failed: {0:?}")]
    SvdError(faer::linalg::svd::SvdError),
}

// We compare the inner `CholeskyErrorKind`.
impl PartialEq for CholeskyError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_square_error_message() {
        let error = CholeskyError(CholeskyErrorKind::NotSquare { nrows: 3, ncols: 2 });
        assert_eq!(
            error.to_string(),
            "Kernel matrix must be square, but it has 3 rows and 2 columns."
        );
        assert!(error.is_validation_error());
    }

    #[test]
    fn test_invalid_tolerance_error_message() {
        let error = CholeskyError(CholeskyErrorKind::InvalidTolerance(-0.5));
        assert_eq!(
            error.to_string(),
            "Stopping tolerance must be a positive finite number, got -0.5."
        );
    }

    #[test]
    fn test_negative_diagonal_error_message() {
        let error = CholeskyError(CholeskyErrorKind::NegativeDiagonal {
            index: 4,
            value: -2.0,
        });
        assert_eq!(
            error.to_string(),
            "Kernel diagonal must be non-negative, but entry 4 is -2."
        );
    }

    #[test]
    fn test_non_finite_entry_error_message() {
        let error = CholeskyError(CholeskyErrorKind::NonFiniteEntry { row: 7, col: 2 });
        assert_eq!(error.to_string(), "Kernel entry (7, 2) is not finite.");
        assert!(error.is_validation_error());
    }

    #[test]
    fn test_svd_error_message() {
        let svd_error = faer::linalg::svd::SvdError::NoConvergence;
        let error = CholeskyError(CholeskyErrorKind::SvdError(svd_error));
        let expected_message =
            "The singular value decomposition of the projected kernel matrix failed: NoConvergence";
        assert_eq!(error.to_string(), expected_message);
        assert!(error.is_decomposition_failure());
        assert!(!error.is_validation_error());
    }

    #[test]
    fn test_errors_compare_by_kind() {
        let a = CholeskyError::from(CholeskyErrorKind::ZeroRank);
        let b = CholeskyError::from(CholeskyErrorKind::ZeroRank);
        let c = CholeskyError::from(CholeskyErrorKind::EmptyInput);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
