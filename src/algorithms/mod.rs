//! Core algorithm implementations.
//!
//! ** NOTE: We recommend using the high-level functions in [`crate::solvers`] instead.
//! This module is intended for use cases where fine-grained control is required, such
//! as observing every iteration of the factorization or running the eigen-extraction
//! on a factor that was computed separately.
//!
//! - [`pivoted_cholesky`]: the greedy, rank-revealing incomplete Cholesky factorization.
//! - [`nystrom`]: projection of the factor onto a small dense problem and extension
//!   of its singular vectors back to the full index space.
//!
//! The types shared by both live here: the [`StoppingCriterion`], the per-iteration
//! [`CholeskyIterationView`] handed to callbacks, and the [`Termination`] reason
//! recorded in every result.

use crate::error::{CholeskyError, CholeskyErrorKind};

mod factor;
pub mod nystrom;
pub mod pivoted_cholesky;

/// Trace tolerance used when only the rank is prescribed.
///
/// It is small enough never to cut a healthy factorization short, but it still stops
/// the iteration once the residual diagonal has been consumed down to rounding noise.
pub const NUMERICAL_FLOOR: f64 = 1e-15;

/// Decides when the factorization stops adding columns.
///
/// The factorization always stops once every index has been pivoted, so none of
/// the variants can produce more than `n` columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StoppingCriterion {
    /// Stop as soon as the residual trace drops below the given value.
    AbsoluteTolerance(f64),
    /// Stop as soon as the residual trace drops below the given fraction of the
    /// initial trace `Σ k(x, x)`.
    RelativeTolerance(f64),
    /// Stop after the given number of columns, guarded by [`NUMERICAL_FLOOR`].
    NumberOfEigenfunctions(usize),
}

/// Absolute trace tolerance and column limit derived from a [`StoppingCriterion`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StoppingBounds {
    pub(crate) tolerance: f64,
    pub(crate) max_rank: usize,
}

impl StoppingCriterion {
    /// Rejects tolerances that are not strictly positive and finite, and a zero rank.
    pub fn validate(&self) -> Result<(), CholeskyError> {
        match *self {
            StoppingCriterion::AbsoluteTolerance(tol) | StoppingCriterion::RelativeTolerance(tol) => {
                if tol.is_finite() && tol > 0.0 {
                    Ok(())
                } else {
                    Err(CholeskyErrorKind::InvalidTolerance(tol).into())
                }
            }
            StoppingCriterion::NumberOfEigenfunctions(0) => Err(CholeskyErrorKind::ZeroRank.into()),
            StoppingCriterion::NumberOfEigenfunctions(_) => Ok(()),
        }
    }

    pub(crate) fn bounds(&self, n: usize, initial_trace: f64) -> StoppingBounds {
        match *self {
            StoppingCriterion::AbsoluteTolerance(tol) => StoppingBounds {
                tolerance: tol,
                max_rank: n,
            },
            StoppingCriterion::RelativeTolerance(tol) => StoppingBounds {
                tolerance: tol * initial_trace,
                max_rank: n,
            },
            StoppingCriterion::NumberOfEigenfunctions(m) => StoppingBounds {
                tolerance: NUMERICAL_FLOOR,
                max_rank: m.min(n),
            },
        }
    }
}

/// Why a factorization stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The residual trace dropped below the tolerance of the stopping criterion.
    /// This is also the outcome of a complete factorization, whose residual is empty.
    ToleranceReached,
    /// The requested number of columns was produced.
    RankLimit,
    /// The largest remaining diagonal entry was not positive: the matrix is
    /// numerically exhausted at the current rank.
    Exhausted,
    /// An iteration callback asked to stop.
    Interrupted,
}

/// A snapshot of the factorization state after one completed iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CholeskyIterationView {
    /// Number of columns produced so far, including the one just appended.
    pub rank: usize,
    /// Index (in the original ordering) chosen as pivot in this iteration.
    pub pivot: usize,
    /// Residual diagonal value of the pivot before elimination.
    pub pivot_value: f64,
    /// Residual trace after this iteration.
    pub trace: f64,
}

/// A callback invoked after every iteration; returning `false` stops the factorization.
pub type CholeskyCallback<'a> = dyn FnMut(&CholeskyIterationView) -> bool + 'a;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_tolerances() {
        for tol in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(StoppingCriterion::AbsoluteTolerance(tol).validate().is_err());
            assert!(StoppingCriterion::RelativeTolerance(tol).validate().is_err());
        }
        assert!(StoppingCriterion::AbsoluteTolerance(1e-12).validate().is_ok());
        assert!(StoppingCriterion::RelativeTolerance(0.5).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rank() {
        let error = StoppingCriterion::NumberOfEigenfunctions(0)
            .validate()
            .unwrap_err();
        assert_eq!(error, CholeskyError::from(CholeskyErrorKind::ZeroRank));
        assert!(StoppingCriterion::NumberOfEigenfunctions(1).validate().is_ok());
    }

    #[test]
    fn test_bounds_per_variant() {
        assert_eq!(
            StoppingCriterion::AbsoluteTolerance(1e-3).bounds(10, 50.0),
            StoppingBounds {
                tolerance: 1e-3,
                max_rank: 10
            }
        );
        assert_eq!(
            StoppingCriterion::RelativeTolerance(0.1).bounds(10, 50.0),
            StoppingBounds {
                tolerance: 5.0,
                max_rank: 10
            }
        );
        assert_eq!(
            StoppingCriterion::NumberOfEigenfunctions(25).bounds(10, 50.0),
            StoppingBounds {
                tolerance: NUMERICAL_FLOOR,
                max_rank: 10
            }
        );
    }
}
