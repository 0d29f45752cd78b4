//! Incomplete pivoted Cholesky factorization of a kernel matrix.
//!
//! The algorithm builds a low-rank factor `L` with `L·Lᵗ ≈ A` one column at a time.
//! In every iteration it picks the remaining index with the largest residual
//! diagonal (the largest contribution to the approximation error), eliminates it,
//! and downdates the residual diagonal of every other remaining index. The sum of
//! that residual diagonal, the *trace*, is an upper bound on `trace(A − L·Lᵗ)` and
//! drives the stopping criterion.
//!
//! Only the diagonal of `A` and one column per iteration are ever evaluated, so a
//! rank-`k` factorization of an `n × n` kernel costs `O(nk)` kernel evaluations and
//! `O(nk²)` arithmetic, and `O(nk)` memory for the factor.
//!
//! Iterations are strictly sequential. Within one iteration the column update is
//! independent across rows and fans out over rayon when a parallel [`Par`] is given.
//! Each row's value is computed by the same expression either way, so sequential
//! and parallel runs produce identical factors.

use super::{
    CholeskyCallback, CholeskyIterationView, StoppingBounds, StoppingCriterion, Termination,
    factor::FactorColumns,
};
use crate::{
    error::{CholeskyError, CholeskyErrorKind},
    kernel::KernelMatrix,
};
use faer::{Mat, MatRef, Par};
use rayon::prelude::*;

/// The result of a pivoted Cholesky factorization.
///
/// `L` is stored in the original row order: `L·Lᵗ` approximates `A` directly, and the
/// permuted factor `L[p, ..]` is lower trapezoidal.
#[derive(Clone, Debug)]
pub struct PivotedCholesky {
    l: Mat<f64>,
    perm: Vec<usize>,
    trace: f64,
    initial_trace: f64,
    termination: Termination,
}

impl PivotedCholesky {
    /// The `n × k` factor.
    pub fn l(&self) -> MatRef<'_, f64> {
        self.l.as_ref()
    }

    /// The full pivot permutation of `0..n`.
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    /// The selected pivots in selection order, `p[0..k)`.
    pub fn pivots(&self) -> &[usize] {
        &self.perm[..self.rank()]
    }

    /// The residual trace at termination, an upper bound on `trace(A − L·Lᵗ)`.
    pub fn trace(&self) -> f64 {
        self.trace
    }

    /// The trace of the input matrix, `Σ k(x, x)`.
    pub fn initial_trace(&self) -> f64 {
        self.initial_trace
    }

    /// The number of columns `k` of the factor.
    pub fn rank(&self) -> usize {
        self.l.ncols()
    }

    /// Why the factorization stopped.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Materializes the `n × n` approximation `L·Lᵗ`.
    ///
    /// This is meant for diagnostics on small problems.
    pub fn reconstruct(&self) -> Mat<f64> {
        self.l.as_ref() * self.l.transpose()
    }

    /// Splits the result into the factor, the permutation and the residual trace.
    pub fn into_parts(self) -> (Mat<f64>, Vec<usize>, f64) {
        (self.l, self.perm, self.trace)
    }
}

/// Computes an incomplete pivoted Cholesky factorization of `kernel`.
///
/// Columns are added until the residual trace falls below the tolerance of
/// `criterion`, the requested rank is reached, every index has been pivoted, or the
/// largest remaining residual diagonal is not positive, whichever happens first.
/// The last case is a normal termination at the current rank, reported as
/// [`Termination::Exhausted`].
///
/// Ties between equal residual diagonals are broken in favour of the lowest
/// position in the current permutation, which makes the result deterministic.
///
/// # Arguments
/// * `kernel`: A symmetric positive semi-definite [`KernelMatrix`].
/// * `criterion`: When to stop adding columns.
/// * `par`: Parallelism for the per-row column update. Any value other than
///   [`Par::Seq`] runs the update on rayon's global thread pool; the thread count
///   carried by [`Par::Rayon`] is not used here.
/// * `callback`: An optional callback invoked after every iteration. Returning
///   `false` stops the factorization after the column just produced.
///
/// # Errors
/// Fails before any iteration if the kernel is not square, is empty, has a negative
/// diagonal entry, or if `criterion` is malformed. Fails during the iteration if the
/// kernel produces a non-finite off-diagonal entry.
pub fn pivoted_cholesky<K>(
    kernel: &K,
    criterion: StoppingCriterion,
    par: Par,
    mut callback: Option<&mut CholeskyCallback<'_>>,
) -> Result<PivotedCholesky, CholeskyError>
where
    K: KernelMatrix + Sync + ?Sized,
{
    let n = kernel.nrows();
    if n != kernel.ncols() {
        return Err(CholeskyErrorKind::NotSquare {
            nrows: n,
            ncols: kernel.ncols(),
        }
        .into());
    }
    if n == 0 {
        return Err(CholeskyErrorKind::EmptyInput.into());
    }
    criterion.validate()?;

    // The residual diagonal of the Schur complement, indexed by original position.
    let mut d: Vec<f64> = (0..n).map(|i| kernel.entry(i, i)).collect();
    if let Some((index, &value)) = d
        .iter()
        .enumerate()
        .find(|(_, v)| v.is_nan() || **v < 0.0)
    {
        return Err(CholeskyErrorKind::NegativeDiagonal { index, value }.into());
    }

    let initial_trace: f64 = d.iter().sum();
    let StoppingBounds {
        tolerance,
        max_rank,
    } = criterion.bounds(n, initial_trace);

    let mut perm: Vec<usize> = (0..n).collect();
    let mut factor = FactorColumns::with_capacity(n, reserved_columns(criterion, max_rank));
    let mut column = vec![0.0; n];
    let mut trace = initial_trace;

    let termination = loop {
        if trace < tolerance {
            break Termination::ToleranceReached;
        }
        let k = factor.ncols();
        if k == max_rank {
            break Termination::RankLimit;
        }

        let best = select_pivot(&d, &perm, k);
        perm.swap(k, best);
        let pivot = perm[k];
        let pivot_value = d[pivot];
        if pivot_value <= 0.0 {
            break Termination::Exhausted;
        }
        let pivot_sqrt = pivot_value.sqrt();

        // Rows pivoted in earlier iterations stay zero in this column.
        column.fill(0.0);
        column[pivot] = pivot_sqrt;

        let remaining = &perm[k + 1..];
        let schur_entry =
            |row: usize| (kernel.entry(row, pivot) - factor.row_dot(row, pivot)) / pivot_sqrt;
        let values: Vec<f64> = if matches!(par, Par::Seq) {
            remaining.iter().map(|&row| schur_entry(row)).collect()
        } else {
            remaining.par_iter().map(|&row| schur_entry(row)).collect()
        };
        if let Some((&row, _)) = remaining.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(CholeskyErrorKind::NonFiniteEntry { row, col: pivot }.into());
        }

        // The pivot is fully eliminated; the other residuals lose the new column's
        // contribution. Rounding may push a residual slightly below zero, which
        // carries no signal and is clamped.
        d[pivot] = 0.0;
        for (&row, &value) in remaining.iter().zip(&values) {
            column[row] = value;
            d[row] = (d[row] - value * value).max(0.0);
        }
        trace = remaining.iter().map(|&row| d[row]).sum();

        factor.push_col(&column);

        let view = CholeskyIterationView {
            rank: factor.ncols(),
            pivot,
            pivot_value,
            trace,
        };
        log::trace!(
            "pivoted Cholesky step {}: pivot {} (residual {:e}), trace {:e}",
            view.rank,
            pivot,
            pivot_value,
            trace
        );

        if let Some(ref mut cb) = callback {
            if !cb(&view) {
                break Termination::Interrupted;
            }
        }
    };

    log::debug!(
        "pivoted Cholesky finished at rank {} of {}: {:?}, trace {:e} (initial {:e})",
        factor.ncols(),
        n,
        termination,
        trace,
        initial_trace
    );

    Ok(PivotedCholesky {
        l: factor.into_mat(),
        perm,
        trace,
        initial_trace,
        termination,
    })
}

/// Number of columns to reserve for the factor up front.
///
/// Only a prescribed rank is known in advance; under a tolerance the factor grows
/// on demand, since `max_rank` is then just `n`.
fn reserved_columns(criterion: StoppingCriterion, max_rank: usize) -> usize {
    match criterion {
        StoppingCriterion::NumberOfEigenfunctions(_) => max_rank,
        StoppingCriterion::AbsoluteTolerance(_) | StoppingCriterion::RelativeTolerance(_) => 0,
    }
}

/// Returns the position in `perm[k..]` holding the largest residual diagonal.
/// The first maximum wins on ties.
fn select_pivot(d: &[f64], perm: &[usize], k: usize) -> usize {
    let mut best = k;
    let mut best_value = d[perm[k]];
    for (i, &row) in perm.iter().enumerate().skip(k + 1) {
        if d[row] > best_value {
            best = i;
            best_value = d[row];
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::FnKernel;
    use faer::mat;

    fn factorize(a: &Mat<f64>, criterion: StoppingCriterion) -> PivotedCholesky {
        pivoted_cholesky(a, criterion, Par::Seq, None).unwrap()
    }

    #[test]
    fn test_select_pivot_prefers_first_maximum() {
        let d = [1.0, 3.0, 2.0, 3.0];
        let perm = [0, 1, 2, 3];
        assert_eq!(select_pivot(&d, &perm, 0), 1);
        // Position 0 is already pivoted and is never considered.
        let d = [9.0, 1.0, 1.0, 1.0];
        assert_eq!(select_pivot(&d, &perm, 1), 1);
    }

    #[test]
    fn test_rank_one_matrix() {
        let a = mat![[4.0, 2.0], [2.0, 1.0]];
        let result = factorize(&a, StoppingCriterion::AbsoluteTolerance(1e-12));

        assert_eq!(result.rank(), 1);
        assert_eq!(result.pivots(), &[0]);
        assert_eq!(*result.l().get(0, 0), 2.0);
        assert_eq!(*result.l().get(1, 0), 1.0);
        assert_eq!(result.trace(), 0.0);
        assert_eq!(result.initial_trace(), 5.0);
        assert_eq!(result.termination(), Termination::ToleranceReached);
    }

    #[test]
    fn test_identity_needs_every_pivot() {
        let a = Mat::<f64>::identity(3, 3);
        let result = factorize(&a, StoppingCriterion::AbsoluteTolerance(1e-8));

        assert_eq!(result.rank(), 3);
        assert_eq!(result.perm(), &[0, 1, 2]);
        assert_eq!(result.trace(), 0.0);
        assert_eq!(result.l().to_owned(), a);
    }

    #[test]
    fn test_number_of_eigenfunctions_caps_rank() {
        let a = mat![[3.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 3.0]];
        let result = factorize(&a, StoppingCriterion::NumberOfEigenfunctions(2));
        assert_eq!(result.rank(), 2);
        assert_eq!(result.termination(), Termination::RankLimit);

        let result = factorize(&a, StoppingCriterion::NumberOfEigenfunctions(10));
        assert_eq!(result.rank(), 3);
    }

    #[test]
    fn test_relative_tolerance_above_one_stops_immediately() {
        let a = Mat::<f64>::identity(4, 4);
        let result = factorize(&a, StoppingCriterion::RelativeTolerance(2.0));
        assert_eq!(result.rank(), 0);
        assert_eq!(result.trace(), 4.0);
        assert_eq!(result.pivots(), &[] as &[usize]);
    }

    #[test]
    fn test_zero_matrix_is_exhausted_immediately() {
        let a = Mat::<f64>::zeros(3, 3);
        let result = factorize(&a, StoppingCriterion::RelativeTolerance(1e-6));
        assert_eq!(result.rank(), 0);
        assert_eq!(result.termination(), Termination::Exhausted);
    }

    #[test]
    fn test_exhausted_matrix_stops_without_failing() {
        // Rank one, with the tolerance floor unable to stop the iteration first:
        // after the first pivot every residual is exactly zero.
        let a = mat![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]];
        let result = factorize(&a, StoppingCriterion::NumberOfEigenfunctions(3));
        assert_eq!(result.rank(), 1);
        assert_eq!(result.trace(), 0.0);
        assert!(matches!(
            result.termination(),
            Termination::ToleranceReached | Termination::Exhausted
        ));
    }

    #[test]
    fn test_callback_can_interrupt() {
        let a = Mat::<f64>::identity(5, 5);
        let mut traces = Vec::new();
        let mut callback = |view: &CholeskyIterationView| {
            traces.push(view.trace);
            view.rank < 2
        };
        let result = pivoted_cholesky(
            &a,
            StoppingCriterion::AbsoluteTolerance(1e-12),
            Par::Seq,
            Some(&mut callback),
        )
        .unwrap();

        assert_eq!(result.rank(), 2);
        assert_eq!(result.termination(), Termination::Interrupted);
        assert_eq!(traces, vec![4.0, 3.0]);
    }

    #[test]
    fn test_validation_errors() {
        let non_square = Mat::<f64>::zeros(2, 3);
        let error = pivoted_cholesky(
            &non_square,
            StoppingCriterion::AbsoluteTolerance(1e-6),
            Par::Seq,
            None,
        )
        .unwrap_err();
        assert_eq!(
            error,
            CholeskyError::from(CholeskyErrorKind::NotSquare { nrows: 2, ncols: 3 })
        );

        let empty = FnKernel::new(0, |_, _| 0.0);
        let error = pivoted_cholesky(
            &empty,
            StoppingCriterion::AbsoluteTolerance(1e-6),
            Par::Seq,
            None,
        )
        .unwrap_err();
        assert_eq!(error, CholeskyError::from(CholeskyErrorKind::EmptyInput));

        let a = Mat::<f64>::identity(2, 2);
        let error = pivoted_cholesky(
            &a,
            StoppingCriterion::AbsoluteTolerance(0.0),
            Par::Seq,
            None,
        )
        .unwrap_err();
        assert!(error.is_validation_error());

        let negative = mat![[1.0, 0.0], [0.0, -1.0]];
        let error = pivoted_cholesky(
            &negative,
            StoppingCriterion::AbsoluteTolerance(1e-6),
            Par::Seq,
            None,
        )
        .unwrap_err();
        assert_eq!(
            error,
            CholeskyError::from(CholeskyErrorKind::NegativeDiagonal {
                index: 1,
                value: -1.0
            })
        );
    }

    #[test]
    fn test_non_finite_column_entry_is_an_error() {
        let kernel = FnKernel::new(3, |i, j| if i == j { 1.0 } else { f64::NAN });
        let error = pivoted_cholesky(
            &kernel,
            StoppingCriterion::AbsoluteTolerance(1e-6),
            Par::Seq,
            None,
        )
        .unwrap_err();
        assert_eq!(
            error,
            CholeskyError::from(CholeskyErrorKind::NonFiniteEntry { row: 1, col: 0 })
        );
    }

    #[test]
    fn test_tolerance_criteria_do_not_reserve_worst_case_rank() {
        assert_eq!(
            reserved_columns(StoppingCriterion::AbsoluteTolerance(1e-6), 1000),
            0
        );
        assert_eq!(
            reserved_columns(StoppingCriterion::RelativeTolerance(1e-6), 1000),
            0
        );
        assert_eq!(
            reserved_columns(StoppingCriterion::NumberOfEigenfunctions(8), 8),
            8
        );
    }

    #[test]
    fn test_parallel_update_matches_sequential() {
        let kernel = FnKernel::new(40, |i, j| {
            let (x, y) = (i as f64 * 0.3, j as f64 * 0.3);
            (-(x - y).powi(2) / 2.0).exp()
        });
        let criterion = StoppingCriterion::RelativeTolerance(1e-10);
        let seq = pivoted_cholesky(&kernel, criterion, Par::Seq, None).unwrap();
        let par = pivoted_cholesky(&kernel, criterion, Par::rayon(2), None).unwrap();

        assert_eq!(seq.perm(), par.perm());
        assert_eq!(seq.trace(), par.trace());
        assert_eq!(seq.l().to_owned(), par.l().to_owned());
    }
}
