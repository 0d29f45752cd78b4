//! This module provides the high-level API: one call to factorize a kernel matrix,
//! one call to approximate its leading eigenpairs.

use crate::{
    algorithms::{
        StoppingCriterion,
        nystrom::{EigenApproximation, extract_eigenvalues, nystrom_basis, validate_scale},
        pivoted_cholesky::{PivotedCholesky, pivoted_cholesky},
    },
    error::CholeskyError,
    kernel::KernelMatrix,
};
use faer::Par;

/// Computes a low-rank factor `L` with `L·Lᵗ ≈ A` by incomplete pivoted Cholesky.
///
/// # Arguments
/// * `kernel`: A symmetric positive semi-definite [`KernelMatrix`] over `n` indices.
/// * `criterion`: When to stop adding columns.
/// * `par`: Parallelism for the per-row column update. Use [`Par::Seq`] for
///   small problems. Any other value runs the update on rayon's global thread
///   pool, whatever thread count [`Par::Rayon`] carries.
///
/// # Returns
/// A `Result` containing the factor, the pivot permutation and the residual trace,
/// or a `CholeskyError` if the inputs fail validation or the kernel produces a
/// non-finite entry.
pub fn factorize<K>(
    kernel: &K,
    criterion: StoppingCriterion,
    par: Par,
) -> Result<PivotedCholesky, CholeskyError>
where
    K: KernelMatrix + Sync + ?Sized,
{
    pivoted_cholesky(kernel, criterion, par, None)
}

/// Approximates the leading eigenvectors and eigenvalues of a kernel matrix without
/// materializing it.
///
/// The kernel is factorized with [`factorize`], the small matrix `Φ = (Lᵗ·scale)·L`
/// is decomposed by SVD, and its singular vectors are extended back to the full
/// index space and normalized.
///
/// # Arguments
/// * `kernel`: A symmetric positive semi-definite [`KernelMatrix`] over `n` indices.
/// * `scale`: A uniform positive weight, such as a quadrature weight.
/// * `criterion`: When to stop adding columns to the factor; the number of
///   eigenpairs returned equals the rank of the factor.
/// * `par`: Parallelism for the column update and the dense products. The thread
///   count of [`Par::Rayon`] applies to the dense products only; the column update
///   uses rayon's global thread pool.
///
/// # Returns
/// A `Result` containing the unit-norm eigenvectors (`n × k`) and the `k`
/// eigenvalues in descending order, or a `CholeskyError`.
pub fn approximate_eigen<K>(
    kernel: &K,
    scale: f64,
    criterion: StoppingCriterion,
    par: Par,
) -> Result<EigenApproximation, CholeskyError>
where
    K: KernelMatrix + Sync + ?Sized,
{
    // Every validation error must surface before the factorization starts.
    validate_scale(scale)?;

    let factorization = pivoted_cholesky(kernel, criterion, par, None)?;
    let basis = nystrom_basis(factorization.l(), scale, par)?;
    let (eigenvectors, eigenvalues) = extract_eigenvalues(basis);

    Ok(EigenApproximation {
        eigenvectors,
        eigenvalues,
    })
}
