//! Nyström-style eigen-extraction from a low-rank factor.
//!
//! Given a factor `L` (`n × k`) with `L·Lᵗ ≈ A`, the non-zero eigenpairs of `L·Lᵗ`
//! can be recovered from the small `k × k` matrix `Φ = D·Lᵗ·L`, where `D` is a
//! uniform weight such as a quadrature or volume weight. If `Φ = V·Σ·Vᵗ`, then the
//! columns of `U = L·V` are mutually orthogonal and `‖U[:, i]‖² = σ_i / D` is the
//! corresponding eigenvalue of `L·Lᵗ`. The large matrix is never formed.
//!
//! The extraction runs in two steps: [`nystrom_basis`] produces the unnormalized
//! directions `U`, and [`extract_eigenvalues`] turns their squared norms into
//! eigenvalue estimates and normalizes them to unit length.

use crate::error::{CholeskyError, CholeskyErrorKind};
use faer::{Accum, Mat, MatRef, Par, linalg::matmul::matmul};

/// Approximate eigenvectors and eigenvalues of a kernel matrix.
#[derive(Clone, Debug)]
pub struct EigenApproximation {
    /// `n × k` matrix of unit-norm eigenvectors, one per column.
    pub eigenvectors: Mat<f64>,
    /// The `k` non-negative eigenvalue estimates, in the order of the SVD of `Φ`
    /// (descending).
    pub eigenvalues: Vec<f64>,
}

pub(crate) fn validate_scale(scale: f64) -> Result<(), CholeskyError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(CholeskyErrorKind::InvalidScale(scale).into())
    }
}

/// Computes the unnormalized eigen-directions `U = L·V`, where `V` holds the left
/// singular vectors of `Φ = (Lᵗ·scale)·L`.
///
/// A factor without columns yields an `n × 0` result.
///
/// # Errors
/// Fails if `scale` is not a positive finite number, or if the SVD of `Φ` does not
/// converge. There is no partial result in the latter case.
pub fn nystrom_basis(l: MatRef<'_, f64>, scale: f64, par: Par) -> Result<Mat<f64>, CholeskyError> {
    validate_scale(scale)?;

    let (n, k) = (l.nrows(), l.ncols());
    if k == 0 {
        return Ok(Mat::zeros(n, 0));
    }

    let mut phi = Mat::<f64>::zeros(k, k);
    matmul(phi.as_mut(), Accum::Replace, l.transpose(), l, scale, par);

    // Only the left singular vectors are needed; the singular values are recovered
    // from the column norms of `U`.
    let svd = phi
        .svd()
        .map_err(|e| CholeskyError::from(CholeskyErrorKind::SvdError(e)))?;

    let mut u = Mat::<f64>::zeros(n, k);
    matmul(u.as_mut(), Accum::Replace, l, svd.U(), 1.0, par);
    Ok(u)
}

/// Splits unnormalized directions into unit eigenvectors and eigenvalue estimates.
///
/// For each column, the eigenvalue is `‖U[:, i]‖²` and the column is divided by
/// `‖U[:, i]‖`. A column with zero norm carries no direction; it is left as is and
/// reported with a zero eigenvalue.
pub fn extract_eigenvalues(mut u: Mat<f64>) -> (Mat<f64>, Vec<f64>) {
    let mut eigenvalues = Vec::with_capacity(u.ncols());
    for j in 0..u.ncols() {
        let norm = u.col(j).norm_l2();
        eigenvalues.push(norm * norm);
        if norm > 0.0 {
            for i in 0..u.nrows() {
                u[(i, j)] /= norm;
            }
        }
    }
    (u, eigenvalues)
}
