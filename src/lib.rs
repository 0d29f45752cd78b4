//! Incomplete pivoted Cholesky factorization of kernel matrices and Nyström
//! approximation of their eigenpairs.
//!
//! This crate computes a low-rank factor `L` (`n × k`, `k ≪ n`) with `L·Lᵗ ≈ A` for a
//! large symmetric positive semi-definite matrix `A`. The matrix is usually a kernel
//! or covariance matrix `A[i, j] = k(x_i, x_j)` over a point set and is never
//! materialized: the algorithm evaluates its diagonal once and one column per
//! iteration.
//!
//! Built on the [`faer`] linear algebra framework, the algorithms operate on the
//! [`kernel::KernelMatrix`] abstraction, which is implemented for dense `faer`
//! matrices, closures over flat indices, and scalar or matrix-valued kernels over
//! point sets.
//!
//! ## Algorithms
//!
//! **Pivoted Cholesky** ([`factorize`]): Greedily selects the index with the largest
//! residual diagonal, appends the corresponding column of the Schur complement to
//! `L`, and downdates the residual diagonal. The sum of the residual diagonal (the
//! trace) bounds the approximation error `trace(A − L·Lᵗ)` and decides, together
//! with the [`StoppingCriterion`], when to stop.
//!
//! **Eigen-extraction** ([`approximate_eigen`]): Forms the small `k × k` matrix
//! `Φ = (Lᵗ·D)·L` for a uniform weight `D`, computes its SVD, and extends the
//! singular vectors to the full index space as `U = L·V`. The squared column norms
//! of `U` are the eigenvalue estimates; the normalized columns are the eigenvectors.
//!
//! ## Example Usage
//!
//! The following example approximates a Gaussian kernel over 50 equispaced points
//! of the unit interval, first as a factor, then through its five leading
//! eigenpairs.
//!
//! ```rust
//! use faer::Par;
//! use pivoted_cholesky::{StoppingCriterion, approximate_eigen, factorize, kernel::PointKernel};
//!
//! let points: Vec<f64> = (0..50).map(|i| i as f64 / 49.0).collect();
//! let kernel = PointKernel::new(&points, |x: &f64, y: &f64| (-(x - y).powi(2) / 0.02).exp());
//!
//! // Stop once the residual trace is below 1e-8 of the initial trace (here, 50).
//! let factorization =
//!     factorize(&kernel, StoppingCriterion::RelativeTolerance(1e-8), Par::Seq).unwrap();
//! assert!(factorization.rank() < points.len());
//! assert!(factorization.trace() < 1e-8 * 50.0);
//!
//! // The weight 1/n turns the kernel matrix into a discretized integral operator.
//! let eigen = approximate_eigen(
//!     &kernel,
//!     1.0 / 50.0,
//!     StoppingCriterion::NumberOfEigenfunctions(5),
//!     Par::Seq,
//! )
//! .unwrap();
//! assert_eq!(eigen.eigenvectors.ncols(), 5);
//! assert!(eigen.eigenvalues.iter().all(|&lambda| lambda > 0.0));
//! ```
//!
//! ## Performance Characteristics
//!
//! A rank-`k` factorization costs `O(nk)` kernel evaluations, `O(nk²)` arithmetic and
//! `O(nk)` memory. Iterations are sequential, but the per-row column update within
//! an iteration runs on rayon when a parallel [`faer::Par`] is given.

pub mod algorithms;
pub mod error;
pub mod kernel;
pub mod solvers;
pub mod utils;

// Re-export the main API for convenient access.
pub use algorithms::{
    StoppingCriterion, Termination, nystrom::EigenApproximation,
    pivoted_cholesky::PivotedCholesky,
};
pub use error::CholeskyError;
pub use solvers::{approximate_eigen, factorize};
