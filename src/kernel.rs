//! This module defines the core abstraction for kernel matrices.
//!
//! The pivoted Cholesky factorization never needs a materialized matrix. In each
//! iteration it reads one diagonal entry per remaining row and a single column of
//! the matrix, so the algorithm can be written against anything that can produce
//! the entry `A[i, j]` on demand. This is what a covariance or kernel operator over
//! a point set naturally provides: `A[i, j] = k(x_i, x_j)`.
//!
//! The central piece of this module is the [`KernelMatrix`] trait, which formalizes
//! this contract over flat integer indices `0..n`. The concrete adapters translate
//! richer call shapes into that flat index space before the core loop ever runs:
//!
//! - [`MatRef`], [`MatMut`] and [`Mat`]: a dense matrix, entries are looked up directly.
//! - [`FnKernel`]: any closure `Fn(usize, usize) -> f64` over `n` indices.
//! - [`PointKernel`]: a scalar kernel `k(&P, &P) -> f64` evaluated over a point set.
//! - [`MatrixValuedKernel`]: a kernel whose value is a `d × d` block, expanded into
//!   `n · d` scalar indices `(point, component)`.
//!
//! Every implementation must be symmetric (`entry(i, j) == entry(j, i)`) and
//! positive semi-definite over its whole index range. The adapters preserve
//! both properties of the kernel they wrap.

use faer::{Mat, MatMut, MatRef, prelude::Reborrow};

/// Represents a symmetric positive semi-definite matrix whose entries are
/// evaluated on demand.
///
/// # Example
///
/// ```
/// use pivoted_cholesky::kernel::{FnKernel, KernelMatrix};
///
/// // The Brownian motion covariance min(s, t) on the grid 1, 2, ..., 5.
/// let kernel = FnKernel::new(5, |i, j| (i.min(j) + 1) as f64);
///
/// assert_eq!(kernel.nrows(), 5);
/// assert_eq!(kernel.entry(1, 3), 2.0);
/// assert_eq!(kernel.entry(3, 1), kernel.entry(1, 3));
/// ```
pub trait KernelMatrix {
    /// Returns the number of rows of the matrix.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the matrix.
    fn ncols(&self) -> usize;

    /// Evaluates the entry `A[i, j]`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `i` or `j` is out of range.
    fn entry(&self, i: usize, j: usize) -> f64;
}

impl<'a> KernelMatrix for MatRef<'a, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols()
    }

    #[inline]
    fn entry(&self, i: usize, j: usize) -> f64 {
        *self.get(i, j)
    }
}

/// Delegates to the `MatRef` implementation via a reborrow.
impl<'a> KernelMatrix for MatMut<'a, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.rb().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.rb().ncols()
    }

    #[inline]
    fn entry(&self, i: usize, j: usize) -> f64 {
        self.rb().entry(i, j)
    }
}

impl KernelMatrix for Mat<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn entry(&self, i: usize, j: usize) -> f64 {
        self.as_ref().entry(i, j)
    }
}

/// A kernel matrix backed by a closure over flat indices.
#[derive(Clone, Copy, Debug)]
pub struct FnKernel<F> {
    n: usize,
    f: F,
}

impl<F: Fn(usize, usize) -> f64> FnKernel<F> {
    /// Wraps `f` as an `n × n` kernel matrix.
    pub fn new(n: usize, f: F) -> Self {
        Self { n, f }
    }
}

impl<F: Fn(usize, usize) -> f64> KernelMatrix for FnKernel<F> {
    #[inline]
    fn nrows(&self) -> usize {
        self.n
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.n
    }

    #[inline]
    fn entry(&self, i: usize, j: usize) -> f64 {
        (self.f)(i, j)
    }
}

/// A scalar-valued kernel evaluated pairwise over a borrowed point set.
///
/// Index `i` refers to `points[i]`.
#[derive(Debug)]
pub struct PointKernel<'a, P, K> {
    points: &'a [P],
    kernel: K,
}

impl<'a, P, K: Fn(&P, &P) -> f64> PointKernel<'a, P, K> {
    /// Evaluates `kernel` over all pairs of `points`.
    pub fn new(points: &'a [P], kernel: K) -> Self {
        Self { points, kernel }
    }

    /// The underlying point set.
    pub fn points(&self) -> &'a [P] {
        self.points
    }
}

impl<P, K: Fn(&P, &P) -> f64> KernelMatrix for PointKernel<'_, P, K> {
    #[inline]
    fn nrows(&self) -> usize {
        self.points.len()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.points.len()
    }

    #[inline]
    fn entry(&self, i: usize, j: usize) -> f64 {
        (self.kernel)(&self.points[i], &self.points[j])
    }
}

/// A matrix-valued kernel over a point set, scalarized into `(point, component)` pairs.
///
/// The kernel returns a `d × d` block for each pair of points, where `d` is the
/// output dimension. Flat index `i` maps to point `i / d` and component `i % d`,
/// so the components of one point are contiguous. Entry `(i, j)` is entry
/// `(i % d, j % d)` of the block `k(x[i / d], x[j / d])`.
///
/// Each call to [`KernelMatrix::entry`] evaluates a full block, so kernels with an
/// expensive block should be cheap to call repeatedly or cache internally.
#[derive(Debug)]
pub struct MatrixValuedKernel<'a, P, K> {
    points: &'a [P],
    output_dim: usize,
    kernel: K,
}

impl<'a, P, K: Fn(&P, &P) -> Mat<f64>> MatrixValuedKernel<'a, P, K> {
    /// # Panics
    ///
    /// Panics if `output_dim` is zero.
    pub fn new(points: &'a [P], output_dim: usize, kernel: K) -> Self {
        assert!(output_dim > 0, "Output dimension must be at least 1.");
        Self {
            points,
            output_dim,
            kernel,
        }
    }

    /// The number of components `d` per point.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Splits a flat index into its `(point, component)` pair.
    #[inline]
    pub fn split_index(&self, i: usize) -> (usize, usize) {
        (i / self.output_dim, i % self.output_dim)
    }
}

impl<P, K: Fn(&P, &P) -> Mat<f64>> KernelMatrix for MatrixValuedKernel<'_, P, K> {
    #[inline]
    fn nrows(&self) -> usize {
        self.points.len() * self.output_dim
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.nrows()
    }

    fn entry(&self, i: usize, j: usize) -> f64 {
        let (pi, ci) = self.split_index(i);
        let (pj, cj) = self.split_index(j);
        let block = (self.kernel)(&self.points[pi], &self.points[pj]);
        debug_assert_eq!(
            (block.nrows(), block.ncols()),
            (self.output_dim, self.output_dim),
            "Kernel block has the wrong shape."
        );
        block[(ci, cj)]
    }
}
