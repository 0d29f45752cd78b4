//! Column arena holding the factor while it is being built.
//!
//! Columns are appended one per iteration into a single contiguous buffer, so
//! column `c` occupies `data[c * nrows..(c + 1) * nrows]`. Rows are addressed by
//! their original index; the permutation lives with the factorizer.

use faer::Mat;

#[derive(Debug)]
pub(crate) struct FactorColumns {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
}

impl FactorColumns {
    /// Reserves room for `reserved_cols` columns of length `nrows`. Further columns
    /// grow the buffer on demand.
    pub(crate) fn with_capacity(nrows: usize, reserved_cols: usize) -> Self {
        Self {
            nrows,
            ncols: 0,
            data: Vec::with_capacity(nrows * reserved_cols),
        }
    }

    pub(crate) fn ncols(&self) -> usize {
        self.ncols
    }

    /// Appends a column. Committed columns are never modified again.
    pub(crate) fn push_col(&mut self, col: &[f64]) {
        assert_eq!(
            col.len(),
            self.nrows,
            "Column length ({}) does not match the number of rows ({}).",
            col.len(),
            self.nrows
        );
        self.data.extend_from_slice(col);
        self.ncols += 1;
    }

    /// Computes `Σ_c L[a, c] · L[b, c]` over all committed columns.
    #[inline]
    pub(crate) fn row_dot(&self, a: usize, b: usize) -> f64 {
        (0..self.ncols)
            .map(|c| {
                let offset = c * self.nrows;
                self.data[offset + a] * self.data[offset + b]
            })
            .sum()
    }

    /// Hands the committed columns over as a dense `nrows × ncols` matrix.
    pub(crate) fn into_mat(self) -> Mat<f64> {
        let nrows = self.nrows;
        let data = self.data;
        Mat::from_fn(nrows, self.ncols, |i, j| data[j * nrows + i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_columns() {
        let mut factor = FactorColumns::with_capacity(3, 2);
        assert_eq!(factor.ncols(), 0);

        factor.push_col(&[1.0, 2.0, 3.0]);
        factor.push_col(&[0.0, 4.0, 5.0]);

        assert_eq!(factor.ncols(), 2);
        // 2 * 3 + 4 * 5
        assert_eq!(factor.row_dot(1, 2), 26.0);
        assert_eq!(factor.row_dot(0, 0), 1.0);
    }

    #[test]
    fn test_columns_beyond_reservation_grow_the_buffer() {
        let mut factor = FactorColumns::with_capacity(2, 0);
        for c in 0..5 {
            factor.push_col(&[c as f64, 1.0]);
        }
        assert_eq!(factor.ncols(), 5);
        // 0 + 1 + 4 + 9 + 16
        assert_eq!(factor.row_dot(0, 0), 30.0);
        assert_eq!(factor.into_mat()[(0, 4)], 4.0);
    }

    #[test]
    fn test_row_dot_without_columns_is_zero() {
        let factor = FactorColumns::with_capacity(4, 4);
        assert_eq!(factor.row_dot(0, 3), 0.0);
    }

    #[test]
    fn test_into_mat_is_column_major() {
        let mut factor = FactorColumns::with_capacity(2, 2);
        factor.push_col(&[1.0, 2.0]);
        factor.push_col(&[3.0, 4.0]);
        let mat = factor.into_mat();

        assert_eq!((mat.nrows(), mat.ncols()), (2, 2));
        assert_eq!(mat[(1, 0)], 2.0);
        assert_eq!(mat[(0, 1)], 3.0);
    }

    #[test]
    #[should_panic(expected = "Column length (2) does not match the number of rows (3).")]
    fn test_push_col_with_wrong_length_panics() {
        let mut factor = FactorColumns::with_capacity(3, 1);
        factor.push_col(&[1.0, 2.0]);
    }
}
