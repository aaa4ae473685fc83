//! Dense row-major integer matrix.
//!
//! Backs kernel, ifmap, and ofmap storage. Indexing follows the same
//! `row * cols + col` flattening the PE grid itself uses (see
//! [`crate::accelerator`]), so there is exactly one indexing convention
//! across the crate.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// A dense, row-major 2D matrix of `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl Matrix {
    /// Build a matrix of the given shape, filled with `0`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0; rows * cols] }
    }

    /// Build a matrix from row-major data. Panics if `data.len() !=
    /// rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<i64>) -> Self {
        assert_eq!(data.len(), rows * cols, "row/col shape does not match data length");
        Self { rows, cols, data }
    }

    /// Build a matrix from nested rows. Panics if rows are ragged.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Self {
        let r = rows.len();
        let c = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(r * c);
        for row in rows {
            assert_eq!(row.len(), c, "ragged rows are not supported");
            data.extend(row);
        }
        Self { rows: r, cols: c, data }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Read a single row as a slice.
    #[inline]
    pub fn row(&self, r: usize) -> &[i64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Write a row in place. Panics on length mismatch.
    pub fn set_row(&mut self, r: usize, values: &[i64]) {
        assert_eq!(values.len(), self.cols);
        self.data[r * self.cols..(r + 1) * self.cols].copy_from_slice(values);
    }

    /// Read an element.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> i64 {
        self.data[r * self.cols + c]
    }

    /// Write an element.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: i64) {
        self.data[r * self.cols + c] = value;
    }

    /// Iterate rows top-to-bottom (insertion order: row 0 first).
    pub fn rows_iter(&self) -> impl Iterator<Item = &[i64]> {
        self.data.chunks(self.cols)
    }
}

/// Deterministic arithmetic-progression matrix generator.
///
/// `out[r][c] = seed + c * col_inc + r * row_inc`. Ported from
/// `examples/original_source/tests/test_helper.py::create_array`, kept as a
/// crate-local test helper — it is not exposed as a public
/// test-generation API.
#[cfg(test)]
pub(crate) fn create_array(seed: i64, col_inc: i64, row_inc: i64, rows: usize, cols: usize) -> Matrix {
    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            data.push(seed + c as i64 * col_inc + r as i64 * row_inc);
        }
    }
    Matrix::from_vec(rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_array_matches_python_helper() {
        let m = create_array(0, 1, 28, 3, 28);
        assert_eq!(m.row(0), &(0..28).collect::<Vec<_>>()[..]);
        assert_eq!(m.row(1), &(28..56).collect::<Vec<_>>()[..]);
        assert_eq!(m.row(2), &(56..84).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn zeros_and_set_roundtrip() {
        let mut m = Matrix::zeros(2, 3);
        m.set(1, 2, 7);
        assert_eq!(m.get(1, 2), 7);
        assert_eq!(m.get(0, 0), 0);
    }

    #[test]
    fn from_rows_matches_from_vec() {
        let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let b = Matrix::from_vec(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(a, b);
    }
}
