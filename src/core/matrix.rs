//! A dense, row-major matrix holding the results of tensor-product integrals.
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Dense matrix with `rows` × `cols` entries stored row after row.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Matrix<S> {
    rows: usize,
    cols: usize,
    data: Vec<S>,
}

impl<S: Clone> Matrix<S> {
    /// Construct a matrix with all entries set to `value`.
    pub fn from_elem(rows: usize, cols: usize, value: S) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<S> Matrix<S> {
    /// Construct a matrix from its entries given in row-major order. Returns `None` if the
    /// number of entries is not `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<S>) -> Option<Self> {
        if data.len() == rows * cols {
            Some(Self { rows, cols, data })
        } else {
            None
        }
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the entries in row-major order.
    pub fn as_slice(&self) -> &[S] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [S] {
        &mut self.data
    }

    /// Returns the row with index `row`.
    pub fn row(&self, row: usize) -> &[S] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Apply `f` to every entry.
    pub fn map<T, F: FnMut(&S) -> T>(&self, f: F) -> Matrix<T> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Convert into a vector of rows.
    pub fn into_rows(self) -> Vec<Vec<S>> {
        let cols = self.cols;
        let mut rows = Vec::with_capacity(self.rows);
        let mut data = self.data.into_iter();

        for _ in 0..self.rows {
            rows.push(data.by_ref().take(cols).collect());
        }

        rows
    }
}

impl<S> Index<(usize, usize)> for Matrix<S> {
    type Output = S;

    fn index(&self, (row, col): (usize, usize)) -> &S {
        debug_assert!(row < self.rows && col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl<S> IndexMut<(usize, usize)> for Matrix<S> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut S {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.data[row * self.cols + col]
    }
}
