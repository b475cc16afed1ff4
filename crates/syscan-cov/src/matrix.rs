use std::ops::Index;

use log::warn;
use nalgebra::DMatrix;
use syscan_core::errors::{ErrorInfo, SyscanError};

/// Relative asymmetry above which a full published table is reported.
const ASYMMETRY_WARN_THRESHOLD: f64 = 1e-6;

fn format_error(code: &str, message: impl Into<String>) -> SyscanError {
    SyscanError::Format(ErrorInfo::new(code, message.into()))
}

/// Symmetric correlation or partial-covariance table as read from a publication.
///
/// The table dimension `T` may differ from the number of canonical points when
/// a publication serializes several sub-samples together.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricTable {
    values: DMatrix<f64>,
}

impl SymmetricTable {
    /// Builds a table from row-major lower-triangular entries (`j <= i`).
    pub fn from_lower_triangle(dim: usize, entries: &[f64]) -> Result<Self, SyscanError> {
        let expected = dim * (dim + 1) / 2;
        if entries.len() != expected {
            return Err(SyscanError::Format(
                ErrorInfo::new(
                    "lower-triangle-size",
                    format!(
                        "lower triangle of a {dim}x{dim} table needs {expected} entries, got {}",
                        entries.len()
                    ),
                )
                .with_context("dim", dim.to_string()),
            ));
        }
        let mut values = DMatrix::<f64>::zeros(dim, dim);
        let mut cursor = entries.iter().copied();
        for i in 0..dim {
            for j in 0..=i {
                // length was checked above
                let value = cursor.next().unwrap_or(0.0);
                values[(i, j)] = value;
                values[(j, i)] = value;
            }
        }
        Self::checked(values)
    }

    /// Builds a table from per-row lower-triangular slices; row `i` must hold at
    /// least `i + 1` entries and only the first `i + 1` are used.
    pub fn from_lower_rows(rows: &[Vec<f64>]) -> Result<Self, SyscanError> {
        let dim = rows.len();
        let mut entries = Vec::with_capacity(dim * (dim + 1) / 2);
        for (i, row) in rows.iter().enumerate() {
            if row.len() < i + 1 {
                return Err(SyscanError::Format(
                    ErrorInfo::new(
                        "lower-row-short",
                        format!("row {i} holds {} entries, expected {}", row.len(), i + 1),
                    )
                    .with_context("row", i.to_string()),
                ));
            }
            entries.extend_from_slice(&row[..=i]);
        }
        Self::from_lower_triangle(dim, &entries)
    }

    /// Builds a table from a full row-major square listing.
    ///
    /// Published full tables are symmetric up to rounding; the stored table is
    /// the symmetric part `(a_ij + a_ji) / 2`.
    pub fn from_full(dim: usize, entries: &[f64]) -> Result<Self, SyscanError> {
        if entries.len() != dim * dim {
            return Err(format_error(
                "full-table-size",
                format!(
                    "a {dim}x{dim} table needs {} entries, got {}",
                    dim * dim,
                    entries.len()
                ),
            ));
        }
        let raw = DMatrix::from_row_slice(dim, dim, entries);
        let mut values = DMatrix::<f64>::zeros(dim, dim);
        let mut worst = 0.0_f64;
        for i in 0..dim {
            values[(i, i)] = raw[(i, i)];
            for j in 0..i {
                let (a, b) = (raw[(i, j)], raw[(j, i)]);
                let scale = a.abs().max(b.abs());
                if scale > 0.0 {
                    worst = worst.max((a - b).abs() / scale);
                }
                let mean = 0.5 * (a + b);
                values[(i, j)] = mean;
                values[(j, i)] = mean;
            }
        }
        if worst > ASYMMETRY_WARN_THRESHOLD {
            warn!("full table is asymmetric up to {worst:.3e}; keeping its symmetric part");
        }
        Self::checked(values)
    }

    fn checked(values: DMatrix<f64>) -> Result<Self, SyscanError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(format_error(
                "non-finite-table",
                "table contains non-finite entries",
            ));
        }
        Ok(Self { values })
    }

    /// Table dimension `T`.
    pub fn dim(&self) -> usize {
        self.values.nrows()
    }

    /// Entry `(i, j)` if inside the table.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get((i, j)).copied()
    }
}

/// Owned, exactly symmetric N x N covariance matrix for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    inner: DMatrix<f64>,
}

impl CovarianceMatrix {
    /// Builds a matrix by evaluating `entry(i, j)` for `j <= i` and mirroring.
    pub fn from_lower_fn(dim: usize, mut entry: impl FnMut(usize, usize) -> f64) -> Self {
        let mut inner = DMatrix::<f64>::zeros(dim, dim);
        for i in 0..dim {
            for j in 0..=i {
                let value = entry(i, j);
                inner[(i, j)] = value;
                inner[(j, i)] = value;
            }
        }
        Self { inner }
    }

    /// Builds a matrix from explicit rows, which must be square and symmetric.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SyscanError> {
        let dim = rows.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != dim) {
            return Err(SyscanError::Format(
                ErrorInfo::new(
                    "covariance-not-square",
                    format!("row {idx} has {} entries, expected {dim}", row.len()),
                )
                .with_context("row", idx.to_string()),
            ));
        }
        for i in 0..dim {
            for j in 0..i {
                if rows[i][j] != rows[j][i] {
                    return Err(SyscanError::Format(
                        ErrorInfo::new("covariance-not-symmetric", "matrix is not symmetric")
                            .with_context("i", i.to_string())
                            .with_context("j", j.to_string()),
                    ));
                }
            }
        }
        Ok(Self::from_lower_fn(dim, |i, j| rows[i][j]))
    }

    pub(crate) fn from_symmetric(inner: DMatrix<f64>) -> Self {
        let dim = inner.nrows();
        Self::from_lower_fn(dim, |i, j| inner[(i, j)])
    }

    /// Number of points N.
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// Entry `(i, j)` if inside the matrix.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.inner.get((i, j)).copied()
    }

    /// Diagonal variances.
    pub fn diagonal(&self) -> Vec<f64> {
        self.inner.diagonal().iter().copied().collect()
    }

    /// Borrow the underlying matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.inner
    }

    /// Rows as nested vectors, for reports.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.dim())
            .map(|i| self.inner.row(i).iter().copied().collect())
            .collect()
    }

    /// Exact symmetry check.
    pub fn is_symmetric(&self) -> bool {
        let n = self.dim();
        (0..n).all(|i| (0..i).all(|j| self.inner[(i, j)] == self.inner[(j, i)]))
    }
}

impl Index<(usize, usize)> for CovarianceMatrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.inner[index]
    }
}
