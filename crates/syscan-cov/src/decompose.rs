use std::cmp::Ordering;

use log::{debug, warn};
use nalgebra::{Cholesky, DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};
use syscan_core::errors::{ErrorInfo, SyscanError};
use thiserror::Error;

use crate::matrix::CovarianceMatrix;

/// Largest accepted `max |S S^T - C|`, relative to `max |C|`.
pub const DEFAULT_RECONSTRUCTION_TOLERANCE: f64 = 1e-9;

/// Eigenvalues below `-tolerance * lambda_max` mark a non-PSD matrix.
const DEFAULT_EIGEN_TOLERANCE: f64 = 1e-10;

/// Per-point shifts of artificial systematic sources, one row per point.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtificialSystematics {
    shifts: DMatrix<f64>,
}

impl ArtificialSystematics {
    /// Wraps an N x M shift matrix.
    pub fn from_matrix(shifts: DMatrix<f64>) -> Self {
        Self { shifts }
    }

    /// Number of points N.
    pub fn ndata(&self) -> usize {
        self.shifts.nrows()
    }

    /// Number of artificial sources M.
    pub fn nsys(&self) -> usize {
        self.shifts.ncols()
    }

    /// Shift of source `l` on point `i`.
    pub fn get(&self, i: usize, l: usize) -> Option<f64> {
        self.shifts.get((i, l)).copied()
    }

    /// All shifts of point `i`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.shifts.row(i).iter().copied().collect()
    }

    /// Borrow the shift matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.shifts
    }

    /// Outer-product sum `S S^T`.
    pub fn reconstruct(&self) -> DMatrix<f64> {
        &self.shifts * self.shifts.transpose()
    }
}

/// Reason a covariance matrix could not be decomposed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}: {detail}")]
pub struct DecompositionFailure {
    /// Stable machine readable reason.
    pub reason: &'static str,
    /// Human readable detail.
    pub detail: String,
}

impl DecompositionFailure {
    fn new(reason: &'static str, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    /// Converts the failure into the fatal ingestion error of `dataset`.
    pub fn into_error(self, dataset: &str, decomposer: &str) -> SyscanError {
        SyscanError::Decomposition(
            ErrorInfo::new(self.reason, self.detail)
                .with_context("dataset", dataset)
                .with_context("decomposer", decomposer)
                .with_hint("inspect the covariance construction of this dataset"),
        )
    }
}

/// Strategy turning a covariance matrix into artificial systematic shifts.
///
/// Implementations must return `M >= N` columns whose outer-product sum
/// reproduces the input within [`DEFAULT_RECONSTRUCTION_TOLERANCE`], and must
/// be deterministic.
pub trait ArtificialSystematicsDecomposer {
    /// Name recorded in provenance and diagnostics.
    fn name(&self) -> &'static str;

    /// Decomposes `cov`, or reports why it cannot be done.
    fn decompose(&self, cov: &CovarianceMatrix)
        -> Result<ArtificialSystematics, DecompositionFailure>;
}

fn check_input(cov: &CovarianceMatrix) -> Result<(), DecompositionFailure> {
    if cov.dim() == 0 {
        return Err(DecompositionFailure::new(
            "empty-covariance",
            "no points to decompose",
        ));
    }
    if cov.as_matrix().iter().any(|v| !v.is_finite()) {
        return Err(DecompositionFailure::new(
            "non-finite-covariance",
            "covariance contains non-finite entries",
        ));
    }
    Ok(())
}

/// Diagonalisation: column `l` is `sqrt(lambda_l) * v_l`.
///
/// Columns are ordered by decreasing eigenvalue and each eigenvector is signed
/// so that its largest-magnitude component is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposer {
    /// Relative tolerance for negative eigenvalues produced by rounding.
    pub tolerance: f64,
}

impl Default for EigenDecomposer {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_EIGEN_TOLERANCE,
        }
    }
}

impl ArtificialSystematicsDecomposer for EigenDecomposer {
    fn name(&self) -> &'static str {
        "eigen"
    }

    fn decompose(
        &self,
        cov: &CovarianceMatrix,
    ) -> Result<ArtificialSystematics, DecompositionFailure> {
        check_input(cov)?;
        let n = cov.dim();
        let eigen = SymmetricEigen::new(cov.as_matrix().clone());
        let lambda_max = eigen
            .eigenvalues
            .iter()
            .fold(0.0_f64, |acc, value| acc.max(value.abs()));
        let floor = -self.tolerance * lambda_max.max(f64::MIN_POSITIVE);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut shifts = DMatrix::<f64>::zeros(n, n);
        for (col, &k) in order.iter().enumerate() {
            let mut lambda = eigen.eigenvalues[k];
            if lambda < floor {
                return Err(DecompositionFailure::new(
                    "not-positive-semidefinite",
                    format!("eigenvalue {lambda:.6e} is negative (largest {lambda_max:.6e})"),
                ));
            }
            if lambda < 0.0 {
                warn!("clamping rounding-level negative eigenvalue {lambda:.3e} to zero");
                lambda = 0.0;
            }
            let vector = eigen.eigenvectors.column(k);
            let pivot = vector
                .iter()
                .enumerate()
                .fold((0, 0.0_f64), |best, (idx, v)| {
                    if v.abs() > best.1.abs() {
                        (idx, *v)
                    } else {
                        best
                    }
                })
                .1;
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            let root = lambda.sqrt();
            for i in 0..n {
                shifts[(i, col)] = sign * vector[i] * root;
            }
        }
        debug!("eigen decomposition of {n}x{n} covariance, lambda_max={lambda_max:.6e}");
        Ok(ArtificialSystematics::from_matrix(shifts))
    }
}

/// Lower Cholesky factor as the shift matrix; requires a positive-definite input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CholeskyDecomposer;

impl ArtificialSystematicsDecomposer for CholeskyDecomposer {
    fn name(&self) -> &'static str {
        "cholesky"
    }

    fn decompose(
        &self,
        cov: &CovarianceMatrix,
    ) -> Result<ArtificialSystematics, DecompositionFailure> {
        check_input(cov)?;
        let factor = Cholesky::new(cov.as_matrix().clone()).ok_or_else(|| {
            DecompositionFailure::new(
                "not-positive-definite",
                "Cholesky factorisation failed",
            )
        })?;
        Ok(ArtificialSystematics::from_matrix(factor.l()))
    }
}

/// Decomposer selection used by configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecomposerKind {
    /// [`EigenDecomposer`] with its default tolerance.
    #[default]
    Eigen,
    /// [`CholeskyDecomposer`].
    Cholesky,
}

impl DecomposerKind {
    /// Instantiates the selected strategy.
    pub fn build(&self) -> Box<dyn ArtificialSystematicsDecomposer> {
        match self {
            DecomposerKind::Eigen => Box::new(EigenDecomposer::default()),
            DecomposerKind::Cholesky => Box::new(CholeskyDecomposer),
        }
    }
}

/// `max_{i,j} |sum_l s_il s_jl - cov_ij|`.
pub fn reconstruction_residual(cov: &CovarianceMatrix, sys: &ArtificialSystematics) -> f64 {
    if cov.dim() != sys.ndata() {
        return f64::INFINITY;
    }
    let rebuilt = sys.reconstruct();
    rebuilt
        .iter()
        .zip(cov.as_matrix().iter())
        .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()))
}

/// Checks the reconstruction invariant with a tolerance relative to `max |cov|`.
pub fn check_reconstruction(
    cov: &CovarianceMatrix,
    sys: &ArtificialSystematics,
    tolerance: f64,
) -> Result<f64, DecompositionFailure> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(DecompositionFailure::new(
            "invalid-tolerance",
            format!("reconstruction tolerance must be positive, got {tolerance}"),
        ));
    }
    if sys.nsys() < sys.ndata() {
        return Err(DecompositionFailure::new(
            "too-few-sources",
            format!("{} sources for {} points", sys.nsys(), sys.ndata()),
        ));
    }
    let residual = reconstruction_residual(cov, sys);
    let scale = cov
        .as_matrix()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0e-300);
    if residual > tolerance * scale {
        return Err(DecompositionFailure::new(
            "reconstruction-mismatch",
            format!(
                "residual {residual:.3e} exceeds {:.3e}",
                tolerance * scale
            ),
        ));
    }
    Ok(residual)
}

/// Decomposes the covariance of `dataset` and verifies the reconstruction.
pub fn decompose_for_dataset(
    dataset: &str,
    decomposer: &dyn ArtificialSystematicsDecomposer,
    cov: &CovarianceMatrix,
    tolerance: f64,
) -> Result<ArtificialSystematics, SyscanError> {
    let sys = decomposer
        .decompose(cov)
        .map_err(|failure| failure.into_error(dataset, decomposer.name()))?;
    let residual = check_reconstruction(cov, &sys, tolerance)
        .map_err(|failure| failure.into_error(dataset, decomposer.name()))?;
    debug!(
        "{dataset}: {} artificial sources, reconstruction residual {residual:.3e}",
        sys.nsys()
    );
    Ok(sys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> CovarianceMatrix {
        CovarianceMatrix::from_rows(&[vec![1.04, 1.08], vec![1.08, 4.16]]).unwrap()
    }

    #[test]
    fn eigen_reconstructs_toy() {
        let sys = EigenDecomposer::default().decompose(&toy()).unwrap();
        assert_eq!(sys.nsys(), 2);
        assert!(reconstruction_residual(&toy(), &sys) < 1e-12);
    }

    #[test]
    fn cholesky_reconstructs_toy() {
        let sys = CholeskyDecomposer.decompose(&toy()).unwrap();
        assert_eq!(sys.get(0, 1), Some(0.0));
        assert!(reconstruction_residual(&toy(), &sys) < 1e-12);
    }

    #[test]
    fn indefinite_matrix_fails_both_strategies() {
        let cov = CovarianceMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let eigen = EigenDecomposer::default().decompose(&cov).unwrap_err();
        assert_eq!(eigen.reason, "not-positive-semidefinite");
        let chol = CholeskyDecomposer.decompose(&cov).unwrap_err();
        assert_eq!(chol.reason, "not-positive-definite");
    }

    #[test]
    fn singular_psd_matrix_is_accepted_by_eigen() {
        let cov = CovarianceMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let sys = EigenDecomposer::default().decompose(&cov).unwrap();
        assert!(reconstruction_residual(&cov, &sys) < 1e-12);
        assert!(sys.get(0, 0).unwrap() > 0.0);
    }

    #[test]
    fn tolerance_must_be_finite_and_positive() {
        let wrong = ArtificialSystematics::from_matrix(DMatrix::identity(2, 2));
        let err = check_reconstruction(&toy(), &wrong, f64::NAN).unwrap_err();
        assert_eq!(err.reason, "invalid-tolerance");

        let exact = EigenDecomposer::default().decompose(&toy()).unwrap();
        for tolerance in [-1.0, 0.0, f64::INFINITY] {
            let err = check_reconstruction(&toy(), &exact, tolerance).unwrap_err();
            assert_eq!(err.reason, "invalid-tolerance");
        }
        assert!(check_reconstruction(&toy(), &wrong, DEFAULT_RECONSTRUCTION_TOLERANCE).is_err());
    }

    #[test]
    fn failure_names_dataset() {
        let cov = CovarianceMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let err = decompose_for_dataset(
            "CMSWMASY47FB",
            &EigenDecomposer::default(),
            &cov,
            DEFAULT_RECONSTRUCTION_TOLERANCE,
        )
        .unwrap_err();
        assert!(matches!(err, SyscanError::Decomposition(_)));
        assert_eq!(
            err.info().context.get("dataset").map(String::as_str),
            Some("CMSWMASY47FB")
        );
    }

    #[test]
    fn kind_builds_named_strategy() {
        assert_eq!(DecomposerKind::Eigen.build().name(), "eigen");
        assert_eq!(DecomposerKind::Cholesky.build().name(), "cholesky");
        let parsed: DecomposerKind = serde_json::from_str("\"cholesky\"").unwrap();
        assert_eq!(parsed, DecomposerKind::Cholesky);
    }
}
