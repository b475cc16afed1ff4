use nalgebra::DMatrix;
use syscan_core::errors::{ErrorInfo, SyscanError};

use crate::matrix::CovarianceMatrix;

/// Square roots of the diagonal variances.
pub fn sqrt_diagonal(cov: &CovarianceMatrix) -> Vec<f64> {
    cov.diagonal().into_iter().map(f64::sqrt).collect()
}

/// `corr_ij = cov_ij / (sigma_i sigma_j)`.
pub fn correlation_from_covariance(cov: &CovarianceMatrix) -> Result<CovarianceMatrix, SyscanError> {
    let sigma = sqrt_diagonal(cov);
    if let Some(idx) = sigma.iter().position(|s| s.is_nan() || *s <= 0.0) {
        return Err(SyscanError::Format(
            ErrorInfo::new(
                "non-positive-variance",
                "correlation needs strictly positive variances",
            )
            .at_point(idx),
        ));
    }
    let n = cov.dim();
    let corr = DMatrix::from_fn(n, n, |i, j| cov[(i, j)] / (sigma[i] * sigma[j]));
    Ok(CovarianceMatrix::from_symmetric(corr))
}

/// Covariance normalised to the central values, `cov_ij / (d_i d_j)`.
pub fn normalised_covariance(
    cov: &CovarianceMatrix,
    central: &[f64],
) -> Result<CovarianceMatrix, SyscanError> {
    let n = cov.dim();
    if central.len() != n {
        return Err(SyscanError::Format(ErrorInfo::new(
            "central-size",
            format!("{} central values for a {n}x{n} covariance", central.len()),
        )));
    }
    if let Some(idx) = central.iter().position(|d| *d == 0.0) {
        return Err(SyscanError::Format(
            ErrorInfo::new("zero-central-value", "cannot normalise by a zero central value")
                .at_point(idx),
        ));
    }
    let normalised = DMatrix::from_fn(n, n, |i, j| cov[(i, j)] / (central[i] * central[j]));
    Ok(CovarianceMatrix::from_symmetric(normalised))
}
