use log::debug;
use syscan_core::errors::{ErrorInfo, SyscanError};
use syscan_core::{CommonData, CorrelationGroup, Kinematics, RngHandle, SysType};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler,
    CovarianceMatrix, ExtraTerm, Scale, SymmetricTable,
};
use syscan_table::{build, Magnitude, PendingSource, RawPoint, SourceLayout};

const TWO_POINT_CENTRAL: [f64; 2] = [10.0, 20.0];
const TWO_POINT_SIGMA: [f64; 2] = [1.0, 2.0];
const TWO_POINT_CORRELATION: f64 = 0.5;
const TWO_POINT_LUMI: f64 = 0.02;

/// Covariance of the two-point scenario: correlation 0.5 between points of
/// uncertainty 1 and 2 around 10 and 20, plus a 2% luminosity.
pub fn two_point_covariance() -> Result<CovarianceMatrix, SyscanError> {
    let table = SymmetricTable::from_lower_triangle(2, &[1.0, TWO_POINT_CORRELATION, 1.0])?;
    CovarianceAssembler::new(table)
        .with_scale(Scale::Correlation {
            sigma: TWO_POINT_SIGMA.to_vec(),
            unit: 1.0,
        })
        .with_extra(ExtraTerm::Luminosity {
            fraction: TWO_POINT_LUMI,
            central: TWO_POINT_CENTRAL.to_vec(),
        })
        .assemble(2)
}

/// Table whose artificial sources reproduce [`two_point_covariance`].
///
/// The statistical uncertainty is part of the covariance, so the points
/// carry none of their own.
pub fn two_point_scenario(
    decomposer: &dyn ArtificialSystematicsDecomposer,
    tolerance: f64,
) -> Result<CommonData, SyscanError> {
    let cov = two_point_covariance()?;
    let sys = decompose_for_dataset("TWOPOINT", decomposer, &cov, tolerance)?;
    let points = TWO_POINT_CENTRAL
        .iter()
        .enumerate()
        .map(|(i, &central)| RawPoint {
            kinematics: Kinematics::new(i as f64, 0.0, 0.0),
            central,
            stat: Magnitude::Absolute(0.0),
        })
        .collect();
    build(
        "TWOPOINT",
        "SYNTHETIC",
        points,
        vec![Vec::new(); 2],
        Some(&sys),
        SourceLayout {
            direct: 0,
            decomposed: sys.nsys(),
        },
    )
}

/// Seeded random dataset of `n` points.
///
/// Central values, uncertainties and a positive-definite correlation matrix
/// are drawn from the `SYNTHETIC` stream of `seed`; slot 0 carries an
/// uncorrelated percentage and the correlated part is decomposed after it.
pub fn random_dataset(
    seed: u64,
    n: usize,
    decomposer: &dyn ArtificialSystematicsDecomposer,
    tolerance: f64,
) -> Result<CommonData, SyscanError> {
    if n == 0 {
        return Err(SyscanError::Config(ErrorInfo::new(
            "empty-dataset",
            "a synthetic dataset needs at least one point",
        )));
    }
    let mut rng = RngHandle::for_dataset(seed, "SYNTHETIC");
    let central = rng.uniform_vec(n, 1.0, 100.0);
    let sigma: Vec<f64> = central
        .iter()
        .map(|c| c * rng.uniform(0.01, 0.1))
        .collect();
    let uncorr = rng.uniform_vec(n, 0.1, 2.0);

    // Half the Gram matrix of random unit rows plus half the identity:
    // unit diagonal, positive definite.
    let factor: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let row = rng.uniform_vec(n, -1.0, 1.0);
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt().max(1e-12);
            row.into_iter().map(|v| v / norm).collect()
        })
        .collect();
    let mut lower = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = factor[i].iter().zip(&factor[j]).map(|(a, b)| a * b).sum();
            lower.push(if i == j { 1.0 } else { 0.5 * dot });
        }
    }
    debug!("synthetic dataset: seed {seed}, {n} points");

    let cov = CovarianceAssembler::new(SymmetricTable::from_lower_triangle(n, &lower)?)
        .with_scale(Scale::Correlation { sigma, unit: 1.0 })
        .assemble(n)?;
    let sys = decompose_for_dataset("SYNTHETIC", decomposer, &cov, tolerance)?;
    let points = central
        .iter()
        .enumerate()
        .map(|(i, &c)| RawPoint {
            kinematics: Kinematics::new(i as f64, 0.0, 0.0),
            central: c,
            stat: Magnitude::Percent(1.0),
        })
        .collect();
    let direct = uncorr
        .into_iter()
        .map(|p| vec![PendingSource::percent(p, SysType::Additive, CorrelationGroup::Uncorr)])
        .collect();
    build(
        "SYNTHETIC",
        "SYNTHETIC",
        points,
        direct,
        Some(&sys),
        SourceLayout {
            direct: 1,
            decomposed: sys.nsys(),
        },
    )
}
