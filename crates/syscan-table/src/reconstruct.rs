use syscan_core::{CommonData, CorrelationGroup};
use syscan_cov::CovarianceMatrix;

/// Experimental covariance implied by a finished table.
///
/// Statistical and `UNCORR` sources contribute to the diagonal only; every
/// other group is fully correlated between the points of the table.
pub fn covariance_from_table(table: &CommonData) -> CovarianceMatrix {
    let points = table.points();
    CovarianceMatrix::from_lower_fn(points.len(), |i, j| {
        let (a, b) = (&points[i], &points[j]);
        let mut value = 0.0;
        for (sa, sb) in a.systematics().iter().zip(b.systematics()) {
            match sa.group() {
                CorrelationGroup::Uncorr => {
                    if i == j {
                        value += sa.add() * sa.add();
                    }
                }
                _ => value += sa.add() * sb.add(),
            }
        }
        if i == j {
            value += a.stat() * a.stat();
        }
        value
    })
}

/// Covariance induced by the listed columns alone, treated as correlated.
///
/// Used to verify that decomposed columns reproduce the matrix they came from.
pub fn covariance_from_columns(table: &CommonData, columns: &[usize]) -> CovarianceMatrix {
    let points = table.points();
    CovarianceMatrix::from_lower_fn(points.len(), |i, j| {
        columns
            .iter()
            .filter_map(|&col| {
                let a = points[i].systematics().get(col)?;
                let b = points[j].systematics().get(col)?;
                Some(a.add() * b.add())
            })
            .sum()
    })
}
