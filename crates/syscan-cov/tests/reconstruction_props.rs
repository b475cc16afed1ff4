use proptest::prelude::*;
use syscan_cov::{
    check_reconstruction, reconstruction_residual, ArtificialSystematicsDecomposer,
    CholeskyDecomposer, CovarianceAssembler, CovarianceMatrix, EigenDecomposer, ExtraTerm,
    IndexMap, Scale, SymmetricTable, DEFAULT_RECONSTRUCTION_TOLERANCE,
};

fn gram(n: usize, entries: &[f64], ridge: f64) -> CovarianceMatrix {
    CovarianceMatrix::from_lower_fn(n, |i, j| {
        let mut value: f64 = (0..n).map(|k| entries[i * n + k] * entries[j * n + k]).sum();
        if i == j {
            value += ridge;
        }
        value
    })
}

fn matrix_strategy() -> impl Strategy<Value = (usize, Vec<f64>)> {
    (1usize..7).prop_flat_map(|n| (Just(n), prop::collection::vec(-3.0f64..3.0, n * n)))
}

proptest! {
    #[test]
    fn eigen_reconstructs_random_psd((n, entries) in matrix_strategy()) {
        let cov = gram(n, &entries, 0.0);
        let sys = EigenDecomposer::default().decompose(&cov).unwrap();
        prop_assert_eq!(sys.ndata(), n);
        prop_assert!(sys.nsys() >= n);
        prop_assert!(check_reconstruction(&cov, &sys, DEFAULT_RECONSTRUCTION_TOLERANCE).is_ok());
    }

    #[test]
    fn cholesky_reconstructs_random_pd((n, entries) in matrix_strategy()) {
        let cov = gram(n, &entries, 0.5);
        let sys = CholeskyDecomposer.decompose(&cov).unwrap();
        prop_assert!(check_reconstruction(&cov, &sys, DEFAULT_RECONSTRUCTION_TOLERANCE).is_ok());
    }

    #[test]
    fn assembled_matrices_are_exactly_symmetric(
        (n, entries) in matrix_strategy(),
        sigma in prop::collection::vec(0.1f64..10.0, 6),
        lumi in 0.0f64..0.1,
        stride in 1usize..5,
    ) {
        let lower: Vec<f64> = (0..n)
            .flat_map(|i| (0..=i).map(move |j| (i, j)))
            .map(|(i, j)| entries[i * n + j])
            .collect();
        let table = SymmetricTable::from_lower_triangle(n, &lower).unwrap();
        let cov = CovarianceAssembler::new(table)
            .with_index_map(IndexMap::strided(n, stride, n))
            .with_scale(Scale::Correlation { sigma: sigma[..n].to_vec(), unit: 1e-2 })
            .with_extra(ExtraTerm::Luminosity { fraction: lumi, central: sigma[..n].to_vec() })
            .assemble(n)
            .unwrap();
        prop_assert!(cov.is_symmetric());
    }
}

#[test]
fn decomposition_is_repeatable() {
    let cov = gram(4, &[0.3, -1.2, 2.0, 0.7, 1.1, 0.4, -0.9, 0.2, 0.5, 0.5, 1.5, -0.3, 2.2, 0.1, 0.0, 0.9], 0.0);
    let first = EigenDecomposer::default().decompose(&cov).unwrap();
    let second = EigenDecomposer::default().decompose(&cov).unwrap();
    assert_eq!(first, second);
    assert!(reconstruction_residual(&cov, &first) < 1e-12);
}
