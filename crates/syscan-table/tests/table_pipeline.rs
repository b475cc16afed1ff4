use syscan_core::{stable_hash_string, CorrelationGroup, Kinematics, SysType};
use syscan_cov::{
    decompose_for_dataset, CovarianceAssembler, EigenDecomposer, ExtraTerm, Scale, SymmetricTable,
    DEFAULT_RECONSTRUCTION_TOLERANCE,
};
use syscan_table::{
    build, covariance_from_columns, format_data_file, format_systype_file, from_json, to_json,
    write_commondata, Magnitude, PendingSource, RawPoint, SourceLayout,
};

fn two_point_table() -> syscan_core::CommonData {
    let correlations = SymmetricTable::from_lower_triangle(2, &[1.0, 0.5, 1.0]).unwrap();
    let cov = CovarianceAssembler::new(correlations)
        .with_scale(Scale::Correlation {
            sigma: vec![1.0, 2.0],
            unit: 1.0,
        })
        .with_extra(ExtraTerm::Luminosity {
            fraction: 0.02,
            central: vec![10.0, 20.0],
        })
        .assemble(2)
        .unwrap();
    let sys = decompose_for_dataset(
        "TWOPOINT",
        &EigenDecomposer::default(),
        &cov,
        DEFAULT_RECONSTRUCTION_TOLERANCE,
    )
    .unwrap();
    let points = [10.0, 20.0]
        .iter()
        .enumerate()
        .map(|(i, &central)| RawPoint {
            kinematics: Kinematics::new(i as f64, 91.1876f64.powi(2), 7000.0),
            central,
            stat: Magnitude::Absolute(0.1),
        })
        .collect();
    let direct = vec![
        vec![PendingSource::absolute(
            0.05,
            SysType::Additive,
            CorrelationGroup::Uncorr,
        )],
        vec![PendingSource::absolute(
            0.05,
            SysType::Additive,
            CorrelationGroup::Uncorr,
        )],
    ];
    build(
        "TWOPOINT",
        "EWK_RAP",
        points,
        direct,
        Some(&sys),
        SourceLayout {
            direct: 1,
            decomposed: 2,
        },
    )
    .unwrap()
}

#[test]
fn decomposed_columns_reproduce_the_assembled_covariance() {
    let table = two_point_table();
    assert_eq!(table.nsys(), 3);
    let cov = covariance_from_columns(&table, &[1, 2]);
    let expected = [[1.04, 1.08], [1.08, 4.16]];
    for i in 0..2 {
        for j in 0..2 {
            assert!(
                (cov[(i, j)] - expected[i][j]).abs() < 1e-9,
                "entry ({i}, {j}) = {}",
                cov[(i, j)]
            );
        }
    }
    table.check_duality().unwrap();
}

#[test]
fn repeated_ingestion_is_byte_identical() {
    let first = stable_hash_string(&two_point_table()).unwrap();
    let second = stable_hash_string(&two_point_table()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn json_survives_a_reload() {
    let table = two_point_table();
    let json = to_json(&table).unwrap();
    let restored = from_json(&json).unwrap();
    assert_eq!(restored.ndata(), table.ndata());
    assert_eq!(restored.columns(), table.columns());
    for (a, b) in restored.points().iter().zip(table.points()) {
        assert!((a.central() - b.central()).abs() < 1e-12);
        assert!((a.total_uncertainty() - b.total_uncertainty()).abs() < 1e-12);
    }
    assert!(from_json("{\"set_name\": 3}").is_err());
}

#[test]
fn commondata_layout_is_tab_separated() {
    let table = two_point_table();
    let data = format_data_file(&table);
    let mut lines = data.lines();
    assert_eq!(lines.next(), Some("TWOPOINT\t3\t2"));
    let first: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(first.len(), 7 + 2 * 3);
    assert_eq!(first[0], "1");
    assert_eq!(first[1], "EWK_RAP");
    assert_eq!(first[5].parse::<f64>().unwrap(), 10.0);

    let systype = format_systype_file(&table);
    let rows: Vec<&str> = systype.lines().collect();
    assert_eq!(rows[0], "3");
    assert_eq!(rows[1], "1\tADD\tUNCORR");
    assert_eq!(rows[2], "2\tADD\tCORR");
}

#[test]
fn files_land_under_the_set_name() {
    let dir = tempfile::tempdir().unwrap();
    let table = two_point_table();
    let files = write_commondata(&table, dir.path()).unwrap();
    assert!(files.data.ends_with("DATA_TWOPOINT.dat"));
    assert!(files.systype.ends_with("SYSTYPE_TWOPOINT_DEFAULT.dat"));
    let written = std::fs::read_to_string(&files.data).unwrap();
    assert_eq!(written, format_data_file(&table));
}
