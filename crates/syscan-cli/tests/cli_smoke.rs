use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn syscan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_syscan"))
        .args(args)
        .output()
        .expect("run syscan")
}

fn stdout_json(output: &Output) -> Value {
    let body = String::from_utf8(output.stdout.clone()).expect("utf8");
    serde_json::from_str(&body).expect("json")
}

fn write_zee_fixture(root: &Path) {
    let dir = root.join("LHCBZEE2FB");
    fs::create_dir_all(&dir).unwrap();
    let mut data = String::new();
    let mut corr = String::new();
    for i in 0..17 {
        let eta = 2.0 + 0.125 * i as f64;
        writeln!(data, "{eta} {} 5.0 0.1 0.05 0.1 0.06", eta + 0.125).unwrap();
        let row: Vec<&str> = (0..=i).map(|j| if i == j { "1.0" } else { "0.3" }).collect();
        writeln!(corr, "{}", row.join(" ")).unwrap();
    }
    fs::write(dir.join("lhcb_zrap.data"), data).unwrap();
    fs::write(dir.join("lhcb_zrap.corr"), corr).unwrap();
}

#[test]
fn list_reports_every_dataset() {
    let output = syscan(&["list", "--json"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    let entries = value.as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 8);
    assert!(entries
        .iter()
        .any(|e| e.get("name").and_then(Value::as_str) == Some("CMSJETS11")));
}

#[test]
fn demo_reconstructs_the_two_point_covariance() {
    let output = syscan(&["demo", "--seed", "11", "--points", "4"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    let rebuilt = value["two_point_reconstructed"].as_array().unwrap();
    let expected = [[1.04, 1.08], [1.08, 4.16]];
    for (i, row) in rebuilt.iter().enumerate() {
        for (j, entry) in row.as_array().unwrap().iter().enumerate() {
            assert!((entry.as_f64().unwrap() - expected[i][j]).abs() < 1e-9);
        }
    }
    assert_eq!(value["random_nsys"].as_u64(), Some(5));
}

#[test]
fn ingest_then_check_round_trips_the_hash() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_zee_fixture(raw.path());
    let output = syscan(&[
        "ingest",
        "--dataset",
        "LHCBZEE2FB",
        "--raw",
        raw.path().to_str().unwrap(),
        "--out",
        out.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary = stdout_json(&output);
    assert_eq!(summary["nsys"].as_u64(), Some(19));
    let hash = summary["table_hash"].as_str().unwrap().to_string();

    let set_dir = out.path().join("LHCBZEE2FB");
    assert!(set_dir.join("DATA_LHCBZEE2FB.dat").exists());
    assert!(set_dir.join("SYSTYPE_LHCBZEE2FB_DEFAULT.dat").exists());
    let provenance: Value =
        serde_json::from_str(&fs::read_to_string(set_dir.join("provenance.json")).unwrap())
            .unwrap();
    assert_eq!(provenance["table_hash"].as_str(), Some(hash.as_str()));
    assert_eq!(provenance["decomposer"].as_str(), Some("eigen"));
    assert!(provenance["raw_inputs"].get("lhcb_zrap.corr").is_some());

    let table_path = set_dir.join("LHCBZEE2FB.json");
    let check = syscan(&[
        "check",
        "--table",
        table_path.to_str().unwrap(),
        "--hash",
        &hash,
    ]);
    assert!(check.status.success());
    assert_eq!(stdout_json(&check)["hash_matches"].as_bool(), Some(true));

    let mismatch = syscan(&["check", "--table", table_path.to_str().unwrap(), "--hash", "00"]);
    assert!(!mismatch.status.success());

    let provenance_path = set_dir.join("provenance.json");
    let against_provenance = syscan(&[
        "check",
        "--table",
        table_path.to_str().unwrap(),
        "--provenance",
        provenance_path.to_str().unwrap(),
    ]);
    assert!(against_provenance.status.success());
    let report = stdout_json(&against_provenance);
    assert_eq!(report["hash_matches"].as_bool(), Some(true));
    let relative = report["max_relative_uncertainty"].as_f64().unwrap();
    assert!(relative > 0.0 && relative < 1.0);
}

#[test]
fn failed_ingestion_writes_nothing() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = syscan(&[
        "ingest",
        "--dataset",
        "LHCBZEE2FB",
        "--raw",
        raw.path().to_str().unwrap(),
        "--out",
        out.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(!out.path().join("LHCBZEE2FB").exists());

    let unknown = syscan(&["ingest", "--dataset", "NOPE", "--out", out.path().to_str().unwrap()]);
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("unknown-dataset"));
}

#[test]
fn invalid_tolerance_override_is_rejected() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_zee_fixture(raw.path());
    for tolerance in ["--tolerance=NaN", "--tolerance=-1"] {
        let output = syscan(&[
            "ingest",
            "--dataset",
            "LHCBZEE2FB",
            "--raw",
            raw.path().to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
            tolerance,
        ]);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("invalid-tolerance"));
    }
    assert!(!out.path().join("LHCBZEE2FB").exists());
}

#[test]
fn reingestion_replaces_the_whole_output_directory() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_zee_fixture(raw.path());
    let set_dir = out.path().join("LHCBZEE2FB");
    fs::create_dir_all(&set_dir).unwrap();
    fs::write(set_dir.join("stale.dat"), "old run").unwrap();

    let output = syscan(&[
        "ingest",
        "--dataset",
        "LHCBZEE2FB",
        "--raw",
        raw.path().to_str().unwrap(),
        "--out",
        out.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!set_dir.join("stale.dat").exists());
    assert!(set_dir.join("provenance.json").exists());
    let leftovers: Vec<_> = fs::read_dir(out.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("LHCBZEE2FB")]);

    let written = stdout_json(&output)["written"].as_array().unwrap().clone();
    assert_eq!(written.len(), 4);
    for path in written {
        assert!(Path::new(path.as_str().unwrap()).exists());
    }
}
