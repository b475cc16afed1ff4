use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use syscan_core::{from_json_slice, stable_hash_string, IngestProvenance};
use syscan_cov::{correlation_from_covariance, normalised_covariance, sqrt_diagonal};
use syscan_table::{covariance_from_table, from_json};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON table written by `syscan ingest`.
    #[arg(long)]
    pub table: PathBuf,
    /// Expected table hash, e.g. from `provenance.json`.
    #[arg(long)]
    pub hash: Option<String>,
    /// `provenance.json` whose table hash is expected when `--hash` is absent.
    #[arg(long)]
    pub provenance: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    dataset: String,
    ndata: usize,
    nsys: usize,
    table_hash: String,
    hash_matches: Option<bool>,
    max_total_uncertainty: f64,
    max_abs_correlation: f64,
    max_relative_uncertainty: Option<f64>,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let table = from_json(&fs::read_to_string(&args.table)?)?;
    let table_hash = stable_hash_string(&table)?;
    let expected = match (&args.hash, &args.provenance) {
        (Some(hash), _) => Some(hash.clone()),
        (None, Some(path)) => {
            let provenance: IngestProvenance = from_json_slice(&fs::read(path)?)?;
            Some(provenance.table_hash)
        }
        (None, None) => None,
    };
    let hash_matches = expected.map(|expected| expected == table_hash);

    let cov = covariance_from_table(&table);
    let corr = correlation_from_covariance(&cov)?;
    let n = corr.dim();
    let max_abs_correlation = (0..n)
        .flat_map(|i| (0..i).map(move |j| (i, j)))
        .map(|(i, j)| corr[(i, j)].abs())
        .fold(0.0_f64, f64::max);
    let central: Vec<f64> = table.points().iter().map(|p| p.central()).collect();
    // Undefined when a central value is zero.
    let max_relative_uncertainty = normalised_covariance(&cov, &central)
        .ok()
        .map(|norm| sqrt_diagonal(&norm).into_iter().fold(0.0_f64, f64::max));
    let max_total_uncertainty = table
        .points()
        .iter()
        .map(|p| p.total_uncertainty())
        .fold(0.0_f64, f64::max);

    super::print_json(&CheckReport {
        dataset: table.set_name().to_string(),
        ndata: table.ndata(),
        nsys: table.nsys(),
        table_hash: table_hash.clone(),
        hash_matches,
        max_total_uncertainty,
        max_abs_correlation,
        max_relative_uncertainty,
    })?;
    if hash_matches == Some(false) {
        return Err(format!("table hash {table_hash} does not match the expected hash").into());
    }
    Ok(())
}
