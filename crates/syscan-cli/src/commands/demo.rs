use std::error::Error;

use clap::Args;
use serde::Serialize;
use syscan_core::stable_hash_string;
use syscan_cov::{EigenDecomposer, DEFAULT_RECONSTRUCTION_TOLERANCE};
use syscan_filters::{random_dataset, two_point_covariance, two_point_scenario};
use syscan_table::covariance_from_table;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Seed of the random dataset.
    #[arg(long, default_value_t = 2024)]
    pub seed: u64,
    /// Points of the random dataset.
    #[arg(long, default_value_t = 8)]
    pub points: usize,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    two_point_covariance: Vec<Vec<f64>>,
    two_point_reconstructed: Vec<Vec<f64>>,
    two_point_hash: String,
    random_seed: u64,
    random_points: usize,
    random_nsys: usize,
    random_hash: String,
}

pub fn run(args: &DemoArgs) -> Result<(), Box<dyn Error>> {
    let decomposer = EigenDecomposer::default();
    let expected = two_point_covariance()?;
    let two_point = two_point_scenario(&decomposer, DEFAULT_RECONSTRUCTION_TOLERANCE)?;
    let random = random_dataset(
        args.seed,
        args.points,
        &decomposer,
        DEFAULT_RECONSTRUCTION_TOLERANCE,
    )?;
    super::print_json(&DemoReport {
        two_point_covariance: expected.to_rows(),
        two_point_reconstructed: covariance_from_table(&two_point).to_rows(),
        two_point_hash: stable_hash_string(&two_point)?,
        random_seed: args.seed,
        random_points: random.ndata(),
        random_nsys: random.nsys(),
        random_hash: stable_hash_string(&random)?,
    })
}
