use std::error::Error;

use clap::Args;
use serde::Serialize;
use syscan_filters::all_filters;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DatasetEntry {
    name: &'static str,
    process: &'static str,
    ndata: usize,
    nsys: usize,
    raw_files: Vec<&'static str>,
    decomposed: bool,
}

pub fn run(args: &ListArgs) -> Result<(), Box<dyn Error>> {
    let entries: Vec<DatasetEntry> = all_filters()
        .iter()
        .map(|filter| DatasetEntry {
            name: filter.name(),
            process: filter.process(),
            ndata: filter.ndata(),
            nsys: filter.nsys(),
            raw_files: filter.raw_files().to_vec(),
            decomposed: filter.uses_decomposer(),
        })
        .collect();
    if args.json {
        return super::print_json(&entries);
    }
    for entry in &entries {
        println!(
            "{:<14} {:<8} ndata={:<4} nsys={:<4} {}",
            entry.name,
            entry.process,
            entry.ndata,
            entry.nsys,
            entry.raw_files.join(",")
        );
    }
    Ok(())
}
