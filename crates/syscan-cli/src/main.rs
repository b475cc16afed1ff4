use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    check::{self, CheckArgs},
    demo::{self, DemoArgs},
    ingest::{self, IngestArgs},
    list::{self, ListArgs},
};

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "syscan", about = "Canonicalize published systematic uncertainties")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one dataset and write its canonical table.
    Ingest(IngestArgs),
    /// List the registered datasets.
    List(ListArgs),
    /// Validate a previously written JSON table.
    Check(CheckArgs),
    /// Run the built-in synthetic scenarios.
    Demo(DemoArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Ingest(args) => ingest::run(&args),
        Command::List(args) => list::run(&args),
        Command::Check(args) => check::run(&args),
        Command::Demo(args) => demo::run(&args),
    }
}
