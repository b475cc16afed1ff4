use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use log::{info, warn};
use serde::Serialize;
use syscan_core::{stable_hash_string, CommonData, IngestProvenance, SchemaVersion};
use syscan_cov::DecomposerKind;
use syscan_filters::{filter_by_name, RawSource};
use syscan_table::{to_json, write_commondata};

use super::write_json;
use crate::config::{IngestConfig, OutputFormat};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Dataset name, see `syscan list`.
    #[arg(long)]
    pub dataset: String,
    /// Optional YAML configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Raw input root overriding the configuration.
    #[arg(long)]
    pub raw: Option<PathBuf>,
    /// Output directory overriding the configuration.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Use the Cholesky decomposer instead of the configured one.
    #[arg(long)]
    pub cholesky: bool,
    /// Reconstruction tolerance overriding the configuration.
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct IngestSummary {
    dataset: String,
    ndata: usize,
    nsys: usize,
    table_hash: String,
    written: Vec<String>,
}

fn resolve_config(args: &IngestArgs) -> Result<IngestConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::default(),
    };
    if let Some(raw) = &args.raw {
        config.raw_root = raw.clone();
    }
    if let Some(out) = &args.out {
        config.output = out.clone();
    }
    if args.cholesky {
        config.decomposer = DecomposerKind::Cholesky;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    config.validate()?;
    Ok(config)
}

fn sibling(dir: &Path, set: &str, tag: &str) -> PathBuf {
    let name = format!(".{set}.{tag}-{}", std::process::id());
    match dir.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Replaces `dir` by the fully written `staging` directory.
fn publish(staging: &Path, dir: &Path, set: &str) -> Result<(), Box<dyn Error>> {
    if !dir.exists() {
        fs::rename(staging, dir)?;
        return Ok(());
    }
    let previous = sibling(dir, set, "previous");
    fs::rename(dir, &previous)?;
    if let Err(err) = fs::rename(staging, dir) {
        fs::rename(&previous, dir)?;
        return Err(err.into());
    }
    if let Err(err) = fs::remove_dir_all(&previous) {
        warn!("{set}: could not remove {}: {err}", previous.display());
    }
    Ok(())
}

fn write_outputs(
    staging: &Path,
    set: &str,
    json: Option<String>,
    table: &CommonData,
    commondata: bool,
    provenance: &IngestProvenance,
) -> Result<Vec<String>, Box<dyn Error>> {
    fs::create_dir_all(staging)?;
    let mut names = Vec::new();
    if let Some(json) = json {
        let name = format!("{set}.json");
        fs::write(staging.join(&name), json)?;
        names.push(name);
    }
    if commondata {
        let files = write_commondata(table, staging)?;
        for path in [files.data, files.systype] {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    write_json(staging.join("provenance.json"), provenance)?;
    names.push("provenance.json".to_string());
    Ok(names)
}

pub fn run(args: &IngestArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args)?;
    let filter = filter_by_name(&args.dataset)?;
    let source = RawSource::new(&config.raw_root);
    let decomposer = config.decomposer.build();

    let table = filter
        .read(&source, decomposer.as_ref(), config.tolerance)
        .map_err(|err| err.in_dataset(filter.name()))?;
    table.check_duality()?;

    let raw_inputs = source.digests();
    let table_hash = stable_hash_string(&table)?;
    let provenance = IngestProvenance {
        schema_version: SchemaVersion::default(),
        filter: filter.name().to_string(),
        decomposer: filter
            .uses_decomposer()
            .then(|| decomposer.name().to_string()),
        raw_inputs,
        table_hash: table_hash.clone(),
        tool_versions: BTreeMap::from([(
            "syscan".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]),
    };
    let json = if config.formats.contains(&OutputFormat::Json) {
        Some(to_json(&table)?)
    } else {
        None
    };

    // Outputs are staged next to `<out>/<SET>` and moved into place together.
    let dir = config.output.join(filter.name());
    let staging = sibling(&dir, filter.name(), "staging");
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    let staged = write_outputs(
        &staging,
        filter.name(),
        json,
        &table,
        config.formats.contains(&OutputFormat::Commondata),
        &provenance,
    )
    .and_then(|names| publish(&staging, &dir, filter.name()).map(|()| names));
    let names = match staged {
        Ok(names) => names,
        Err(err) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }
    };
    let written: Vec<String> = names
        .iter()
        .map(|name| dir.join(name).display().to_string())
        .collect();
    info!("{}: wrote {} files", filter.name(), written.len());

    super::print_json(&IngestSummary {
        dataset: filter.name().to_string(),
        ndata: table.ndata(),
        nsys: table.nsys(),
        table_hash,
        written,
    })
}
