use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use syscan_core::errors::{ErrorInfo, SyscanError};
use syscan_core::CommonData;

fn io_error(path: &Path, err: impl ToString) -> SyscanError {
    SyscanError::Serde(
        ErrorInfo::new("io-write", err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Serialises a table to pretty JSON.
pub fn to_json(table: &CommonData) -> Result<String, SyscanError> {
    serde_json::to_string_pretty(table)
        .map_err(|err| SyscanError::Serde(ErrorInfo::new("table-serialize", err.to_string())))
}

/// Restores a table from JSON and re-validates its invariants.
pub fn from_json(json: &str) -> Result<CommonData, SyscanError> {
    let table: CommonData = serde_json::from_str(json)
        .map_err(|err| SyscanError::Serde(ErrorInfo::new("table-deserialize", err.to_string())))?;
    let table = CommonData::new(
        table.set_name().to_string(),
        table.process().to_string(),
        table.nsys(),
        table.points().to_vec(),
    )?;
    table.check_duality()?;
    Ok(table)
}

/// Renders the data file: header `SET NSYS NDATA`, then one row per point
/// `i PROC k1 k2 k3 data stat add_1 mult_1 ... add_M mult_M` (1-based `i`).
pub fn format_data_file(table: &CommonData) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}\t{}\t{}",
        table.set_name(),
        table.nsys(),
        table.ndata()
    );
    for (idx, point) in table.points().iter().enumerate() {
        let kin = point.kinematics();
        let _ = write!(
            out,
            "{}\t{}\t{:.12e}\t{:.12e}\t{:.12e}\t{:.12e}\t{:.12e}",
            idx + 1,
            table.process(),
            kin.k1,
            kin.k2,
            kin.k3,
            point.central(),
            point.stat()
        );
        for source in point.systematics() {
            let _ = write!(out, "\t{:.12e}\t{:.12e}", source.add(), source.mult());
        }
        out.push('\n');
    }
    out
}

/// Renders the systematic type file: `NSYS`, then `l TYPE NAME` (1-based `l`).
pub fn format_systype_file(table: &CommonData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", table.nsys());
    for (idx, (kind, group)) in table.columns().iter().enumerate() {
        let _ = writeln!(out, "{}\t{}\t{}", idx + 1, kind.label(), group);
    }
    out
}

/// Paths written by [`write_commondata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonDataFiles {
    /// `DATA_<SET>.dat`.
    pub data: PathBuf,
    /// `SYSTYPE_<SET>_DEFAULT.dat`.
    pub systype: PathBuf,
}

/// Writes both commondata files into `dir`.
///
/// Both files are rendered before anything is written.
pub fn write_commondata(table: &CommonData, dir: &Path) -> Result<CommonDataFiles, SyscanError> {
    let data_text = format_data_file(table);
    let systype_text = format_systype_file(table);
    let files = CommonDataFiles {
        data: dir.join(format!("DATA_{}.dat", table.set_name())),
        systype: dir.join(format!("SYSTYPE_{}_DEFAULT.dat", table.set_name())),
    };
    fs::create_dir_all(dir).map_err(|err| io_error(dir, err))?;
    fs::write(&files.data, data_text).map_err(|err| io_error(&files.data, err))?;
    fs::write(&files.systype, systype_text).map_err(|err| io_error(&files.systype, err))?;
    Ok(files)
}
