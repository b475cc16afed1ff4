#![deny(missing_docs)]
#![doc = "Symmetrization of asymmetric uncertainties and assembly of the canonical per-point systematic table."]

/// Canonical table assembly.
pub mod builder;
/// Emission to JSON and the commondata text layout.
pub mod emit;
/// Covariance reconstruction from finished tables.
pub mod reconstruct;
/// Asymmetric uncertainty symmetrization.
pub mod symmetrize;

pub use builder::{
    build, Magnitude, PendingSource, RawPoint, Shift, SourceLayout, SystematicTableBuilder,
};
pub use emit::{
    format_data_file, format_systype_file, from_json, to_json, write_commondata, CommonDataFiles,
};
pub use reconstruct::{covariance_from_columns, covariance_from_table};
pub use symmetrize::{symmetrize, ShiftAccumulator, Symmetrized};
