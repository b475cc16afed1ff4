#![deny(missing_docs)]
#![doc = "Core data model, error taxonomy and deterministic helpers shared by the syscan crates."]

pub mod errors;
pub mod hash;
pub mod provenance;
pub mod rng;
mod types;

pub use errors::{ErrorInfo, SyscanError};
pub use hash::{digest_bytes, from_json_slice, stable_hash_string, to_canonical_json_bytes};
pub use provenance::{IngestProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{
    CommonData, CorrelationGroup, DataPoint, Kinematics, SysType, SystematicSource,
    DUALITY_TOLERANCE,
};
