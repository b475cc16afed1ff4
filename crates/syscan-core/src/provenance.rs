//! Provenance and schema descriptors attached to emitted tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance recorded next to every canonical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngestProvenance {
    /// Schema of the emitted table.
    pub schema_version: SchemaVersion,
    /// Name of the dataset filter that produced the table.
    pub filter: String,
    /// Decomposition strategy used for artificial systematics, if any.
    pub decomposer: Option<String>,
    /// SHA-256 digests of the raw files read, keyed by file name.
    pub raw_inputs: BTreeMap<String, String>,
    /// Stable hash of the resulting table.
    pub table_hash: String,
    /// Version map for all tools involved in the ingestion.
    pub tool_versions: BTreeMap<String, String>,
}
