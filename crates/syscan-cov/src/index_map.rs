use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Declared map from canonical point index to table row/column.
///
/// Publications that interleave several sub-samples in one correlation table
/// (W+, W-, Z, ...) list rows in an order that differs from the canonical
/// per-point order. The map is applied to both axes of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMap {
    targets: Vec<usize>,
}

impl IndexMap {
    /// Canonical index `i` maps to table index `i`.
    pub fn identity(len: usize) -> Self {
        Self {
            targets: (0..len).collect(),
        }
    }

    /// `π(i) = (stride * i) mod modulus` for `i` in `0..len`.
    pub fn strided(len: usize, stride: usize, modulus: usize) -> Self {
        let modulus = modulus.max(1);
        Self {
            targets: (0..len).map(|i| (stride * i) % modulus).collect(),
        }
    }

    /// Explicit target list.
    pub fn from_vec(targets: Vec<usize>) -> Self {
        Self { targets }
    }

    /// Appends explicit targets after the current ones.
    pub fn chain(mut self, tail: &[usize]) -> Self {
        self.targets.extend_from_slice(tail);
        self
    }

    /// Number of canonical points covered.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Table index of canonical point `i`.
    pub fn target(&self, i: usize) -> Option<usize> {
        self.targets.get(i).copied()
    }

    /// All targets in canonical order.
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Largest table index referenced.
    pub fn max_target(&self) -> Option<usize> {
        self.targets.iter().copied().max()
    }

    /// Whether distinct canonical points always land on distinct table rows.
    pub fn is_injective(&self) -> bool {
        let unique: BTreeSet<_> = self.targets.iter().collect();
        unique.len() == self.targets.len()
    }
}
