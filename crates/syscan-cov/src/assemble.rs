use log::{debug, warn};
use syscan_core::errors::{ErrorInfo, SyscanError};

use crate::index_map::IndexMap;
use crate::matrix::{CovarianceMatrix, SymmetricTable};

fn shape_error(code: &str, what: &str, got: usize, expected: usize) -> SyscanError {
    SyscanError::Format(
        ErrorInfo::new(code, format!("{what} has {got} entries, expected {expected}"))
            .with_context("expected", expected.to_string())
            .with_context("got", got.to_string()),
    )
}

/// How table entries are turned into covariance units.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    /// Table already holds covariances; `unit` converts them (e.g. `1e-6` for
    /// per-mille squared).
    Covariance {
        /// Multiplicative unit conversion.
        unit: f64,
    },
    /// Table holds correlations; entry `(i, j)` becomes
    /// `corr * unit * sigma_i * sigma_j`.
    Correlation {
        /// Per-point magnitudes in canonical order.
        sigma: Vec<f64>,
        /// Conversion for tables quoted in percent (`1e-2`) or similar.
        unit: f64,
    },
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Covariance { unit: 1.0 }
    }
}

/// Contribution added on top of the table, independently of it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraTerm {
    /// Fully correlated normalisation: `+= fraction^2 * d_i * d_j`.
    Luminosity {
        /// Fractional luminosity uncertainty (0.022 for 2.2%).
        fraction: f64,
        /// Central values in canonical order.
        central: Vec<f64>,
    },
    /// Uncorrelated contribution: `+= v_i^2` on the diagonal.
    Diagonal(Vec<f64>),
}

/// Builds the full covariance matrix of one dataset.
#[derive(Debug, Clone)]
pub struct CovarianceAssembler {
    table: SymmetricTable,
    index_map: Option<IndexMap>,
    scale: Scale,
    extra: Vec<ExtraTerm>,
}

impl CovarianceAssembler {
    /// Starts from a table interpreted as covariances in native units.
    pub fn new(table: SymmetricTable) -> Self {
        Self {
            table,
            index_map: None,
            scale: Scale::default(),
            extra: Vec::new(),
        }
    }

    /// Declares the canonical to table index map.
    pub fn with_index_map(mut self, map: IndexMap) -> Self {
        self.index_map = Some(map);
        self
    }

    /// Sets how table entries are scaled.
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Adds an extra term.
    pub fn with_extra(mut self, term: ExtraTerm) -> Self {
        self.extra.push(term);
        self
    }

    /// Assembles the `n x n` covariance matrix.
    pub fn assemble(&self, n: usize) -> Result<CovarianceMatrix, SyscanError> {
        let map = match &self.index_map {
            Some(map) => map.clone(),
            None => IndexMap::identity(n),
        };
        self.validate(&map, n)?;
        if !map.is_injective() {
            warn!(
                "index map reuses table rows; {} canonical points share correlation entries",
                n
            );
        }
        debug!(
            "assembling {n}x{n} covariance from a {t}x{t} table with {} extra terms",
            self.extra.len(),
            t = self.table.dim()
        );

        let targets = map.targets();
        let cov = CovarianceMatrix::from_lower_fn(n, |i, j| {
            let raw = self
                .table
                .get(targets[i], targets[j])
                .unwrap_or(f64::NAN);
            let mut value = match &self.scale {
                Scale::Covariance { unit } => raw * unit,
                Scale::Correlation { sigma, unit } => raw * unit * sigma[i] * sigma[j],
            };
            for term in &self.extra {
                match term {
                    ExtraTerm::Luminosity { fraction, central } => {
                        value += fraction * fraction * central[i] * central[j];
                    }
                    ExtraTerm::Diagonal(values) => {
                        if i == j {
                            value += values[i] * values[i];
                        }
                    }
                }
            }
            value
        });

        if let Some((i, j)) = first_non_finite(&cov) {
            return Err(SyscanError::Format(
                ErrorInfo::new("non-finite-covariance", "assembled covariance is not finite")
                    .with_context("i", i.to_string())
                    .with_context("j", j.to_string()),
            ));
        }
        Ok(cov)
    }

    fn validate(&self, map: &IndexMap, n: usize) -> Result<(), SyscanError> {
        if map.len() != n {
            return Err(shape_error("index-map-size", "index map", map.len(), n));
        }
        if let Some(max) = map.max_target() {
            if max >= self.table.dim() {
                return Err(SyscanError::Format(
                    ErrorInfo::new(
                        "index-out-of-table",
                        format!(
                            "index map targets row {max} of a {}x{} table",
                            self.table.dim(),
                            self.table.dim()
                        ),
                    )
                    .with_hint("declare the table dimension covering every sub-sample"),
                ));
            }
        }
        if let Scale::Correlation { sigma, .. } = &self.scale {
            if sigma.len() != n {
                return Err(shape_error("sigma-size", "sigma", sigma.len(), n));
            }
        }
        for term in &self.extra {
            match term {
                ExtraTerm::Luminosity { central, .. } if central.len() != n => {
                    return Err(shape_error(
                        "luminosity-size",
                        "luminosity central values",
                        central.len(),
                        n,
                    ));
                }
                ExtraTerm::Diagonal(values) if values.len() != n => {
                    return Err(shape_error("diagonal-size", "diagonal term", values.len(), n));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn first_non_finite(cov: &CovarianceMatrix) -> Option<(usize, usize)> {
    let n = cov.dim();
    (0..n)
        .flat_map(|i| (0..=i).map(move |j| (i, j)))
        .find(|&(i, j)| !cov[(i, j)].is_finite())
}
