use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use syscan_core::errors::{ErrorInfo, SyscanError};
use syscan_cov::{DecomposerKind, DEFAULT_RECONSTRUCTION_TOLERANCE};

/// Output written for an ingested dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `<SET>.json` holding the serialized table.
    Json,
    /// `DATA_<SET>.dat` and `SYSTYPE_<SET>_DEFAULT.dat`.
    Commondata,
}

/// YAML-configurable ingestion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Strategy used for artificial systematics.
    #[serde(default)]
    pub decomposer: DecomposerKind,
    /// Maximum reconstruction residual, relative to the largest covariance
    /// entry.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Formats written on success.
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
    /// Directory holding `<SET>/<file>` raw inputs.
    #[serde(default = "default_raw_root")]
    pub raw_root: PathBuf,
    /// Directory receiving `<SET>/` outputs.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_tolerance() -> f64 {
    DEFAULT_RECONSTRUCTION_TOLERANCE
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Json, OutputFormat::Commondata]
}

fn default_raw_root() -> PathBuf {
    PathBuf::from("rawdata")
}

fn default_output() -> PathBuf {
    PathBuf::from("results")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            decomposer: DecomposerKind::default(),
            tolerance: default_tolerance(),
            formats: default_formats(),
            raw_root: default_raw_root(),
            output: default_output(),
        }
    }
}

impl IngestConfig {
    /// Reads a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, SyscanError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SyscanError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml(&contents).map_err(|err| match err {
            SyscanError::Config(info) => {
                SyscanError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Parses and validates YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, SyscanError> {
        let config: IngestConfig = serde_yaml::from_str(contents)
            .map_err(|err| SyscanError::Config(ErrorInfo::new("config-parse", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would disable or break the ingestion checks.
    pub(crate) fn validate(&self) -> Result<(), SyscanError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SyscanError::Config(
                ErrorInfo::new(
                    "invalid-tolerance",
                    format!("tolerance must be positive, got {}", self.tolerance),
                )
                .with_hint("use a relative tolerance such as 1e-9"),
            ));
        }
        if self.formats.is_empty() {
            return Err(SyscanError::Config(ErrorInfo::new(
                "no-output-format",
                "at least one output format is required",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = IngestConfig::from_yaml("{}").unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = IngestConfig::from_yaml(
            "decomposer: cholesky\ntolerance: 1.0e-6\nformats: [json]\noutput: out\n",
        )
        .unwrap();
        assert_eq!(config.decomposer, DecomposerKind::Cholesky);
        assert_eq!(config.tolerance, 1.0e-6);
        assert_eq!(config.formats, vec![OutputFormat::Json]);
        assert_eq!(config.output, PathBuf::from("out"));
        assert_eq!(config.raw_root, PathBuf::from("rawdata"));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = IngestConfig::from_yaml("tolerance: -1.0\n").unwrap_err();
        assert_eq!(err.info().code, "invalid-tolerance");
        let err = IngestConfig::from_yaml("formats: []\n").unwrap_err();
        assert_eq!(err.info().code, "no-output-format");
        let err = IngestConfig::from_yaml("decomposer: svd\n").unwrap_err();
        assert!(matches!(err, SyscanError::Config(_)));
    }

    #[test]
    fn overridden_tolerance_is_revalidated() {
        let config = IngestConfig {
            tolerance: f64::NAN,
            ..IngestConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().info().code, "invalid-tolerance");
        let config = IngestConfig {
            tolerance: 1.0e-6,
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
