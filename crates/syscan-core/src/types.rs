use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ErrorInfo, SyscanError};

/// Relative tolerance used when checking `mult = add * 100 / data`.
pub const DUALITY_TOLERANCE: f64 = 1e-9;

fn table_error(code: &str, message: impl Into<String>) -> SyscanError {
    SyscanError::Table(ErrorInfo::new(code, message.into()))
}

/// Ordered kinematic coordinates of a data point.
///
/// The meaning of each slot is dataset specific; typical assignments are
/// rapidity, invariant mass squared and centre-of-mass energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Kinematics {
    /// First kinematic variable.
    pub k1: f64,
    /// Second kinematic variable.
    pub k2: f64,
    /// Third kinematic variable.
    pub k3: f64,
}

impl Kinematics {
    /// Creates a kinematic triple.
    pub const fn new(k1: f64, k2: f64, k3: f64) -> Self {
        Self { k1, k2, k3 }
    }
}

/// How a systematic source follows a rescaling of the central value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SysType {
    /// Absolute value is fixed; the percentage follows the central value.
    #[serde(rename = "ADD")]
    Additive,
    /// Percentage is fixed; the absolute value follows the central value.
    #[serde(rename = "MULT")]
    Multiplicative,
}

impl SysType {
    /// Label used in the commondata text layout.
    pub fn label(&self) -> &'static str {
        match self {
            SysType::Additive => "ADD",
            SysType::Multiplicative => "MULT",
        }
    }
}

/// Correlation group of a systematic source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CorrelationGroup {
    /// Fully correlated within the dataset.
    Corr,
    /// Uncorrelated between points.
    Uncorr,
    /// Shared label; 100% correlated with every point carrying it.
    Named(String),
}

impl CorrelationGroup {
    /// Parses a group label as written in systematic type files.
    pub fn parse(label: &str) -> Self {
        match label {
            "CORR" => CorrelationGroup::Corr,
            "UNCORR" => CorrelationGroup::Uncorr,
            other => CorrelationGroup::Named(other.to_string()),
        }
    }

    /// Returns the label as written in systematic type files.
    pub fn as_str(&self) -> &str {
        match self {
            CorrelationGroup::Corr => "CORR",
            CorrelationGroup::Uncorr => "UNCORR",
            CorrelationGroup::Named(name) => name,
        }
    }

    /// Whether the source fluctuates coherently across points.
    pub fn is_correlated(&self) -> bool {
        !matches!(self, CorrelationGroup::Uncorr)
    }
}

impl fmt::Display for CorrelationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CorrelationGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CorrelationGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CorrelationGroup::parse(&label))
    }
}

/// One systematic uncertainty of one data point.
///
/// Both the absolute value and the percentage of the central value are kept,
/// tied by `mult = add * 100 / data`. The two fields can only be produced
/// together, from one of them and the central value they refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystematicSource {
    add: f64,
    mult: f64,
    #[serde(rename = "type")]
    kind: SysType,
    group: CorrelationGroup,
}

fn check_central(central: f64) -> Result<(), SyscanError> {
    if !central.is_finite() {
        return Err(table_error(
            "non-finite-central-value",
            "central value must be finite",
        ));
    }
    if central == 0.0 {
        return Err(SyscanError::Table(
            ErrorInfo::new(
                "zero-central-value",
                "percentage of a zero central value is undefined",
            )
            .with_hint("quote the source in absolute units on a non-zero observable"),
        ));
    }
    Ok(())
}

impl SystematicSource {
    /// Builds a source from its absolute value.
    pub fn from_absolute(
        add: f64,
        central: f64,
        kind: SysType,
        group: CorrelationGroup,
    ) -> Result<Self, SyscanError> {
        check_central(central)?;
        if !add.is_finite() {
            return Err(table_error("non-finite-systematic", "systematic must be finite"));
        }
        Ok(Self {
            add,
            mult: add * 100.0 / central,
            kind,
            group,
        })
    }

    /// Builds a source from its percentage of the central value.
    pub fn from_percentage(
        mult: f64,
        central: f64,
        kind: SysType,
        group: CorrelationGroup,
    ) -> Result<Self, SyscanError> {
        check_central(central)?;
        if !mult.is_finite() {
            return Err(table_error("non-finite-systematic", "systematic must be finite"));
        }
        Ok(Self {
            add: mult * central * 1e-2,
            mult,
            kind,
            group,
        })
    }

    /// Absolute additive value.
    pub fn add(&self) -> f64 {
        self.add
    }

    /// Value in percent of the central value.
    pub fn mult(&self) -> f64 {
        self.mult
    }

    /// Type tag.
    pub fn kind(&self) -> SysType {
        self.kind
    }

    /// Correlation group.
    pub fn group(&self) -> &CorrelationGroup {
        &self.group
    }

    /// Re-derives the source for a new central value according to its type.
    pub fn rescaled(&self, new_central: f64) -> Result<Self, SyscanError> {
        match self.kind {
            SysType::Additive => {
                Self::from_absolute(self.add, new_central, self.kind, self.group.clone())
            }
            SysType::Multiplicative => {
                Self::from_percentage(self.mult, new_central, self.kind, self.group.clone())
            }
        }
    }

    /// Whether the stored pair honours the duality for `central`.
    pub fn is_consistent_with(&self, central: f64) -> bool {
        let expected = self.add * 100.0 / central;
        let scale = expected.abs().max(self.mult.abs()).max(1.0);
        (expected - self.mult).abs() <= DUALITY_TOLERANCE * scale
    }
}

/// Canonical record for one measured point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    kinematics: Kinematics,
    central: f64,
    stat: f64,
    systematics: Vec<SystematicSource>,
}

impl DataPoint {
    /// Assembles a finished point.
    pub fn new(
        kinematics: Kinematics,
        central: f64,
        stat: f64,
        systematics: Vec<SystematicSource>,
    ) -> Self {
        Self {
            kinematics,
            central,
            stat,
            systematics,
        }
    }

    /// Kinematic coordinates.
    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Central value.
    pub fn central(&self) -> f64 {
        self.central
    }

    /// Absolute statistical uncertainty.
    pub fn stat(&self) -> f64 {
        self.stat
    }

    /// Ordered systematic sources.
    pub fn systematics(&self) -> &[SystematicSource] {
        &self.systematics
    }

    /// Total uncertainty: statistical and all systematics in quadrature.
    pub fn total_uncertainty(&self) -> f64 {
        let sys: f64 = self.systematics.iter().map(|s| s.add * s.add).sum();
        (self.stat * self.stat + sys).sqrt()
    }

    /// Returns a copy with the central value multiplied by `factor`.
    ///
    /// The statistical uncertainty scales with the central value; additive
    /// sources keep their absolute value and multiplicative sources keep their
    /// percentage.
    pub fn rescale(&self, factor: f64) -> Result<Self, SyscanError> {
        let central = self.central * factor;
        let systematics = self
            .systematics
            .iter()
            .map(|source| source.rescaled(central))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            kinematics: self.kinematics,
            central,
            stat: self.stat * factor.abs(),
            systematics,
        })
    }
}

/// Canonical per-dataset table handed to the downstream fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonData {
    set_name: String,
    process: String,
    nsys: usize,
    points: Vec<DataPoint>,
}

impl CommonData {
    /// Validates and freezes a table.
    ///
    /// Every point must carry exactly `nsys` sources, and a given column must
    /// have the same type and group on every point.
    pub fn new(
        set_name: impl Into<String>,
        process: impl Into<String>,
        nsys: usize,
        points: Vec<DataPoint>,
    ) -> Result<Self, SyscanError> {
        let set_name = set_name.into();
        for (idx, point) in points.iter().enumerate() {
            if point.systematics.len() != nsys {
                return Err(SyscanError::Table(
                    ErrorInfo::new(
                        "width-mismatch",
                        format!(
                            "point carries {} systematics, expected {nsys}",
                            point.systematics.len()
                        ),
                    )
                    .with_context("dataset", set_name.clone())
                    .at_point(idx),
                ));
            }
        }
        if let Some(first) = points.first() {
            for (idx, point) in points.iter().enumerate().skip(1) {
                for (col, (a, b)) in first
                    .systematics
                    .iter()
                    .zip(point.systematics.iter())
                    .enumerate()
                {
                    if a.kind != b.kind || a.group != b.group {
                        return Err(SyscanError::Table(
                            ErrorInfo::new(
                                "column-mismatch",
                                "systematic column changes type or group between points",
                            )
                            .with_context("dataset", set_name.clone())
                            .at_point(idx)
                            .with_context("column", col.to_string()),
                        ));
                    }
                }
            }
        }
        Ok(Self {
            set_name,
            process: process.into(),
            nsys,
            points,
        })
    }

    /// Dataset name.
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Process label written into the commondata layout.
    pub fn process(&self) -> &str {
        &self.process
    }

    /// Number of points N.
    pub fn ndata(&self) -> usize {
        self.points.len()
    }

    /// Number of systematic sources M per point.
    pub fn nsys(&self) -> usize {
        self.nsys
    }

    /// All points in canonical order.
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Type and group of every column, taken from the first point.
    pub fn columns(&self) -> Vec<(SysType, CorrelationGroup)> {
        self.points
            .first()
            .map(|point| {
                point
                    .systematics
                    .iter()
                    .map(|s| (s.kind, s.group.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks the percentage/absolute duality of every source.
    pub fn check_duality(&self) -> Result<(), SyscanError> {
        for (idx, point) in self.points.iter().enumerate() {
            for (col, source) in point.systematics.iter().enumerate() {
                if !source.is_consistent_with(point.central) {
                    return Err(SyscanError::Table(
                        ErrorInfo::new(
                            "duality-violation",
                            format!(
                                "mult {} does not match add {} for central value {}",
                                source.mult, source.add, point.central
                            ),
                        )
                        .with_context("dataset", self.set_name.clone())
                        .at_point(idx)
                        .with_context("column", col.to_string()),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_source_keeps_percentage_on_rescale() {
        let source = SystematicSource::from_percentage(
            2.0,
            50.0,
            SysType::Multiplicative,
            CorrelationGroup::Corr,
        )
        .unwrap();
        assert_eq!(source.add(), 1.0);
        let rescaled = source.rescaled(100.0).unwrap();
        assert_eq!(rescaled.mult(), 2.0);
        assert_eq!(rescaled.add(), 2.0);
    }

    #[test]
    fn additive_source_keeps_absolute_value_on_rescale() {
        let source =
            SystematicSource::from_absolute(1.0, 50.0, SysType::Additive, CorrelationGroup::Uncorr)
                .unwrap();
        let rescaled = source.rescaled(100.0).unwrap();
        assert_eq!(rescaled.add(), 1.0);
        assert_eq!(rescaled.mult(), 1.0);
    }

    #[test]
    fn zero_central_value_is_rejected() {
        let err = SystematicSource::from_absolute(1.0, 0.0, SysType::Additive, CorrelationGroup::Corr)
            .unwrap_err();
        assert_eq!(err.info().code, "zero-central-value");
    }

    #[test]
    fn group_labels_round_trip() {
        for label in ["CORR", "UNCORR", "CMSLUMI11"] {
            assert_eq!(CorrelationGroup::parse(label).as_str(), label);
        }
        assert!(!CorrelationGroup::Uncorr.is_correlated());
        assert!(CorrelationGroup::Named("ATLASLUMI".into()).is_correlated());
    }
}
