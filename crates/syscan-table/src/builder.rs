use log::info;
use syscan_core::errors::{ErrorInfo, SyscanError};
use syscan_core::{CommonData, CorrelationGroup, DataPoint, Kinematics, SysType, SystematicSource};
use syscan_cov::ArtificialSystematics;

/// Magnitude as quoted by the publication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Magnitude {
    /// Absolute value in the units of the central value.
    Absolute(f64),
    /// Percentage of the final central value.
    Percent(f64),
}

impl Magnitude {
    fn resolve(&self, central: f64) -> f64 {
        match *self {
            Magnitude::Absolute(value) => value,
            Magnitude::Percent(value) => value * central * 1e-2,
        }
    }
}

/// A direct systematic source awaiting the final central value.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSource {
    /// Quoted magnitude.
    pub magnitude: Magnitude,
    /// Type tag.
    pub kind: SysType,
    /// Correlation group.
    pub group: CorrelationGroup,
}

impl PendingSource {
    /// Source quoted in absolute units.
    pub fn absolute(value: f64, kind: SysType, group: CorrelationGroup) -> Self {
        Self {
            magnitude: Magnitude::Absolute(value),
            kind,
            group,
        }
    }

    /// Source quoted in percent.
    pub fn percent(value: f64, kind: SysType, group: CorrelationGroup) -> Self {
        Self {
            magnitude: Magnitude::Percent(value),
            kind,
            group,
        }
    }

    fn finalize(&self, central: f64) -> Result<SystematicSource, SyscanError> {
        match self.magnitude {
            Magnitude::Absolute(value) => {
                SystematicSource::from_absolute(value, central, self.kind, self.group.clone())
            }
            Magnitude::Percent(value) => {
                SystematicSource::from_percentage(value, central, self.kind, self.group.clone())
            }
        }
    }
}

/// Central-value shift produced by symmetrization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shift {
    /// Added to the central value.
    Absolute(f64),
    /// Fraction of the central value: `data *= 1 + shift`.
    Relative(f64),
}

/// Point as read from the publication, before shifts.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    /// Kinematic coordinates.
    pub kinematics: Kinematics,
    /// Central value before shifts.
    pub central: f64,
    /// Statistical uncertainty.
    pub stat: Magnitude,
}

/// Column layout shared by all points of a dataset.
///
/// Slots `0..direct` hold dataset-specific sources (luminosity, uncorrelated,
/// corrections); decomposed sources follow at offset `direct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLayout {
    /// Number of direct slots.
    pub direct: usize,
    /// Number of decomposed slots.
    pub decomposed: usize,
}

impl SourceLayout {
    /// Width M of every point.
    pub fn nsys(&self) -> usize {
        self.direct + self.decomposed
    }
}

#[derive(Debug, Clone)]
struct Draft {
    point: RawPoint,
    absolute_shift: f64,
    relative_shift: f64,
    slots: Vec<Option<PendingSource>>,
}

impl Draft {
    /// `(central + absolute) * (1 + relative)`.
    fn final_central(&self) -> f64 {
        (self.point.central + self.absolute_shift) * (1.0 + self.relative_shift)
    }
}

/// Collects direct sources, shifts and decomposed sources, then freezes them.
///
/// Shifts are applied before any source is finalized, so every percentage
/// refers to the final central value.
#[derive(Debug, Clone)]
pub struct SystematicTableBuilder {
    set_name: String,
    process: String,
    layout: SourceLayout,
    drafts: Vec<Draft>,
}

impl SystematicTableBuilder {
    /// Starts an empty table.
    pub fn new(set_name: impl Into<String>, process: impl Into<String>, layout: SourceLayout) -> Self {
        Self {
            set_name: set_name.into(),
            process: process.into(),
            layout,
            drafts: Vec::new(),
        }
    }

    fn error(&self, code: &str, message: impl Into<String>) -> ErrorInfo {
        ErrorInfo::new(code, message.into()).with_context("dataset", self.set_name.clone())
    }

    fn draft_mut(&mut self, point: usize) -> Result<&mut Draft, SyscanError> {
        let len = self.drafts.len();
        let info = self
            .error("unknown-point", format!("point {point} of {len} does not exist"))
            .at_point(point);
        self.drafts.get_mut(point).ok_or(SyscanError::Table(info))
    }

    /// Number of points pushed so far.
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Whether no point was pushed.
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Layout of the table.
    pub fn layout(&self) -> SourceLayout {
        self.layout
    }

    /// Adds a point and returns its index.
    pub fn push_point(&mut self, point: RawPoint) -> usize {
        self.drafts.push(Draft {
            point,
            absolute_shift: 0.0,
            relative_shift: 0.0,
            slots: vec![None; self.layout.nsys()],
        });
        self.drafts.len() - 1
    }

    /// Sets direct source `slot` of `point`.
    pub fn set_direct(
        &mut self,
        point: usize,
        slot: usize,
        source: PendingSource,
    ) -> Result<(), SyscanError> {
        if slot >= self.layout.direct {
            return Err(SyscanError::Table(
                self.error(
                    "slot-out-of-layout",
                    format!("slot {slot} is outside the {} direct slots", self.layout.direct),
                )
                .at_point(point),
            ));
        }
        let taken = self
            .error("slot-already-set", format!("slot {slot} was already set"))
            .at_point(point);
        let draft = self.draft_mut(point)?;
        if draft.slots[slot].is_some() {
            return Err(SyscanError::Table(taken));
        }
        draft.slots[slot] = Some(source);
        Ok(())
    }

    /// Records a central-value shift of `point`.
    pub fn add_shift(&mut self, point: usize, shift: Shift) -> Result<(), SyscanError> {
        let draft = self.draft_mut(point)?;
        match shift {
            Shift::Absolute(value) => draft.absolute_shift += value,
            Shift::Relative(value) => draft.relative_shift += value,
        }
        Ok(())
    }

    /// Places artificial sources at the decomposed offset as additive `CORR`.
    pub fn place_decomposed(&mut self, sys: &ArtificialSystematics) -> Result<(), SyscanError> {
        if sys.ndata() != self.drafts.len() || sys.nsys() != self.layout.decomposed {
            return Err(SyscanError::Table(
                self.error(
                    "decomposed-shape",
                    format!(
                        "artificial systematics are {}x{}, layout expects {}x{}",
                        sys.ndata(),
                        sys.nsys(),
                        self.drafts.len(),
                        self.layout.decomposed
                    ),
                ),
            ));
        }
        let offset = self.layout.direct;
        for (i, draft) in self.drafts.iter_mut().enumerate() {
            for (l, value) in sys.row(i).into_iter().enumerate() {
                draft.slots[offset + l] = Some(PendingSource::absolute(
                    value,
                    SysType::Additive,
                    CorrelationGroup::Corr,
                ));
            }
        }
        Ok(())
    }

    /// Applies shifts, finalizes every source and validates the table.
    pub fn build(self) -> Result<CommonData, SyscanError> {
        if self.drafts.is_empty() {
            return Err(SyscanError::Table(
                self.error("empty-dataset", "no points were ingested"),
            ));
        }
        let mut points = Vec::with_capacity(self.drafts.len());
        for (idx, draft) in self.drafts.iter().enumerate() {
            let central = draft.final_central();
            let tag = |err: SyscanError| match err {
                SyscanError::Table(info) => SyscanError::Table(
                    info.with_context("dataset", self.set_name.clone())
                        .at_point(idx),
                ),
                other => other,
            };
            let mut systematics = Vec::with_capacity(draft.slots.len());
            for (slot, pending) in draft.slots.iter().enumerate() {
                let pending = pending.as_ref().ok_or_else(|| {
                    SyscanError::Table(
                        self.error("missing-source", format!("slot {slot} was never filled"))
                            .at_point(idx),
                    )
                })?;
                systematics.push(pending.finalize(central).map_err(tag)?);
            }
            let stat = draft.point.stat.resolve(central);
            points.push(DataPoint::new(
                draft.point.kinematics,
                central,
                stat,
                systematics,
            ));
        }
        let table = CommonData::new(
            self.set_name.clone(),
            self.process.clone(),
            self.layout.nsys(),
            points,
        )?;
        info!(
            "{}: built {} points with {} systematics",
            table.set_name(),
            table.ndata(),
            table.nsys()
        );
        Ok(table)
    }
}

/// Builds a table in one call from per-point direct sources and optional
/// decomposed sources.
pub fn build(
    set_name: &str,
    process: &str,
    points: Vec<RawPoint>,
    direct: Vec<Vec<PendingSource>>,
    decomposed: Option<&ArtificialSystematics>,
    layout: SourceLayout,
) -> Result<CommonData, SyscanError> {
    if direct.len() != points.len() {
        return Err(SyscanError::Table(
            ErrorInfo::new(
                "direct-shape",
                format!("{} direct rows for {} points", direct.len(), points.len()),
            )
            .with_context("dataset", set_name),
        ));
    }
    let mut builder = SystematicTableBuilder::new(set_name, process, layout);
    for (point, sources) in points.into_iter().zip(direct) {
        let idx = builder.push_point(point);
        for (slot, source) in sources.into_iter().enumerate() {
            builder.set_direct(idx, slot, source)?;
        }
    }
    if let Some(sys) = decomposed {
        builder.place_decomposed(sys)?;
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syscan_cov::{ArtificialSystematicsDecomposer, CovarianceMatrix, EigenDecomposer};

    fn shifts() -> ArtificialSystematics {
        let cov = CovarianceMatrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        EigenDecomposer::default().decompose(&cov).unwrap()
    }

    fn raw(central: f64) -> RawPoint {
        RawPoint {
            kinematics: Kinematics::new(0.5, 6464.0, 7000.0),
            central,
            stat: Magnitude::Percent(1.0),
        }
    }

    fn lumi() -> PendingSource {
        PendingSource::percent(2.0, SysType::Multiplicative, CorrelationGroup::Corr)
    }

    #[test]
    fn shifts_are_applied_before_percentages() {
        let mut builder = SystematicTableBuilder::new(
            "TOY",
            "JET",
            SourceLayout {
                direct: 1,
                decomposed: 0,
            },
        );
        let idx = builder.push_point(raw(100.0));
        builder.set_direct(idx, 0, lumi()).unwrap();
        builder.add_shift(idx, Shift::Relative(0.05)).unwrap();
        builder.add_shift(idx, Shift::Relative(0.05)).unwrap();
        let table = builder.build().unwrap();
        let point = &table.points()[0];
        assert!((point.central() - 110.0).abs() < 1e-12);
        assert!((point.stat() - 1.1).abs() < 1e-12);
        assert!((point.systematics()[0].add() - 2.2).abs() < 1e-12);
        table.check_duality().unwrap();
    }

    #[test]
    fn decomposed_sources_follow_direct_slots() {
        let table = build(
            "TOY",
            "EWK_RAP",
            vec![raw(10.0), raw(20.0)],
            vec![vec![lumi()], vec![lumi()]],
            Some(&shifts()),
            SourceLayout {
                direct: 1,
                decomposed: 2,
            },
        )
        .unwrap();
        assert_eq!(table.nsys(), 3);
        let columns = table.columns();
        assert_eq!(columns[0].0, SysType::Multiplicative);
        assert_eq!(columns[1], (SysType::Additive, CorrelationGroup::Corr));
        table.check_duality().unwrap();
    }

    #[test]
    fn missing_slot_is_fatal() {
        let mut builder = SystematicTableBuilder::new(
            "TOY",
            "JET",
            SourceLayout {
                direct: 2,
                decomposed: 0,
            },
        );
        let idx = builder.push_point(raw(1.0));
        builder.set_direct(idx, 0, lumi()).unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(err.info().code, "missing-source");
        assert_eq!(err.info().context.get("point").map(String::as_str), Some("0"));
    }

    #[test]
    fn decomposed_shape_must_match_layout() {
        let mut builder = SystematicTableBuilder::new(
            "TOY",
            "JET",
            SourceLayout {
                direct: 0,
                decomposed: 3,
            },
        );
        builder.push_point(raw(1.0));
        builder.push_point(raw(2.0));
        let err = builder.place_decomposed(&shifts()).unwrap_err();
        assert_eq!(err.info().code, "decomposed-shape");
    }

    #[test]
    fn direct_slot_cannot_be_set_twice() {
        let mut builder = SystematicTableBuilder::new(
            "TOY",
            "JET",
            SourceLayout {
                direct: 1,
                decomposed: 0,
            },
        );
        let idx = builder.push_point(raw(1.0));
        builder.set_direct(idx, 0, lumi()).unwrap();
        let err = builder.set_direct(idx, 0, lumi()).unwrap_err();
        assert_eq!(err.info().code, "slot-already-set");
    }
}
