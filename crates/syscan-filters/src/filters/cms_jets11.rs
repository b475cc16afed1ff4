use std::f64::consts::SQRT_2;

use syscan_core::errors::{ErrorInfo, SyscanError};
use syscan_core::{CommonData, CorrelationGroup, Kinematics, SysType};
use syscan_cov::ArtificialSystematicsDecomposer;
use syscan_table::{
    symmetrize, Magnitude, PendingSource, RawPoint, Shift, ShiftAccumulator, SourceLayout,
    SystematicTableBuilder,
};

use crate::checks::{expect_close, in_range};
use crate::filter::DatasetFilter;
use crate::raw::{RawSource, TokenStream};

const NAME: &str = "CMSJETS11";
const NDATA: usize = 133;
const NSYS: usize = 24;
const DATA_FILE: &str = "InclusiveJets_CMS2011_7TeV_HEPDATA.txt";

/// Asymmetric JEC-like sources listed per point.
const PUBLISHED_PAIRS: usize = 17;
/// Extra slots receiving the single-pion source per rapidity bin.
const SPLIT_SLOTS: usize = 4;
/// Position of the single-pion source among the published pairs.
const SINGLE_PION: usize = 3;
const LUMI_PERCENT: f64 = 2.2;
const FIRST_PT: f64 = 114.0;

/// First point of every rapidity bin and the bin's lower edge.
const RAPIDITY_BINS: [(usize, f64); 5] = [(0, 0.0), (33, 0.5), (63, 1.0), (90, 1.5), (114, 2.0)];
const RAPIDITY_WIDTH: f64 = 0.5;

fn rapidity_bin(idx: usize) -> (usize, f64) {
    RAPIDITY_BINS
        .iter()
        .rev()
        .find(|(start, _)| idx >= *start)
        .copied()
        .unwrap_or(RAPIDITY_BINS[0])
}

/// Correlated sources of one point as `(down, up)` fractions, after the
/// single-pion source has been spread over its rapidity slot.
fn correlated_pairs(pairs: &[(f64, f64)], etamin: f64) -> Vec<(f64, f64)> {
    let mut out = pairs.to_vec();
    out.extend(std::iter::repeat((0.0, 0.0)).take(SPLIT_SLOTS));
    if etamin < 1.5 {
        let (down, up) = out[SINGLE_PION];
        let split = (down / SQRT_2, up / SQRT_2);
        out[SINGLE_PION] = (0.0, 0.0);
        out[PUBLISHED_PAIRS] = split;
        let slot = if etamin < 0.5 {
            1
        } else if etamin < 1.0 {
            2
        } else {
            3
        };
        out[PUBLISHED_PAIRS + slot] = split;
    }
    out
}

/// CMS inclusive jet cross sections in five rapidity bins.
///
/// Each point reads `ptmin ptmax xs stat- stat+ np np_lo np_hi lumi- lumi+`,
/// 17 asymmetric `(-, +)` source pairs and the uncorrelated `(-, +)` pair,
/// all relative. Slot 0 is the luminosity, slot 1 the uncorrelated
/// systematic, slot 2 the non-perturbative correction and slots 3 to 23 the
/// symmetrized correlated sources. The data are divided by the corrected
/// non-perturbative factor and shifted by the sum of the correlated shifts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsJets11;

struct JetRow {
    ptmin: f64,
    ptmax: f64,
    xs: f64,
    stat: f64,
    np: f64,
    np_lo: f64,
    np_hi: f64,
    lumi: f64,
    pairs: Vec<(f64, f64)>,
    uncorr: f64,
}

impl JetRow {
    fn read(tokens: &mut TokenStream<'_>) -> Result<Self, SyscanError> {
        let ptmin = tokens.next_f64("ptmin")?;
        let ptmax = tokens.next_f64("ptmax")?;
        let xs = tokens.next_f64("xs")?;
        tokens.skip(1, "stat-")?;
        let stat = tokens.next_f64("stat+")?;
        let np = tokens.next_f64("npcor")?;
        let np_lo = tokens.next_f64("npcor_lo")?;
        let np_hi = tokens.next_f64("npcor_hi")?;
        tokens.skip(1, "lumi-")?;
        let lumi = tokens.next_f64("lumi+")?;
        let mut pairs = Vec::with_capacity(PUBLISHED_PAIRS);
        for _ in 0..PUBLISHED_PAIRS {
            let down = tokens.next_f64("source-")?;
            let up = tokens.next_f64("source+")?;
            pairs.push((down, up));
        }
        tokens.skip(1, "uncorr-")?;
        let uncorr = tokens.next_f64("uncorr+")?;
        Ok(Self {
            ptmin,
            ptmax,
            xs,
            stat,
            np,
            np_lo,
            np_hi,
            lumi,
            pairs,
            uncorr,
        })
    }
}

impl DatasetFilter for CmsJets11 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn process(&self) -> &'static str {
        "JET"
    }

    fn ndata(&self) -> usize {
        NDATA
    }

    fn nsys(&self) -> usize {
        NSYS
    }

    fn raw_files(&self) -> &'static [&'static str] {
        &[DATA_FILE]
    }

    fn uses_decomposer(&self) -> bool {
        false
    }

    fn read(
        &self,
        source: &RawSource,
        _decomposer: &dyn ArtificialSystematicsDecomposer,
        _tolerance: f64,
    ) -> Result<CommonData, SyscanError> {
        let table = source.open(NAME, DATA_FILE)?;
        let mut tokens = table.tokens();
        let mut builder = SystematicTableBuilder::new(
            NAME,
            self.process(),
            SourceLayout {
                direct: NSYS,
                decomposed: 0,
            },
        );

        for idx in 0..NDATA {
            let row = JetRow::read(&mut tokens)?;
            let (start, etamin) = rapidity_bin(idx);
            if idx == start && (row.ptmin - FIRST_PT).abs() > 1e-4 {
                return Err(SyscanError::Format(
                    ErrorInfo::new(
                        "bin-start",
                        format!("rapidity bin starts at pT {}, expected {FIRST_PT}", row.ptmin),
                    )
                    .with_context("dataset", NAME)
                    .at_point(idx),
                ));
            }
            let rapidity = etamin + 0.5 * RAPIDITY_WIDTH;
            let pt = 0.5 * (row.ptmin + row.ptmax);
            in_range(NAME, "rapidity", rapidity, 0.2, 2.3)?;
            in_range(NAME, "pt2", pt * pt, 100.0 * 100.0, 2000.0 * 2000.0)?;
            expect_close(NAME, "luminosity", row.lumi * 1e2, LUMI_PERCENT, 1e-4)?;

            let mut shift = ShiftAccumulator::default();
            let correlated: Vec<f64> = correlated_pairs(&row.pairs, etamin)
                .into_iter()
                .map(|(down, up)| shift.symmetrize(up, down))
                .collect();

            let np = symmetrize(row.np_hi - row.np, row.np_lo - row.np);
            let rescale = row.np + np.shift;

            let point = builder.push_point(RawPoint {
                kinematics: Kinematics::new(rapidity, pt * pt, 7000.0),
                central: row.xs / rescale,
                stat: Magnitude::Percent(row.stat * 1e2),
            });
            let percent = |value: f64, kind: SysType, group: CorrelationGroup| {
                PendingSource::percent(value * 1e2, kind, group)
            };
            builder.set_direct(
                point,
                0,
                percent(row.lumi, SysType::Multiplicative, CorrelationGroup::Corr),
            )?;
            builder.set_direct(
                point,
                1,
                percent(row.uncorr, SysType::Additive, CorrelationGroup::Uncorr),
            )?;
            builder.set_direct(
                point,
                2,
                percent(np.magnitude / rescale, SysType::Additive, CorrelationGroup::Corr),
            )?;
            for (l, magnitude) in correlated.into_iter().enumerate() {
                builder.set_direct(
                    point,
                    3 + l,
                    percent(magnitude, SysType::Additive, CorrelationGroup::Corr),
                )?;
            }
            builder.add_shift(point, Shift::Relative(shift.total()))?;
        }
        builder.build()
    }
}
