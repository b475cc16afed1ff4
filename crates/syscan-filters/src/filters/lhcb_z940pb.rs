use syscan_core::errors::SyscanError;
use syscan_core::{CommonData, CorrelationGroup, Kinematics, SysType};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler, Scale,
    SymmetricTable,
};
use syscan_table::{build, Magnitude, PendingSource, RawPoint, SourceLayout};

use super::{MZ, PB_TO_FB};
use crate::filter::DatasetFilter;
use crate::raw::RawSource;

const NAME: &str = "LHCBZ940PB";
const NDATA: usize = 9;
const DATA_FILE: &str = "lhcb_940pb_zrap.data";
const CORR_FILE: &str = "lhcb_940pb_zrap.covmat";
const LUMI_PERCENT: f64 = 3.5;

/// Z to ee rapidity distribution at 7 TeV, 940 pb^-1.
///
/// Data rows are `etamin etamax xs stat uncorr corr fsr` in pb. The FSR
/// uncertainty is added in quadrature to the correlated systematic, which
/// scales the lower-triangular correlation table. Slot 0 is the 3.5%
/// luminosity, slot 1 the uncorrelated systematic.
#[derive(Debug, Clone, Copy, Default)]
pub struct LhcbZ940pb;

impl DatasetFilter for LhcbZ940pb {
    fn name(&self) -> &'static str {
        NAME
    }

    fn process(&self) -> &'static str {
        "EWK_RAP"
    }

    fn ndata(&self) -> usize {
        NDATA
    }

    fn nsys(&self) -> usize {
        NDATA + 2
    }

    fn raw_files(&self) -> &'static [&'static str] {
        &[DATA_FILE, CORR_FILE]
    }

    fn read(
        &self,
        source: &RawSource,
        decomposer: &dyn ArtificialSystematicsDecomposer,
        tolerance: f64,
    ) -> Result<CommonData, SyscanError> {
        let data = source.open(NAME, DATA_FILE)?;
        let mut points = Vec::with_capacity(NDATA);
        let mut direct = Vec::with_capacity(NDATA);
        let mut correlated = Vec::with_capacity(NDATA);
        for mut row in data.rows(NDATA)? {
            let etamin = row.next_f64("etamin")?;
            let etamax = row.next_f64("etamax")?;
            let central = row.next_f64("xs")? * PB_TO_FB;
            let stat = row.next_f64("stat")? * PB_TO_FB;
            let uncorr = row.next_f64("uncorr")? * PB_TO_FB;
            let corr = row.next_f64("corr")?;
            let fsr = row.next_f64("fsr")?;
            correlated.push(PB_TO_FB * corr.hypot(fsr));
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MZ * MZ, 7000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
            direct.push(vec![
                PendingSource::percent(
                    LUMI_PERCENT,
                    SysType::Multiplicative,
                    CorrelationGroup::Corr,
                ),
                PendingSource::absolute(uncorr, SysType::Additive, CorrelationGroup::Uncorr),
            ]);
        }

        let corr = source.open(NAME, CORR_FILE)?;
        let entries = corr
            .tokens()
            .take_f64(NDATA * (NDATA + 1) / 2, "correlation")?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_lower_triangle(NDATA, &entries)?)
            .with_scale(Scale::Correlation {
                sigma: correlated,
                unit: 1.0,
            })
            .assemble(NDATA)?;
        let sys = decompose_for_dataset(NAME, decomposer, &cov, tolerance)?;

        build(
            NAME,
            self.process(),
            points,
            direct,
            Some(&sys),
            SourceLayout {
                direct: 2,
                decomposed: sys.nsys(),
            },
        )
    }
}
