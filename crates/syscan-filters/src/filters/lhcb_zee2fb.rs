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

const NAME: &str = "LHCBZEE2FB";
const NDATA: usize = 17;
const DATA_FILE: &str = "lhcb_zrap.data";
const CORR_FILE: &str = "lhcb_zrap.corr";

/// Z to ee rapidity distribution at 8 TeV in 17 bins.
///
/// Data rows are `etamin etamax xs stat uncorr corr lumi`, all in pb.
/// Slot 0 is the uncorrelated systematic, slot 1 the luminosity. The
/// lower-triangular correlation table is scaled by the total uncertainty of
/// each bin and decomposed into the slots from 2 on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LhcbZee2fb;

impl DatasetFilter for LhcbZee2fb {
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
        let mut total = Vec::with_capacity(NDATA);
        for mut row in data.rows(NDATA)? {
            let etamin = row.next_f64("etamin")?;
            let etamax = row.next_f64("etamax")?;
            let central = row.next_f64("xs")? * PB_TO_FB;
            let stat = row.next_f64("stat")? * PB_TO_FB;
            let uncorr = row.next_f64("uncorr")? * PB_TO_FB;
            let corr = row.next_f64("corr")? * PB_TO_FB;
            let lumi = row.next_f64("lumi")? * PB_TO_FB;
            total.push((corr * corr + uncorr * uncorr + stat * stat).sqrt());
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MZ * MZ, 8000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
            direct.push(vec![
                PendingSource::absolute(uncorr, SysType::Additive, CorrelationGroup::Uncorr),
                PendingSource::absolute(lumi, SysType::Multiplicative, CorrelationGroup::Corr),
            ]);
        }

        let corr = source.open(NAME, CORR_FILE)?;
        let entries = corr
            .tokens()
            .take_f64(NDATA * (NDATA + 1) / 2, "correlation")?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_lower_triangle(NDATA, &entries)?)
            .with_scale(Scale::Correlation {
                sigma: total,
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
