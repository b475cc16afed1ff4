use syscan_core::errors::SyscanError;
use syscan_core::{CommonData, Kinematics};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler, Scale,
    SymmetricTable,
};
use syscan_table::{build, Magnitude, RawPoint, SourceLayout};

use super::MW;
use crate::filter::DatasetFilter;
use crate::raw::RawSource;

const NAME: &str = "CMSWMASY47FB";
const NDATA: usize = 11;
const DATA_FILE: &str = "CMS-Wmasy-47fb.data";
const CORR_FILE: &str = "CMS-Wmasy-47fb-covmat.data";

/// Muon charge asymmetry in 11 pseudorapidity bins.
///
/// Data rows are `etamin etamax A stat systot`, all in percent. The
/// correlation file is a full 11x11 matrix in percent, scaled by the total
/// systematic of each bin; every source is artificial.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsWmasy47fb;

impl DatasetFilter for CmsWmasy47fb {
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
        NDATA
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
        let mut systot = Vec::with_capacity(NDATA);
        for mut row in data.rows(NDATA)? {
            let etamin = row.next_f64("etamin")?;
            let etamax = row.next_f64("etamax")?;
            let central = row.next_f64("asymmetry")? * 1e-2;
            let stat = row.next_f64("stat")? * 1e-2;
            systot.push(row.next_f64("systot")? * 1e-2);
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MW * MW, 7000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
        }

        let corr = source.open(NAME, CORR_FILE)?;
        let entries = corr.tokens().take_f64(NDATA * NDATA, "correlation")?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_full(NDATA, &entries)?)
            .with_scale(Scale::Correlation {
                sigma: systot,
                unit: 1e-2,
            })
            .assemble(NDATA)?;
        let sys = decompose_for_dataset(NAME, decomposer, &cov, tolerance)?;

        build(
            NAME,
            self.process(),
            points,
            vec![Vec::new(); NDATA],
            Some(&sys),
            SourceLayout {
                direct: 0,
                decomposed: sys.nsys(),
            },
        )
    }
}
