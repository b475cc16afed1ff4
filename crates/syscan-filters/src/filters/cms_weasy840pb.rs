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

const NAME: &str = "CMSWEASY840PB";
const NDATA: usize = 11;
const DATA_FILE: &str = "CMS-Weasy-840pb.data";
const COV_FILE: &str = "CMS-Weasy-840pb-covmat.data";
const PER_MILLE: f64 = 1e-3;

/// Electron charge asymmetry in 11 pseudorapidity bins, 840 pb^-1.
///
/// Data rows are `etamin etamax A stat` in per mille. The covariance file
/// is a full 11x11 matrix in per mille squared; every source is artificial.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsWeasy840pb;

impl DatasetFilter for CmsWeasy840pb {
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
        &[DATA_FILE, COV_FILE]
    }

    fn read(
        &self,
        source: &RawSource,
        decomposer: &dyn ArtificialSystematicsDecomposer,
        tolerance: f64,
    ) -> Result<CommonData, SyscanError> {
        let data = source.open(NAME, DATA_FILE)?;
        let mut points = Vec::with_capacity(NDATA);
        for mut row in data.rows(NDATA)? {
            let etamin = row.next_f64("etamin")?;
            let etamax = row.next_f64("etamax")?;
            let central = row.next_f64("asymmetry")? * PER_MILLE;
            let stat = row.next_f64("stat")? * PER_MILLE;
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MW * MW, 7000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
        }

        let covmat = source.open(NAME, COV_FILE)?;
        let entries = covmat.tokens().take_f64(NDATA * NDATA, "covariance")?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_full(NDATA, &entries)?)
            .with_scale(Scale::Covariance {
                unit: PER_MILLE * PER_MILLE,
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
