use log::debug;
use syscan_core::errors::SyscanError;
use syscan_core::{CommonData, CorrelationGroup, Kinematics, SysType};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler, IndexMap, Scale,
    SymmetricTable,
};
use syscan_table::{build, Magnitude, PendingSource, RawPoint, SourceLayout};

use super::{MW, PB_TO_FB};
use crate::checks::bin_width;
use crate::filter::DatasetFilter;
use crate::raw::RawSource;

const NAME: &str = "LHCBWMU1FB";
const NDATA_WP: usize = 8;
const NDATA_WM: usize = 8;
const NDATA: usize = NDATA_WP + NDATA_WM;
const WP_FILE: &str = "lhcb_wplrap.data";
const WM_FILE: &str = "lhcb_wmlrap.data";
const CORR_FILE: &str = "lhcb_covmat.data";
const LUMI_PERCENT: f64 = 1.71;

/// Canonical point to correlation-table row.
///
/// The published table interleaves W+ and W- bins over its first 15 rows;
/// the last W- bin sits on row 15.
pub fn correlation_index_map() -> IndexMap {
    IndexMap::strided(NDATA - 1, 2, 15).chain(&[15])
}

/// W+ and W- muon pseudorapidity distributions, 8 bins each.
///
/// Data rows are `etamin etamax xs stat sys` in pb integrated over the bin;
/// they are converted to fb per unit rapidity. Slot 0 holds the 1.71%
/// luminosity; the lower-triangular 16x16 correlation table, scaled by the
/// total systematics, is decomposed into the remaining slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct LhcbWmu1fb;

impl LhcbWmu1fb {
    fn read_charge(
        source: &RawSource,
        file: &str,
        count: usize,
        points: &mut Vec<RawPoint>,
        totsys: &mut Vec<f64>,
    ) -> Result<(), SyscanError> {
        let table = source.open(NAME, file)?;
        for mut row in table.rows(count)? {
            let etamin = row.next_f64("etamin")?;
            let etamax = row.next_f64("etamax")?;
            let scale = PB_TO_FB / bin_width(NAME, etamin, etamax)?;
            let central = row.next_f64("xs")? * scale;
            let stat = row.next_f64("stat")? * scale;
            totsys.push(row.next_f64("sys")? * scale);
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MW * MW, 7000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
        }
        Ok(())
    }
}

impl DatasetFilter for LhcbWmu1fb {
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
        NDATA + 1
    }

    fn raw_files(&self) -> &'static [&'static str] {
        &[WP_FILE, WM_FILE, CORR_FILE]
    }

    fn read(
        &self,
        source: &RawSource,
        decomposer: &dyn ArtificialSystematicsDecomposer,
        tolerance: f64,
    ) -> Result<CommonData, SyscanError> {
        let mut points = Vec::with_capacity(NDATA);
        let mut totsys = Vec::with_capacity(NDATA);
        Self::read_charge(source, WP_FILE, NDATA_WP, &mut points, &mut totsys)?;
        Self::read_charge(source, WM_FILE, NDATA_WM, &mut points, &mut totsys)?;
        debug!("{NAME}: converted pb to fb per unit rapidity");

        let corr = source.open(NAME, CORR_FILE)?;
        let entries = corr
            .tokens()
            .take_f64(NDATA * (NDATA + 1) / 2, "correlation")?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_lower_triangle(NDATA, &entries)?)
            .with_index_map(correlation_index_map())
            .with_scale(Scale::Correlation {
                sigma: totsys,
                unit: 1.0,
            })
            .assemble(NDATA)?;
        let sys = decompose_for_dataset(NAME, decomposer, &cov, tolerance)?;

        let lumi = PendingSource::percent(LUMI_PERCENT, SysType::Multiplicative, CorrelationGroup::Corr);
        build(
            NAME,
            self.process(),
            points,
            vec![vec![lumi]; NDATA],
            Some(&sys),
            SourceLayout {
                direct: 1,
                decomposed: sys.nsys(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_map_interleaves_charges() {
        let map = correlation_index_map();
        assert_eq!(map.len(), NDATA);
        assert!(map.is_injective());
        assert_eq!(map.target(0), Some(0));
        assert_eq!(map.target(7), Some(14));
        assert_eq!(map.target(8), Some(1));
        assert_eq!(map.target(14), Some(13));
        assert_eq!(map.target(15), Some(15));
    }
}
