use log::warn;
use syscan_core::errors::SyscanError;
use syscan_core::{CommonData, CorrelationGroup, Kinematics, SysType};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler, IndexMap, Scale,
    SymmetricTable,
};
use syscan_table::{build, Magnitude, PendingSource, RawPoint, SourceLayout};

use super::{MW, PB_TO_FB};
use crate::filter::DatasetFilter;
use crate::raw::RawSource;

const NAME: &str = "LHCBW36PB";
const NDATA_WP: usize = 5;
const NDATA_WM: usize = 5;
const NDATA: usize = NDATA_WP + NDATA_WM;
const TABLE_DIM: usize = 15;
const WP_FILE: &str = "lhcb_36pb_wplrap.data";
const WM_FILE: &str = "lhcb_36pb_wmlrap.data";
const Z_FILE: &str = "lhcb_36pb_zrap.data";
const CORR_FILE: &str = "lhcb_36pb_covmat.data";
const LUMI_PERCENT: f64 = 3.5;

/// Canonical point to correlation-table row, `(3 i) mod 14`.
///
/// The 15x15 table covers W+, W- and Z bins; only the ten W bins are kept.
pub fn correlation_index_map() -> IndexMap {
    IndexMap::strided(NDATA, 3, TABLE_DIM - 1)
}

/// W+ and W- lepton pseudorapidity distributions at 7 TeV, 36 pb^-1.
///
/// Data rows are `etamin etamax xs stat sys` in pb. Slot 0 holds the 3.5%
/// luminosity; the lower-triangular table, scaled by the total systematics,
/// is decomposed into the slots from 1 on. The Z file must be present but
/// its bins are not filtered.
#[derive(Debug, Clone, Copy, Default)]
pub struct LhcbW36pb;

impl LhcbW36pb {
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
            let central = row.next_f64("xs")? * PB_TO_FB;
            let stat = row.next_f64("stat")? * PB_TO_FB;
            totsys.push(row.next_f64("sys")? * PB_TO_FB);
            points.push(RawPoint {
                kinematics: Kinematics::new(0.5 * (etamin + etamax), MW * MW, 7000.0),
                central,
                stat: Magnitude::Absolute(stat),
            });
        }
        Ok(())
    }
}

impl DatasetFilter for LhcbW36pb {
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
        &[WP_FILE, WM_FILE, Z_FILE, CORR_FILE]
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
        source.open(NAME, Z_FILE)?;
        warn!("{NAME}: Z bins are not filtered");

        let corr = source.open(NAME, CORR_FILE)?;
        let rows = corr
            .rows(TABLE_DIM)?
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| row.take_f64(i + 1, "correlation"))
            .collect::<Result<Vec<_>, _>>()?;
        let cov = CovarianceAssembler::new(SymmetricTable::from_lower_rows(&rows)?)
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
    fn index_map_skips_the_z_rows() {
        let map = correlation_index_map();
        assert_eq!(map.targets(), &[0, 3, 6, 9, 12, 1, 4, 7, 10, 13]);
        assert!(map.is_injective());
        assert!(map.max_target() < Some(TABLE_DIM));
    }
}
