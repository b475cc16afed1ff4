use syscan_core::errors::SyscanError;
use syscan_core::{CommonData, Kinematics};
use syscan_cov::{
    decompose_for_dataset, ArtificialSystematicsDecomposer, CovarianceAssembler, ExtraTerm,
    SymmetricTable,
};
use syscan_table::{build, Magnitude, RawPoint, SourceLayout};

use crate::filter::DatasetFilter;
use crate::raw::RawSource;

const NAME: &str = "CMSDY2D11";
const NDATA: usize = 132;
const DATA_FILE: &str = "CMS-DY2D11-ABS.data";
const COV_FILE: &str = "CMSDY2D11-covmat-abs.data";
const LUMI: f64 = 0.022;

/// Drell-Yan cross section double differential in rapidity and mass.
///
/// Data rows are `bin y mll xs`. The covariance is a listing of
/// `i j cov_ij` lines in row-major order and already includes the
/// statistical uncertainty; the 2.2% luminosity is added on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmsDy2d11;

impl DatasetFilter for CmsDy2d11 {
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
            row.skip(1, "bin")?;
            let rapidity = row.next_f64("y")?;
            let mass = row.next_f64("mll")?;
            points.push(RawPoint {
                kinematics: Kinematics::new(rapidity, mass * mass, 7000.0),
                central: row.next_f64("xs")?,
                stat: Magnitude::Absolute(0.0),
            });
        }

        let cov_table = source.open(NAME, COV_FILE)?;
        let mut tokens = cov_table.tokens();
        let mut entries = Vec::with_capacity(NDATA * NDATA);
        for _ in 0..NDATA * NDATA {
            tokens.skip(2, "index")?;
            entries.push(tokens.next_f64("covariance")?);
        }
        let central = points.iter().map(|p| p.central).collect();
        let cov = CovarianceAssembler::new(SymmetricTable::from_full(NDATA, &entries)?)
            .with_extra(ExtraTerm::Luminosity {
                fraction: LUMI,
                central,
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
