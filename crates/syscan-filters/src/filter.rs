use syscan_core::errors::SyscanError;
use syscan_core::CommonData;
use syscan_cov::ArtificialSystematicsDecomposer;

use crate::raw::RawSource;

/// Reads the raw tables of one publication and produces its canonical table.
///
/// Implementations are stateless; every call to [`DatasetFilter::read`]
/// ingests the dataset from scratch and either returns a complete table or
/// the first error.
pub trait DatasetFilter {
    /// Dataset name, also the raw input sub-directory.
    fn name(&self) -> &'static str;

    /// Process label written into the commondata layout.
    fn process(&self) -> &'static str;

    /// Number of points N.
    fn ndata(&self) -> usize;

    /// Number of systematic sources M.
    fn nsys(&self) -> usize;

    /// Raw files read under `<root>/<name>/`.
    fn raw_files(&self) -> &'static [&'static str];

    /// Whether the filter needs a decomposer.
    fn uses_decomposer(&self) -> bool {
        true
    }

    /// Ingests the dataset. `tolerance` bounds the reconstruction residual of
    /// any decomposed covariance.
    fn read(
        &self,
        source: &RawSource,
        decomposer: &dyn ArtificialSystematicsDecomposer,
        tolerance: f64,
    ) -> Result<CommonData, SyscanError>;
}
