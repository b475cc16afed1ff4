#![deny(missing_docs)]
#![doc = "Covariance assembly from partial publication tables and its decomposition into artificial systematic sources."]

/// Covariance construction from symmetric tables, scales and extra terms.
pub mod assemble;
/// Correlation and normalised matrix utilities.
pub mod correlation;
/// Decomposition strategies producing artificial systematics.
pub mod decompose;
/// Canonical to table index maps.
pub mod index_map;
/// Owned symmetric matrix containers.
pub mod matrix;

pub use assemble::{CovarianceAssembler, ExtraTerm, Scale};
pub use correlation::{correlation_from_covariance, normalised_covariance, sqrt_diagonal};
pub use decompose::{
    check_reconstruction, decompose_for_dataset, reconstruction_residual, ArtificialSystematics,
    ArtificialSystematicsDecomposer, CholeskyDecomposer, DecomposerKind, DecompositionFailure,
    EigenDecomposer, DEFAULT_RECONSTRUCTION_TOLERANCE,
};
pub use index_map::IndexMap;
pub use matrix::{CovarianceMatrix, SymmetricTable};
