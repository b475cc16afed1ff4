#![deny(missing_docs)]
#![doc = "Dataset filters: raw publication tables in, canonical systematic tables out."]

/// Validation helpers shared by the filters.
pub mod checks;
/// The `DatasetFilter` trait.
pub mod filter;
/// Concrete filters for published datasets.
pub mod filters;
/// Raw table access.
pub mod raw;
/// Lookup of filters by dataset name.
pub mod registry;
/// Synthetic datasets for end-to-end checks.
pub mod synthetic;

pub use filter::DatasetFilter;
pub use raw::{RawSource, RawTable, TokenStream};
pub use registry::{all_filters, filter_by_name, filter_names};
pub use synthetic::{random_dataset, two_point_covariance, two_point_scenario};
