use syscan_core::errors::{ErrorInfo, SyscanError};

use crate::filter::DatasetFilter;
use crate::filters::{
    CmsDy2d11, CmsJets11, CmsWeasy840pb, CmsWmasy47fb, LhcbW36pb, LhcbWmu1fb, LhcbZ940pb,
    LhcbZee2fb,
};

/// Every registered filter, ordered by name.
pub fn all_filters() -> Vec<Box<dyn DatasetFilter>> {
    vec![
        Box::new(CmsDy2d11),
        Box::new(CmsJets11),
        Box::new(CmsWeasy840pb),
        Box::new(CmsWmasy47fb),
        Box::new(LhcbW36pb),
        Box::new(LhcbWmu1fb),
        Box::new(LhcbZ940pb),
        Box::new(LhcbZee2fb),
    ]
}

/// Names of every registered filter.
pub fn filter_names() -> Vec<&'static str> {
    all_filters().iter().map(|f| f.name()).collect()
}

/// Looks a filter up by dataset name.
pub fn filter_by_name(name: &str) -> Result<Box<dyn DatasetFilter>, SyscanError> {
    all_filters()
        .into_iter()
        .find(|filter| filter.name() == name)
        .ok_or_else(|| {
            SyscanError::Config(
                ErrorInfo::new("unknown-dataset", format!("no filter named {name}"))
                    .with_hint(format!("known datasets: {}", filter_names().join(", "))),
            )
        })
}
