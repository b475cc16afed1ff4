//! One module per publication. Each filter reads its raw tables, assembles
//! the covariance the publication implies and hands everything to the table
//! builder.

/// CMS inclusive jets, 7 TeV, 5 fb^-1.
pub mod cms_jets11;
/// CMS double differential Drell-Yan, 7 TeV.
pub mod cms_dy2d11;
/// CMS W electron charge asymmetry, 840 pb^-1.
pub mod cms_weasy840pb;
/// CMS W muon charge asymmetry, 4.7 fb^-1.
pub mod cms_wmasy47fb;
/// LHCb W lepton rapidity distributions, 36 pb^-1.
pub mod lhcb_w36pb;
/// LHCb W muon rapidity distributions, 1 fb^-1.
pub mod lhcb_wmu1fb;
/// LHCb Z to ee rapidity distribution, 940 pb^-1.
pub mod lhcb_z940pb;
/// LHCb Z to ee rapidity distribution, 2 fb^-1.
pub mod lhcb_zee2fb;

pub use cms_dy2d11::CmsDy2d11;
pub use cms_jets11::CmsJets11;
pub use cms_weasy840pb::CmsWeasy840pb;
pub use cms_wmasy47fb::CmsWmasy47fb;
pub use lhcb_w36pb::LhcbW36pb;
pub use lhcb_wmu1fb::LhcbWmu1fb;
pub use lhcb_z940pb::LhcbZ940pb;
pub use lhcb_zee2fb::LhcbZee2fb;

/// W boson mass in GeV.
pub const MW: f64 = 80.398;
/// Z boson mass in GeV.
pub const MZ: f64 = 91.1876;
/// Picobarn to femtobarn.
pub const PB_TO_FB: f64 = 1000.0;
