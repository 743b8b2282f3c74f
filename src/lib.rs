//! Interactive climate-change charts assembled into a small site.
//!
//! Datasets, selections and the render contract live in [`climviz_core`]; the
//! chart variants and the bundled data in [`climviz_charts`]. This crate reads a
//! [`SiteConfig`](site::SiteConfig) and drives its pages through a
//! [`Dashboard`](dashboard::Dashboard).
//!
//! ```rust
//! use climviz::dashboard::Dashboard;
//! use climviz::site::SiteConfig;
//!
//! let mut dashboard = Dashboard::new(SiteConfig::bundled().unwrap());
//! dashboard.open("problem").unwrap();
//! assert_eq!(dashboard.banner().unwrap(), "Problem");
//! ```

pub mod dashboard;
pub mod site;

pub mod errors;

pub use climviz_charts;
pub use climviz_core;
